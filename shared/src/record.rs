//! Canonical activity record model
//!
//! Every measurement the remote store returns — a weigh-in, a glass of
//! water, an exercise session — normalizes to one [`ActivityRecord`].
//! The tolerant wire decoding that produces these lives in [`crate::decode`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata key carrying the time-of-day label on water entries
pub const METADATA_TIME_KEY: &str = "time";

/// Metadata key carrying the exercise type on exercise entries
pub const METADATA_EXERCISE_TYPE_KEY: &str = "exercise_type";

/// Kind of tracked activity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Weight,
    WaterIntake,
    Exercise,
}

impl ActivityKind {
    /// Wire name used in endpoint paths and the `activity_type` field
    pub fn wire_name(&self) -> &'static str {
        match self {
            ActivityKind::Weight => "weight",
            ActivityKind::WaterIntake => "water_intake",
            ActivityKind::Exercise => "exercise",
        }
    }

    /// Default measurement unit for this kind
    pub fn default_unit(&self) -> &'static str {
        match self {
            ActivityKind::Weight => "kg",
            ActivityKind::WaterIntake => "ml",
            ActivityKind::Exercise => "minutes",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weight" => Ok(ActivityKind::Weight),
            "water_intake" => Ok(ActivityKind::WaterIntake),
            "exercise" => Ok(ActivityKind::Exercise),
            _ => Err(format!("Unknown activity kind: {}", s)),
        }
    }
}

/// One normalized activity measurement
///
/// The `id` is assigned by the remote store at creation and is the handle
/// for update/delete mutations. `metadata` is a free-form key→string map
/// (embedded as serialized JSON text on the wire).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    pub id: i64,
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub unit: String,
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ActivityRecord {
    /// Time-of-day label attached to water entries, when present
    pub fn time_of_day(&self) -> Option<&str> {
        self.metadata.get(METADATA_TIME_KEY).map(String::as_str)
    }

    /// Exercise-type label attached to exercise entries, when present
    pub fn exercise_type(&self) -> Option<&str> {
        self.metadata
            .get(METADATA_EXERCISE_TYPE_KEY)
            .map(String::as_str)
    }
}

/// Sort records ascending by timestamp, the order the chart projector expects
pub fn sort_chronological(records: &mut [ActivityRecord]) {
    records.sort_by_key(|r| r.timestamp);
}
