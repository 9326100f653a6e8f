//! Tolerant wire decoding
//!
//! The remote store's payloads drift: numbers arrive as strings, metadata is
//! a JSON object serialized *inside* a JSON string (or an empty array, or
//! null), and timestamps come in two formats. Decoding here is total —
//! malformed fields degrade to documented defaults and are reported through
//! a `tracing::warn!` side channel, never by failing the record or the
//! surrounding collection.
//!
//! Each fallback is an explicit ordered chain (try the expected shape, then
//! the tolerated alternates, then the default) rather than per-call-site
//! guesswork.

use crate::record::{sort_chronological, ActivityKind, ActivityRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Fallback daily water goal in ml when the server's goal field is unusable
pub const DEFAULT_WATER_GOAL_ML: f64 = 2000.0;

/// Fallback for an unusable `value` field
pub const DEFAULT_VALUE: f64 = 0.0;

/// Fractional-second UTC timestamp, e.g. `2024-03-05T08:30:00.123456Z`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Bare date, e.g. `2024-03-05`, taken as start of day UTC
const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Decode policy
// ============================================================================

/// Policy for negative wire values
///
/// The store accepts negative values without comment; whether that is
/// intentional (signed deltas) or a validation gap upstream is unresolved,
/// so the choice is configuration rather than a hard-coded rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeValuePolicy {
    /// Pass negative values through unmodified
    #[default]
    Allow,
    /// Clamp negative values to 0.0
    ClampToZero,
}

/// Options applied while normalizing records
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub negative_values: NegativeValuePolicy,
}

// ============================================================================
// Field-level fallback chains
// ============================================================================

/// Decode a numeric field that may arrive as a number or a numeric string
///
/// Chain: JSON number → string parsed as f64 → `default`.
pub fn flexible_f64(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                warn!(field = %s, "non-numeric string in numeric field, using default");
                default
            }
        },
        Some(other) => {
            warn!(got = %json_type_name(other), "unexpected type in numeric field, using default");
            default
        }
        None => default,
    }
}

/// Decode an integer field with the same number-or-string tolerance
pub fn flexible_i64(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or_else(|_| {
            warn!(field = %s, "non-numeric string in integer field, using default");
            default
        }),
        Some(other) => {
            warn!(got = %json_type_name(other), "unexpected type in integer field, using default");
            default
        }
        None => default,
    }
}

/// Decode a timestamp from either accepted textual format
///
/// Chain: fractional-second UTC → bare date (start of day) → `None`.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Timestamp field with the full chain: parseable text → "now"
///
/// The fallback to the current time is lossy, so it is logged.
fn timestamp_or_now(value: Option<&Value>) -> DateTime<Utc> {
    match value {
        Some(Value::String(s)) => parse_timestamp(s).unwrap_or_else(|| {
            warn!(date = %s, "unparseable timestamp, falling back to now");
            Utc::now()
        }),
        Some(other) => {
            warn!(got = %json_type_name(other), "unexpected type in timestamp field, falling back to now");
            Utc::now()
        }
        None => {
            warn!("missing timestamp field, falling back to now");
            Utc::now()
        }
    }
}

/// Normalize the metadata field to a key→string map
///
/// Accepted shapes: a JSON-object-encoded string (the usual wire form), a
/// plain object (some endpoints skip the inner encoding), and the degenerate
/// empties — absent, null, `"[]"`, or an actual empty array. Non-string
/// values inside the object are dropped.
pub fn metadata_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let object = match value {
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(inner) => inner,
            Err(_) => {
                if !s.trim().is_empty() {
                    warn!("metadata string is not valid JSON, treating as empty");
                }
                return BTreeMap::new();
            }
        },
        Some(v) => v.clone(),
        None => return BTreeMap::new(),
    };

    match object {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect(),
        // Null and the serialized-empty-list shape both mean "no metadata"
        Value::Null | Value::Array(_) => BTreeMap::new(),
        other => {
            warn!(got = %json_type_name(&other), "unexpected metadata shape, treating as empty");
            BTreeMap::new()
        }
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Record normalization
// ============================================================================

/// Decode one raw record into the canonical shape
///
/// Total over its input: any structurally-present-but-wrong-typed field is
/// replaced by its documented default. `kind` is the collection the record
/// came from; a recognized `activity_type` field overrides it.
pub fn normalize(raw: &Value, kind: ActivityKind, opts: &DecodeOptions) -> ActivityRecord {
    let field = |key: &str| raw.get(key);

    let id = flexible_i64(field("id"), 0);
    if id == 0 {
        warn!("record has missing or unusable id, defaulting to 0");
    }

    let kind = string_field(field("activity_type"))
        .and_then(|s| s.parse::<ActivityKind>().ok())
        .unwrap_or(kind);

    let mut value = flexible_f64(field("value"), DEFAULT_VALUE);
    if value < 0.0 && opts.negative_values == NegativeValuePolicy::ClampToZero {
        value = 0.0;
    }

    ActivityRecord {
        id,
        kind,
        timestamp: timestamp_or_now(field("date")),
        value,
        unit: string_field(field("unit")).unwrap_or_else(|| kind.default_unit().to_string()),
        metadata: metadata_map(field("additional_data")),
        notes: string_field(field("notes")),
    }
}

// ============================================================================
// Snapshot envelope
// ============================================================================

/// Fully decoded fetch/mutation response
///
/// The remote store returns one envelope shape everywhere: per-kind record
/// lists plus the server-side daily water goal. Every mutation response is
/// itself a fresh snapshot.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ActivitySnapshot {
    pub weights: Vec<ActivityRecord>,
    pub water_intakes: Vec<ActivityRecord>,
    pub exercises: Vec<ActivityRecord>,
    pub today_water_intake: Option<f64>,
    pub water_goal: f64,
}

impl ActivitySnapshot {
    /// Decode the wire envelope
    ///
    /// A per-kind list that is missing or not an array degrades to an empty
    /// list; one malformed record never aborts its collection. Each list is
    /// sorted ascending by timestamp, the order the chart projector and the
    /// aggregator rely on.
    pub fn from_wire(envelope: &Value, opts: &DecodeOptions) -> Self {
        let water_goal = match envelope.get("waterIntakeGoal") {
            None => {
                warn!("snapshot missing waterIntakeGoal, using fallback");
                DEFAULT_WATER_GOAL_ML
            }
            some => flexible_f64(some, DEFAULT_WATER_GOAL_ML),
        };

        let today_water_intake = match envelope.get("todayWaterIntake") {
            None | Some(Value::Null) => None,
            some => Some(flexible_f64(some, 0.0)),
        };

        Self {
            weights: decode_list(envelope.get("weights"), ActivityKind::Weight, opts),
            water_intakes: decode_list(
                envelope.get("waterIntakes"),
                ActivityKind::WaterIntake,
                opts,
            ),
            exercises: decode_list(envelope.get("exercises"), ActivityKind::Exercise, opts),
            today_water_intake,
            water_goal,
        }
    }

    /// Records for one kind, ascending by timestamp
    pub fn records(&self, kind: ActivityKind) -> &[ActivityRecord] {
        match kind {
            ActivityKind::Weight => &self.weights,
            ActivityKind::WaterIntake => &self.water_intakes,
            ActivityKind::Exercise => &self.exercises,
        }
    }
}

fn decode_list(value: Option<&Value>, kind: ActivityKind, opts: &DecodeOptions) -> Vec<ActivityRecord> {
    let items = match value {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Vec::new(),
        Some(other) => {
            warn!(kind = %kind, got = %json_type_name(other), "record list is not an array, treating as empty");
            return Vec::new();
        }
    };

    let mut records: Vec<ActivityRecord> = items
        .iter()
        .filter_map(|item| {
            if item.is_object() {
                Some(normalize(item, kind, opts))
            } else {
                warn!(kind = %kind, "skipping non-object entry in record list");
                None
            }
        })
        .collect();
    sort_chronological(&mut records);
    records
}
