//! Daily aggregation
//!
//! Filters a record set down to one kind and one calendar day, totals it,
//! and scores the total against the server-supplied goal. The day boundary
//! is the start of the *local* day in a caller-supplied time zone, not UTC
//! midnight; the binary passes the device zone and tests pass fixed offsets.

use crate::format;
use crate::record::{ActivityKind, ActivityRecord};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

/// Daily totals for one activity kind
///
/// `entries` holds the day's records sorted descending by timestamp (most
/// recent first). Downstream list rendering targets edits and deletes by
/// position, so that order is part of the contract, not a cosmetic choice.
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub day: NaiveDate,
    pub kind: ActivityKind,
    pub total_value: f64,
    pub goal: f64,
    /// False when the server supplied no usable goal; the UI shows
    /// "no goal set" instead of a progress bar
    pub goal_set: bool,
    /// `total / goal` clamped to `[0, 1]`; 0.0 whenever `goal <= 0`
    pub progress_ratio: f64,
    pub entries: Vec<ActivityRecord>,
}

impl DailySummary {
    /// Whole-percent progress, truncated (0.275 → 27)
    pub fn percent(&self) -> u32 {
        (self.progress_ratio * 100.0) as u32
    }

    /// Presentation string, e.g. `550 ml / 2,000 ml (27%)`
    pub fn progress_line(&self, unit: &str) -> String {
        format::progress_line(self.total_value, self.goal, unit, self.percent())
    }
}

/// Progress ratio with the zero-goal policy applied
///
/// `goal <= 0` means "no goal set" and yields 0.0 rather than a division
/// error; otherwise the ratio is clamped to `[0, 1]`.
pub fn progress_ratio(total: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }
    (total / goal).clamp(0.0, 1.0)
}

/// Calendar day of a timestamp in the given zone
pub fn local_day<Tz: TimeZone>(timestamp: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    timestamp.with_timezone(tz).date_naive()
}

/// Aggregate one kind's records for one calendar day
///
/// Absence of matching records is not an error; it yields a summary with
/// `total_value = 0`.
pub fn summarize<Tz: TimeZone>(
    records: &[ActivityRecord],
    kind: ActivityKind,
    day: NaiveDate,
    goal: f64,
    tz: &Tz,
) -> DailySummary {
    let mut entries: Vec<ActivityRecord> = records
        .iter()
        .filter(|r| r.kind == kind && local_day(r.timestamp, tz) == day)
        .cloned()
        .collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let total_value: f64 = entries.iter().map(|r| r.value).sum();

    DailySummary {
        day,
        kind,
        total_value,
        goal,
        goal_set: goal > 0.0,
        progress_ratio: progress_ratio(total_value, goal),
        entries,
    }
}

// ============================================================================
// Trend over a series
// ============================================================================

/// First-to-latest change across a chronologically sorted series
///
/// Backs the stats header above the weight chart: starting value, current
/// value, and the change between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub start: f64,
    pub current: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl TrendSummary {
    /// True when the series fell or held steady (rendered as the
    /// "good" direction for weight)
    pub fn is_decrease(&self) -> bool {
        self.change <= 0.0
    }
}

/// Trend over records sorted ascending by timestamp; `None` when empty
pub fn trend(records: &[ActivityRecord]) -> Option<TrendSummary> {
    let start = records.first()?.value;
    let current = records.last()?.value;
    let change = current - start;
    let change_percent = if start == 0.0 {
        0.0
    } else {
        (change / start) * 100.0
    };
    Some(TrendSummary {
        start,
        current,
        change,
        change_percent,
    })
}
