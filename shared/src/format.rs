//! Display formatting helpers
//!
//! Small presentation conveniences the aggregator and chart expose as part
//! of their observable contract: grouped amounts, the daily progress line,
//! and short date labels for chart axes.

use chrono::{DateTime, Datelike, Utc};

/// Default thousands separator; callers with other locales pass their own
pub const DEFAULT_GROUP_SEPARATOR: char = ',';

/// Group an integer's digits, e.g. `2000` → `2,000`
pub fn group_thousands(n: i64, separator: char) -> String {
    let digits = n.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Render an amount rounded to a whole number with default grouping
pub fn format_amount(value: f64) -> String {
    group_thousands(value.round() as i64, DEFAULT_GROUP_SEPARATOR)
}

/// Daily progress line, e.g. `550 ml / 2,000 ml (27%)`
pub fn progress_line(total: f64, goal: f64, unit: &str, percent: u32) -> String {
    format!(
        "{} {} / {} {} ({}%)",
        format_amount(total),
        unit,
        format_amount(goal),
        unit,
        percent
    )
}

/// Axis tick label, e.g. `72.5 kg`
pub fn axis_value_label(value: f64, unit: &str) -> String {
    format!("{:.1} {}", value, unit)
}

/// Short date label for chart axes and tooltips, e.g. `Mar 5`
pub fn short_date(timestamp: &DateTime<Utc>) -> String {
    format!("{} {}", timestamp.format("%b"), timestamp.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0")]
    #[case(550, "550")]
    #[case(2000, "2,000")]
    #[case(1_234_567, "1,234,567")]
    #[case(-2000, "-2,000")]
    fn test_group_thousands(#[case] n: i64, #[case] expected: &str) {
        assert_eq!(group_thousands(n, ','), expected);
    }

    #[test]
    fn test_group_thousands_custom_separator() {
        assert_eq!(group_thousands(2000, '.'), "2.000");
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(
            progress_line(550.0, 2000.0, "ml", 27),
            "550 ml / 2,000 ml (27%)"
        );
    }

    #[test]
    fn test_axis_value_label() {
        assert_eq!(axis_value_label(72.46, "kg"), "72.5 kg");
    }

    #[test]
    fn test_short_date() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap();
        assert_eq!(short_date(&ts), "Mar 5");
    }
}
