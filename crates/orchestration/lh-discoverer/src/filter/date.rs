//! Modification-time filtering against the watermark.

use chrono::{DateTime, TimeDelta, Utc};
use lh_types::{ObjectRef, Watermark};

use super::Filter;

/// Keeps objects modified strictly after the watermark.
///
/// Objects exactly at the watermark were already fully processed. Objects
/// without a modification time cannot be ordered against the watermark and
/// are dropped.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use lh_discoverer::filter::{Filter, WatermarkFilter};
/// use lh_types::{ObjectRef, Watermark};
///
/// let mark = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let filter = WatermarkFilter::new(Watermark::at(mark));
///
/// assert!(!filter.matches(&ObjectRef::new("mem://b/a.log", Some(mark), 10)));
/// assert!(!filter.matches(&ObjectRef::new("mem://b/b.log", None, 10)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WatermarkFilter {
    watermark: Watermark,
}

impl WatermarkFilter {
    /// Create a filter for the given watermark.
    pub fn new(watermark: Watermark) -> Self {
        Self { watermark }
    }

}

impl Filter for WatermarkFilter {
    fn matches(&self, obj: &ObjectRef) -> bool {
        match obj.last_modified {
            Some(modified) => !self.watermark.covers(modified),
            None => false,
        }
    }

    fn description(&self) -> String {
        format!("modified(after={})", self.watermark)
    }
}

/// Parse a date string in various formats.
///
/// Supported formats:
/// - ISO 8601: `2024-01-15T10:30:00Z`
/// - Date only: `2024-01-15` (assumes 00:00:00 UTC)
/// - Relative: `-24h`, `-7d`, `-2w` (hours/days/weeks ago from now)
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();

    if input.starts_with('-') {
        return parse_relative_date(input);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let datetime = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| format!("Invalid date: {input}"))?;
        return Ok(DateTime::from_naive_utc_and_offset(datetime, Utc));
    }

    Err(format!(
        "Invalid date format: {input}. Expected ISO 8601 (2024-01-15T10:30:00Z), \
         date only (2024-01-15), or relative (-24h, -7d)"
    ))
}

/// Parse a relative date string like "-24h" or "-7d".
fn parse_relative_date(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim_start_matches('-');

    let Some(unit) = input.chars().last() else {
        return Err("Empty relative date".to_string());
    };

    let num_str = &input[..input.len() - unit.len_utf8()];
    let num: i64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number in relative date: {num_str}"))?;

    let duration = match unit {
        'h' | 'H' => TimeDelta::try_hours(num),
        'd' | 'D' => TimeDelta::try_days(num),
        'w' | 'W' => TimeDelta::try_weeks(num),
        _ => {
            return Err(format!(
                "Invalid relative date unit: {input}. Use 'h' (hours), 'd' (days), or 'w' (weeks)"
            ));
        }
    };

    duration
        .and_then(|d| Utc::now().checked_sub_signed(d))
        .ok_or_else(|| format!("Relative date out of range: -{input}"))
}
