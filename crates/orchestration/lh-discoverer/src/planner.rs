//! Prefix planning for time-bucketed log keys.
//!
//! Log segments are written under `base/yyyy/mm/dd/HH/...`. Each listing call
//! costs money and latency, so the planner picks the narrowest set of prefixes
//! that still covers everything modified after the watermark:
//!
//! - watermark inside the current hour: list only the current hour bucket
//! - watermark within the lookback window (7 days): one prefix per day,
//!   oldest day first
//! - anything older, or the "beginning of time" sentinel: list the base prefix
//!   and let pagination do the work

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use lh_types::Watermark;

/// Default number of days for which per-day listing is used.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Computes the key prefixes to list on a poll cycle.
///
/// Pure function of the watermark and the current time; never performs I/O.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use lh_discoverer::PrefixPlanner;
/// use lh_types::Watermark;
///
/// let planner = PrefixPlanner::new("app");
/// let now = Utc.with_ymd_and_hms(2024, 1, 3, 12, 30, 0).unwrap();
/// let mark = Watermark::at(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());
///
/// assert_eq!(
///     planner.plan(mark, now),
///     vec!["app/2024/01/01", "app/2024/01/02", "app/2024/01/03"]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PrefixPlanner {
    base_prefix: String,
    lookback: Duration,
}

impl PrefixPlanner {
    /// Create a planner for the given base prefix.
    ///
    /// Trailing `/` characters are removed so prefixes join with exactly one
    /// separator.
    pub fn new(base_prefix: impl Into<String>) -> Self {
        let base_prefix = base_prefix.into().trim_end_matches('/').to_string();
        Self {
            base_prefix,
            lookback: Duration::days(DEFAULT_LOOKBACK_DAYS),
        }
    }

    /// Set the window within which per-day prefixes are listed.
    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    /// The normalized base prefix.
    pub fn base_prefix(&self) -> &str {
        &self.base_prefix
    }

    /// Plan the prefixes to list for this cycle.
    ///
    /// # Arguments
    ///
    /// * `watermark` - Modification time of the last fully processed object
    /// * `now` - Current time
    pub fn plan(&self, watermark: Watermark, now: DateTime<Utc>) -> Vec<String> {
        let Some(mark) = watermark.timestamp() else {
            return vec![self.base_prefix.clone()];
        };

        if mark >= truncate_to_hour(now) {
            return vec![self.join(&now.format("%Y/%m/%d/%H").to_string())];
        }

        if mark >= now - self.lookback {
            return days_between(mark.date_naive(), now.date_naive())
                .map(|day| self.join(&day.format("%Y/%m/%d").to_string()))
                .collect();
        }

        vec![self.base_prefix.clone()]
    }

    fn join(&self, suffix: &str) -> String {
        if self.base_prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}/{}", self.base_prefix, suffix)
        }
    }
}

/// Round a timestamp down to the start of its hour.
fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_minute(0))
        .unwrap_or(ts)
}

/// Calendar days from `start` through `end`, inclusive.
fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}
