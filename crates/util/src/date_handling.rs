//! # Date Handling Utilities
//!
//! Formatting of the epoch-millisecond timestamps the container service
//! records, and the relative windows used to filter execution history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

const MINUTE_MILLIS: i64 = 60 * 1000;
const HOUR_MILLIS: i64 = 60 * MINUTE_MILLIS;
const DAY_MILLIS: i64 = 24 * HOUR_MILLIS;

/// Formats an epoch-millisecond timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// # Arguments
/// * `millis` - Milliseconds since the Unix epoch, if known
///
/// # Returns
/// The formatted timestamp, or `N/A` when the value is missing or out of range
///
/// # Example
/// ```rust
/// use xcs_util::date_handling::format_timestamp_millis;
///
/// assert_eq!(format_timestamp_millis(Some(1_700_000_000_000)), "2023-11-14 22:13:20");
/// assert_eq!(format_timestamp_millis(None), "N/A");
/// ```
pub fn format_timestamp_millis(millis: Option<i64>) -> String {
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|timestamp| timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Relative time window offered by the history date filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateWindow {
    #[default]
    All,
    LastHour,
    Last8Hours,
    Last24Hours,
    LastWeek,
    Last30Days,
}

impl DateWindow {
    pub const ALL: [DateWindow; 6] = [
        DateWindow::All,
        DateWindow::LastHour,
        DateWindow::Last8Hours,
        DateWindow::Last24Hours,
        DateWindow::LastWeek,
        DateWindow::Last30Days,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DateWindow::All => "All",
            DateWindow::LastHour => "Last Hour",
            DateWindow::Last8Hours => "Last 8 Hrs",
            DateWindow::Last24Hours => "Last 24 Hrs",
            DateWindow::LastWeek => "Last Week",
            DateWindow::Last30Days => "Last 30 days",
        }
    }

    /// Width of the window in milliseconds; `None` for [`DateWindow::All`].
    pub fn span_millis(&self) -> Option<i64> {
        match self {
            DateWindow::All => None,
            DateWindow::LastHour => Some(HOUR_MILLIS),
            DateWindow::Last8Hours => Some(8 * HOUR_MILLIS),
            DateWindow::Last24Hours => Some(DAY_MILLIS),
            DateWindow::LastWeek => Some(7 * DAY_MILLIS),
            DateWindow::Last30Days => Some(30 * DAY_MILLIS),
        }
    }

    /// Whether a launch at `launched_at` falls inside the window ending at
    /// `now`. Entries without a launch time only match [`DateWindow::All`].
    pub fn contains(&self, launched_at: Option<i64>, now: i64) -> bool {
        match (self.span_millis(), launched_at) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(span), Some(launched_at)) => span > now - launched_at,
        }
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DateWindow {
    type Err = String;

    /// Accepts the display labels and short forms (`all`, `1h`, `8h`, `24h`, `7d`, `30d`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let window = match normalized.as_str() {
            "all" => DateWindow::All,
            "1h" | "hour" | "last hour" => DateWindow::LastHour,
            "8h" | "last 8 hrs" => DateWindow::Last8Hours,
            "24h" | "1d" | "last 24 hrs" => DateWindow::Last24Hours,
            "7d" | "week" | "last week" => DateWindow::LastWeek,
            "30d" | "last 30 days" => DateWindow::Last30Days,
            _ => return Err(format!("unknown date window '{value}' (expected all, 1h, 8h, 24h, 7d or 30d)")),
        };
        Ok(window)
    }
}
