//! Daily weather forecast model

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One day of a weather forecast
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Forecast {
    /// Provider's summary of the day
    pub forecast: String,
    /// Day rendered as `Www Mmm DD YYYY`
    pub time: String,
}

impl Forecast {
    /// Build a forecast entry from a summary and a unix timestamp in seconds,
    /// labelled with the calendar day at the given UTC offset
    ///
    /// Returns `None` when the timestamp is outside the representable range.
    #[must_use]
    pub fn from_unix(
        summary: impl Into<String>,
        unix_seconds: i64,
        offset: FixedOffset,
    ) -> Option<Self> {
        let day = DateTime::from_timestamp(unix_seconds, 0)?.with_timezone(&offset);
        Some(Self {
            forecast: summary.into(),
            time: day.format("%a %b %d %Y").to_string(),
        })
    }
}
