/// Local time zone handling for the timestamp line and day-to-date rain
use std::str::FromStr;

use chrono::{LocalResult, Offset, TimeZone};
use chrono_tz::Tz;
use time::{OffsetDateTime, UtcOffset};

use crate::error::{Result, WxNowError};

/// The station's local time zone, resolved from an IANA name such as
/// `Europe/Helsinki`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalZone(Tz);

impl LocalZone {
    pub fn new(tz: Tz) -> Self {
        LocalZone(tz)
    }

    pub fn utc() -> Self {
        LocalZone(Tz::UTC)
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Tz::from_str(name.trim())
            .map(LocalZone)
            .map_err(|e| WxNowError::Config(format!("invalid time zone '{}': {}", name, e)))
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// UTC offset in effect at `timestamp`
    pub fn offset_at(&self, timestamp: i64) -> Result<UtcOffset> {
        let local = self
            .0
            .timestamp_opt(timestamp, 0)
            .single()
            .ok_or_else(|| WxNowError::Time(format!("timestamp {} out of range", timestamp)))?;
        let seconds = local.offset().fix().local_minus_utc();
        UtcOffset::from_whole_seconds(seconds).map_err(|e| WxNowError::Time(e.to_string()))
    }

    /// Wall-clock date and time at `timestamp` in this zone
    pub fn local_datetime(&self, timestamp: i64) -> Result<OffsetDateTime> {
        let utc = OffsetDateTime::from_unix_timestamp(timestamp)
            .map_err(|e| WxNowError::Time(e.to_string()))?;
        Ok(utc.to_offset(self.offset_at(timestamp)?))
    }

    /// Epoch seconds of local midnight on the calendar day containing `timestamp`.
    ///
    /// When a DST transition skips midnight the day starts at 01:00; when
    /// midnight occurs twice the earlier instant is used.
    pub fn start_of_day(&self, timestamp: i64) -> Result<i64> {
        let local = self
            .0
            .timestamp_opt(timestamp, 0)
            .single()
            .ok_or_else(|| WxNowError::Time(format!("timestamp {} out of range", timestamp)))?;
        let date = local.date_naive();

        for hour in 0..=1 {
            let candidate = date
                .and_hms_opt(hour, 0, 0)
                .ok_or_else(|| WxNowError::Time(format!("invalid hour {}", hour)))?;
            match self.0.from_local_datetime(&candidate) {
                LocalResult::Single(start) => return Ok(start.timestamp()),
                LocalResult::Ambiguous(earliest, _) => return Ok(earliest.timestamp()),
                LocalResult::None => continue,
            }
        }

        Err(WxNowError::Time(format!(
            "no local midnight on {} in {}",
            date,
            self.name()
        )))
    }
}

impl Default for LocalZone {
    fn default() -> Self {
        LocalZone::utc()
    }
}
