/// Rain totals recovered from the weather archive
use crate::error::Result;
use crate::units::UnitSystem;
use crate::zone::LocalZone;

const HOUR_SECS: i64 = 3600;
const DAY_SECS: i64 = 86_400;

/// Read-only view of the historical weather archive.
///
/// `rain_sum` returns the summed rain depth of all records with
/// `after < dateTime <= up_to`, in the archive's own rain unit, or `None`
/// when the archive has nothing to sum.
pub trait Archive {
    fn rain_sum(&self, after: i64, up_to: i64) -> Result<Option<f64>>;

    /// Unit system the archive stores its values in
    fn unit_system(&self) -> UnitSystem;
}

/// Rain over the trailing hour `(t - 3600, t]`
pub fn hourly<A: Archive + ?Sized>(archive: &A, timestamp: i64) -> Result<Option<f64>> {
    archive.rain_sum(timestamp - HOUR_SECS, timestamp)
}

/// Rain over the trailing 24 hours `(t - 86400, t]`
pub fn daily24<A: Archive + ?Sized>(archive: &A, timestamp: i64) -> Result<Option<f64>> {
    archive.rain_sum(timestamp - DAY_SECS, timestamp)
}

/// Rain since local midnight `(start_of_day(t), t]`
pub fn day_to_date<A: Archive + ?Sized>(
    archive: &A,
    zone: &LocalZone,
    timestamp: i64,
) -> Result<Option<f64>> {
    let start = zone.start_of_day(timestamp)?;
    archive.rain_sum(start, timestamp)
}
