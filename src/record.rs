/// Assembly of the two-line wxnow.txt status record
use std::fmt;
use std::path::Path;

use log::debug;
use time::macros::format_description;

use crate::encoder::{encode, Field};
use crate::error::{Result, WxNowError};
use crate::models::Observation;
use crate::rain::{self, Archive};
use crate::sink;
use crate::units::{convert, Quantity, Unit, UnitSystem};
use crate::zone::LocalZone;

/// Rendered status: a local timestamp line and the 36-character data line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub timestamp_line: String,
    pub data_line: String,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.timestamp_line)?;
        writeln!(f, "{}", self.data_line)
    }
}

/// Format a timestamp the way Cumulus writes it, e.g. `Oct 16 2026 05:00`
pub fn format_timestamp(zone: &LocalZone, timestamp: i64) -> Result<String> {
    let format = format_description!("[month repr:short] [day] [year] [hour]:[minute]");
    zone.local_datetime(timestamp)?
        .format(&format)
        .map_err(|e| WxNowError::Time(e.to_string()))
}

fn to_target(
    value: Option<f64>,
    quantity: Quantity,
    system: UnitSystem,
    target: Unit,
) -> Result<Option<f64>> {
    value.map(|v| convert(v, quantity, system, target)).transpose()
}

/// Rain depth in inches, preferring the observation's own value.
///
/// Only when the observation lacks it is the archive asked; an empty
/// archive window stays absent rather than becoming zero.
fn rain_inches<A, F>(
    live: Option<f64>,
    system: UnitSystem,
    archive: &A,
    aggregate: F,
) -> Result<Option<f64>>
where
    A: Archive + ?Sized,
    F: FnOnce(&A) -> Result<Option<f64>>,
{
    match live {
        Some(depth) => convert(depth, Quantity::Rain, system, Unit::Inch).map(Some),
        None => match aggregate(archive)? {
            Some(sum) => convert(sum, Quantity::Rain, archive.unit_system(), Unit::Inch).map(Some),
            None => Ok(None),
        },
    }
}

/// Build the status record for one observation.
///
/// Missing sensor values become blank fields. Fails only when the
/// observation has no timestamp, a value cannot be converted, or the
/// archive query itself fails.
pub fn assemble<A: Archive + ?Sized>(
    observation: &Observation,
    archive: &A,
    zone: &LocalZone,
) -> Result<StatusLine> {
    let timestamp = observation.timestamp.ok_or(WxNowError::MissingTimestamp)?;
    let system = observation.unit_system;

    let wind_speed = to_target(
        observation.wind_speed,
        Quantity::WindSpeed,
        system,
        Unit::MilePerHour,
    )?;
    let wind_gust = to_target(
        observation.wind_gust,
        Quantity::WindGust,
        system,
        Unit::MilePerHour,
    )?;
    let temperature = to_target(
        observation.outside_temperature,
        Quantity::Temperature,
        system,
        Unit::DegreeF,
    )?;
    let pressure = to_target(
        observation.barometric_pressure,
        Quantity::Pressure,
        system,
        Unit::Millibar,
    )?;

    let hour_rain = rain_inches(observation.rain_last_hour, system, archive, |a| {
        rain::hourly(a, timestamp)
    })?;
    let rain_24h = rain_inches(observation.rain_last_24h, system, archive, |a| {
        rain::daily24(a, timestamp)
    })?;
    let day_rain = rain_inches(observation.rain_day_to_date, system, archive, |a| {
        rain::day_to_date(a, zone, timestamp)
    })?;

    let values = [
        observation.wind_direction,
        wind_speed,
        wind_gust,
        temperature,
        hour_rain,
        rain_24h,
        day_rain,
        observation.outside_humidity,
        pressure,
    ];
    let data_line: String = Field::ORDER
        .iter()
        .zip(values)
        .map(|(field, value)| encode(*field, value))
        .collect();

    Ok(StatusLine {
        timestamp_line: format_timestamp(zone, timestamp)?,
        data_line,
    })
}

/// Assemble the record and replace the file at `path` with it
pub fn emit<A: Archive + ?Sized>(
    observation: &Observation,
    archive: &A,
    zone: &LocalZone,
    path: &Path,
) -> Result<StatusLine> {
    let status = assemble(observation, archive, zone)?;
    sink::write(path, &status.to_string())?;
    debug!("Wrote {}: {}", path.display(), status.data_line);
    Ok(status)
}
