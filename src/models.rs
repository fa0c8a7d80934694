use std::collections::HashMap;

use crate::error::{Result, WxNowError};
use crate::units::UnitSystem;

/// A weather record as the station framework hands it over: column name to
/// optional value, using the archive's column names (`dateTime`, `usUnits`,
/// `outTemp`, ...).
pub type Record = HashMap<String, Option<f64>>;

/// Reading decoded from a RuuviTag format 5 advertisement; `None` where the
/// tag flagged the measurement as unavailable
#[derive(Debug, Clone, PartialEq)]
pub struct RuuviData {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

/// One weather observation, ready to be rendered as a status line.
///
/// Every value is expressed in `unit_system`'s unit for its quantity;
/// `None` means the sensor did not report it.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: Option<i64>,
    pub unit_system: UnitSystem,
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub outside_temperature: Option<f64>,
    pub outside_humidity: Option<f64>,
    pub barometric_pressure: Option<f64>,
    pub rain_last_hour: Option<f64>,
    pub rain_last_24h: Option<f64>,
    pub rain_day_to_date: Option<f64>,
}

impl Observation {
    /// An observation with no sensor values
    pub fn new(timestamp: i64, unit_system: UnitSystem) -> Self {
        Observation {
            timestamp: Some(timestamp),
            unit_system,
            wind_direction: None,
            wind_speed: None,
            wind_gust: None,
            outside_temperature: None,
            outside_humidity: None,
            barometric_pressure: None,
            rain_last_hour: None,
            rain_last_24h: None,
            rain_day_to_date: None,
        }
    }

    /// Build an observation from a framework record.
    ///
    /// A missing `dateTime` is carried through as an absent timestamp so the
    /// assembler can reject it; a missing or unknown `usUnits` fails here.
    pub fn from_record(record: &Record) -> Result<Self> {
        let get = |key: &str| record.get(key).copied().flatten();

        let code = get("usUnits").map(|v| v as i64);
        let unit_system = code
            .and_then(UnitSystem::from_code)
            .ok_or(WxNowError::UnknownUnitSystem(code))?;

        Ok(Observation {
            timestamp: get("dateTime").map(|v| v as i64),
            unit_system,
            wind_direction: get("windDir"),
            wind_speed: get("windSpeed"),
            wind_gust: get("windGust"),
            outside_temperature: get("outTemp"),
            outside_humidity: get("outHumidity"),
            barometric_pressure: get("barometer"),
            rain_last_hour: get("hourRain"),
            rain_last_24h: get("rain24"),
            rain_day_to_date: get("dayRain"),
        })
    }
}

impl RuuviData {
    /// Turn a tag reading into a metric observation (°C, %, hPa == mbar).
    ///
    /// The tag measures station pressure, which is reported as the barometer
    /// reading without altitude reduction. That only holds for a tag close
    /// to sea level.
    pub fn into_observation(self, timestamp: i64) -> Observation {
        Observation {
            outside_temperature: self.temperature,
            outside_humidity: self.humidity,
            barometric_pressure: self.pressure,
            ..Observation::new(timestamp, UnitSystem::Metric)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Option<f64>)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn from_record_maps_archive_columns() {
        let rec = record(&[
            ("dateTime", Some(1_700_000_000.0)),
            ("usUnits", Some(1.0)),
            ("windDir", Some(315.4)),
            ("windSpeed", Some(12.3)),
            ("windGust", None),
            ("outTemp", Some(68.9)),
            ("dayRain", Some(0.0)),
        ]);
        let obs = Observation::from_record(&rec).unwrap();
        assert_eq!(obs.timestamp, Some(1_700_000_000));
        assert_eq!(obs.unit_system, UnitSystem::Us);
        assert_eq!(obs.wind_direction, Some(315.4));
        assert_eq!(obs.wind_gust, None);
        assert_eq!(obs.outside_humidity, None);
        assert_eq!(obs.rain_day_to_date, Some(0.0));
        assert_eq!(obs.rain_last_hour, None);
    }

    #[test]
    fn from_record_without_units_fails() {
        let rec = record(&[("dateTime", Some(1.0))]);
        assert!(matches!(
            Observation::from_record(&rec),
            Err(WxNowError::UnknownUnitSystem(None))
        ));
        let rec = record(&[("dateTime", Some(1.0)), ("usUnits", Some(3.0))]);
        assert!(matches!(
            Observation::from_record(&rec),
            Err(WxNowError::UnknownUnitSystem(Some(3)))
        ));
    }

    #[test]
    fn from_record_keeps_missing_timestamp() {
        let rec = record(&[("usUnits", Some(17.0)), ("dateTime", None)]);
        let obs = Observation::from_record(&rec).unwrap();
        assert_eq!(obs.timestamp, None);
        assert_eq!(obs.unit_system, UnitSystem::MetricWx);
    }

    #[test]
    fn ruuvi_reading_is_metric() {
        let data = RuuviData {
            temperature: Some(21.5),
            humidity: None,
            pressure: Some(1002.4),
        };
        let obs = data.into_observation(42);
        assert_eq!(obs.unit_system, UnitSystem::Metric);
        assert_eq!(obs.timestamp, Some(42));
        // station pressure, unreduced
        assert_eq!(obs.barometric_pressure, Some(1002.4));
        assert_eq!(obs.outside_humidity, None);
        assert_eq!(obs.wind_speed, None);
    }
}
