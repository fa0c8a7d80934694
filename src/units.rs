/// Unit systems and conversions between the units a weather station reports in
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WxNowError};

// Conversion factors into each group's base unit
const MPS_PER_MPH: f64 = 0.44704;
const MPS_PER_KNOT: f64 = 1852.0 / 3600.0;
const MPS_PER_KPH: f64 = 1.0 / 3.6;
const MBAR_PER_INHG: f64 = 33.863_886_666_7;
const MM_PER_INCH: f64 = 25.4;
const MM_PER_CM: f64 = 10.0;

/// Physical quantities that need unit conversion before encoding.
///
/// Wind direction and humidity are unit-free and never pass through here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    WindSpeed,
    WindGust,
    Temperature,
    Pressure,
    Rain,
}

/// Physical dimension shared by a set of interconvertible units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Speed,
    Temperature,
    Pressure,
    Depth,
}

impl Quantity {
    pub fn group(self) -> Group {
        match self {
            Quantity::WindSpeed | Quantity::WindGust => Group::Speed,
            Quantity::Temperature => Group::Temperature,
            Quantity::Pressure => Group::Pressure,
            Quantity::Rain => Group::Depth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    MilePerHour,
    KmPerHour,
    MeterPerSecond,
    Knot,
    DegreeF,
    DegreeC,
    InchHg,
    Millibar,
    Hectopascal,
    Inch,
    Centimeter,
    Millimeter,
}

impl Unit {
    pub fn group(self) -> Group {
        match self {
            Unit::MilePerHour | Unit::KmPerHour | Unit::MeterPerSecond | Unit::Knot => Group::Speed,
            Unit::DegreeF | Unit::DegreeC => Group::Temperature,
            Unit::InchHg | Unit::Millibar | Unit::Hectopascal => Group::Pressure,
            Unit::Inch | Unit::Centimeter | Unit::Millimeter => Group::Depth,
        }
    }

    /// Express `value` in the base unit of this unit's group (m/s, °C, mbar, mm)
    fn to_base(self, value: f64) -> f64 {
        match self {
            Unit::MilePerHour => value * MPS_PER_MPH,
            Unit::KmPerHour => value * MPS_PER_KPH,
            Unit::Knot => value * MPS_PER_KNOT,
            Unit::DegreeF => (value - 32.0) * 5.0 / 9.0,
            Unit::InchHg => value * MBAR_PER_INHG,
            Unit::Inch => value * MM_PER_INCH,
            Unit::Centimeter => value * MM_PER_CM,
            Unit::MeterPerSecond | Unit::DegreeC | Unit::Millibar | Unit::Hectopascal => value,
            Unit::Millimeter => value,
        }
    }

    fn from_base(self, value: f64) -> f64 {
        match self {
            Unit::MilePerHour => value / MPS_PER_MPH,
            Unit::KmPerHour => value / MPS_PER_KPH,
            Unit::Knot => value / MPS_PER_KNOT,
            Unit::DegreeF => value * 9.0 / 5.0 + 32.0,
            Unit::InchHg => value / MBAR_PER_INHG,
            Unit::Inch => value / MM_PER_INCH,
            Unit::Centimeter => value / MM_PER_CM,
            Unit::MeterPerSecond | Unit::DegreeC | Unit::Millibar | Unit::Hectopascal => value,
            Unit::Millimeter => value,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Unit::MilePerHour => "mph",
            Unit::KmPerHour => "km/h",
            Unit::MeterPerSecond => "m/s",
            Unit::Knot => "knot",
            Unit::DegreeF => "°F",
            Unit::DegreeC => "°C",
            Unit::InchHg => "inHg",
            Unit::Millibar => "mbar",
            Unit::Hectopascal => "hPa",
            Unit::Inch => "inch",
            Unit::Centimeter => "cm",
            Unit::Millimeter => "mm",
        };
        f.write_str(name)
    }
}

/// Weather station unit systems, numbered the way the archive stores them
/// in its `usUnits` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    Us,
    Metric,
    MetricWx,
}

impl UnitSystem {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0x01 => Some(UnitSystem::Us),
            0x10 => Some(UnitSystem::Metric),
            0x11 => Some(UnitSystem::MetricWx),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            UnitSystem::Us => 0x01,
            UnitSystem::Metric => 0x10,
            UnitSystem::MetricWx => 0x11,
        }
    }

    /// Concrete unit a raw value of `quantity` is expressed in under this system
    pub fn unit_for(self, quantity: Quantity) -> Unit {
        match (self, quantity.group()) {
            (UnitSystem::Us, Group::Speed) => Unit::MilePerHour,
            (UnitSystem::Us, Group::Temperature) => Unit::DegreeF,
            (UnitSystem::Us, Group::Pressure) => Unit::InchHg,
            (UnitSystem::Us, Group::Depth) => Unit::Inch,
            (UnitSystem::Metric, Group::Speed) => Unit::KmPerHour,
            (UnitSystem::Metric, Group::Depth) => Unit::Centimeter,
            (UnitSystem::MetricWx, Group::Speed) => Unit::MeterPerSecond,
            (UnitSystem::MetricWx, Group::Depth) => Unit::Millimeter,
            (_, Group::Temperature) => Unit::DegreeC,
            (_, Group::Pressure) => Unit::Millibar,
        }
    }
}

impl FromStr for UnitSystem {
    type Err = WxNowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(UnitSystem::Us),
            "METRIC" => Ok(UnitSystem::Metric),
            "METRICWX" => Ok(UnitSystem::MetricWx),
            other => Err(WxNowError::Config(format!("unknown unit system '{}'", other))),
        }
    }
}

/// Convert `value` of `quantity` from one concrete unit to another
pub fn convert_unit(value: f64, quantity: Quantity, from: Unit, to: Unit) -> Result<f64> {
    let group = quantity.group();
    if from.group() != group || to.group() != group {
        return Err(WxNowError::Conversion { quantity, from, to });
    }
    if from == to {
        return Ok(value);
    }
    Ok(to.from_base(from.to_base(value)))
}

/// Re-express `value`, given in `system`'s unit for `quantity`, in `target`
pub fn convert(value: f64, quantity: Quantity, system: UnitSystem, target: Unit) -> Result<f64> {
    convert_unit(value, quantity, system.unit_for(quantity), target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn same_unit_is_identity() {
        let v = convert(68.9, Quantity::Temperature, UnitSystem::Us, Unit::DegreeF).unwrap();
        assert_eq!(v, 68.9);
        let v = convert(1013.2, Quantity::Pressure, UnitSystem::Metric, Unit::Millibar).unwrap();
        assert_eq!(v, 1013.2);
    }

    #[test]
    fn temperature_is_affine() {
        let f = convert(20.0, Quantity::Temperature, UnitSystem::Metric, Unit::DegreeF).unwrap();
        assert!(close(f, 68.0));
        let f = convert(-40.0, Quantity::Temperature, UnitSystem::MetricWx, Unit::DegreeF).unwrap();
        assert!(close(f, -40.0));
    }

    #[test]
    fn linear_factors() {
        let mph = convert(
            10.0,
            Quantity::WindSpeed,
            UnitSystem::MetricWx,
            Unit::MilePerHour,
        )
        .unwrap();
        assert!(close(mph, 22.369362920544024));
        let mph = convert(36.0, Quantity::WindGust, UnitSystem::Metric, Unit::MilePerHour).unwrap();
        assert!(close(mph, 22.369362920544024));
        let inch = convert(25.4, Quantity::Rain, UnitSystem::MetricWx, Unit::Inch).unwrap();
        assert!(close(inch, 1.0));
        let inch = convert(2.54, Quantity::Rain, UnitSystem::Metric, Unit::Inch).unwrap();
        assert!(close(inch, 1.0));
        let mbar = convert(29.92, Quantity::Pressure, UnitSystem::Us, Unit::Millibar).unwrap();
        assert!((mbar - 1013.21).abs() < 0.01);
    }

    #[test]
    fn round_trips_within_tolerance() {
        let pairs = [
            (Quantity::WindSpeed, Unit::KmPerHour, Unit::MilePerHour, 17.3),
            (Quantity::WindSpeed, Unit::Knot, Unit::MeterPerSecond, 4.2),
            (Quantity::Temperature, Unit::DegreeC, Unit::DegreeF, -12.7),
            (Quantity::Pressure, Unit::InchHg, Unit::Hectopascal, 30.12),
            (Quantity::Rain, Unit::Millimeter, Unit::Inch, 13.9),
        ];
        for (quantity, a, b, v) in pairs {
            let there = convert_unit(v, quantity, a, b).unwrap();
            let back = convert_unit(there, quantity, b, a).unwrap();
            assert!(close(back, v), "{:?} {} -> {} gave {}", quantity, a, b, back);
        }
    }

    #[test]
    fn mismatched_group_is_a_conversion_error() {
        let err = convert(1.0, Quantity::Temperature, UnitSystem::Us, Unit::Inch).unwrap_err();
        assert!(matches!(
            err,
            WxNowError::Conversion {
                quantity: Quantity::Temperature,
                from: Unit::DegreeF,
                to: Unit::Inch
            }
        ));
    }

    #[test]
    fn unit_system_codes_and_names() {
        for system in [UnitSystem::Us, UnitSystem::Metric, UnitSystem::MetricWx] {
            assert_eq!(UnitSystem::from_code(system.code()), Some(system));
        }
        assert_eq!(UnitSystem::from_code(2), None);
        assert_eq!("metricwx".parse::<UnitSystem>().unwrap(), UnitSystem::MetricWx);
        assert!("imperial".parse::<UnitSystem>().is_err());
    }
}
