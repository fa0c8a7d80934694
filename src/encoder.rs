/// Fixed-width field encoding for the wxnow.txt data line
///
/// Each field is a one-letter tag (none for wind direction) followed by a
/// zero-padded integer. An absent value keeps the tag and fills the digits
/// with spaces, so the line length never depends on which sensors reported.
/// `Field` lists the nine fields of the data line in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    WindDirection,
    WindSpeed,
    WindGust,
    OutsideTemperature,
    RainLastHour,
    RainLast24h,
    RainDayToDate,
    OutsideHumidity,
    BarometricPressure,
}

impl Field {
    pub const ORDER: [Field; 9] = [
        Field::WindDirection,
        Field::WindSpeed,
        Field::WindGust,
        Field::OutsideTemperature,
        Field::RainLastHour,
        Field::RainLast24h,
        Field::RainDayToDate,
        Field::OutsideHumidity,
        Field::BarometricPressure,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Field::WindDirection => "",
            Field::WindSpeed => "/",
            Field::WindGust => "g",
            Field::OutsideTemperature => "t",
            Field::RainLastHour => "r",
            Field::RainLast24h => "p",
            Field::RainDayToDate => "P",
            Field::OutsideHumidity => "h",
            Field::BarometricPressure => "b",
        }
    }

    pub fn digits(self) -> usize {
        match self {
            Field::OutsideHumidity => 2,
            Field::BarometricPressure => 5,
            _ => 3,
        }
    }

    /// Total width including the tag
    pub fn width(self) -> usize {
        self.tag().len() + self.digits()
    }

    /// Multiplier from the target unit to the integer the field carries:
    /// hundredths of an inch for rain, tenths of a millibar for pressure.
    fn scale(self) -> f64 {
        match self {
            Field::RainLastHour | Field::RainLast24h | Field::RainDayToDate => 100.0,
            Field::BarometricPressure => 10.0,
            _ => 1.0,
        }
    }

    /// Smallest and largest integer that fits the digits
    fn bounds(self) -> (i64, i64) {
        match self {
            Field::OutsideTemperature => (-99, 999),
            Field::OutsideHumidity => (1, 100),
            Field::BarometricPressure => (0, 99_999),
            _ => (0, 999),
        }
    }
}

/// Blank-padded placeholder for a value the station did not report
pub fn sentinel(field: Field) -> String {
    format!("{}{}", field.tag(), " ".repeat(field.digits()))
}

/// Render one field.
///
/// `value` must already be in the field's target unit (degrees, mph, °F,
/// inches, percent, millibar). Scaled values are truncated toward zero and
/// then clamped into the field's range. Humidity of 100 % is written as `00`.
///
/// A hundredth of an inch such as 0.29 scales to 28.999999999999996 in
/// binary floating point, so the scaled value is nudged away from zero by
/// `1e-9` before truncating.
pub fn encode(field: Field, value: Option<f64>) -> String {
    let value = match value {
        Some(v) if v.is_finite() => v,
        _ => return sentinel(field),
    };

    let (min, max) = field.bounds();
    let scaled = value * field.scale();
    let mut number = ((scaled + scaled.signum() * 1e-9).trunc() as i64).clamp(min, max);
    if field == Field::OutsideHumidity && number == 100 {
        number = 0;
    }

    format!("{}{:0width$}", field.tag(), number, width = field.digits())
}

/// Width of the complete data line, without its newline
pub fn line_width() -> usize {
    Field::ORDER.iter().map(|f| f.width()).sum()
}
