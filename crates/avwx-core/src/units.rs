//! Unit conversion utilities
//!
//! Temperatures are Celsius, pressures hPa and speeds knots unless a
//! field name says otherwise.

/// Unit conversion error
#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Conversion not supported: {from:?} -> {to:?}")]
    ConversionNotSupported { from: Unit, to: Unit },
}

/// Units that appear in decoded bulletins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Celsius,
    Fahrenheit,
    Knots,
    MilesPerHour,
    Hectopascal,
    InchesHg,
}

impl std::str::FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" | "degC" | "celsius" => Ok(Unit::Celsius),
            "F" | "degF" | "fahrenheit" => Ok(Unit::Fahrenheit),
            "kt" | "KT" | "knots" => Ok(Unit::Knots),
            "mph" | "MPH" => Ok(Unit::MilesPerHour),
            "hPa" | "mb" | "mbar" => Ok(Unit::Hectopascal),
            "inHg" | "INS" => Ok(Unit::InchesHg),
            other => Err(UnitError::UnknownUnit(other.to_string())),
        }
    }
}

pub const KNOTS_TO_MPH: f64 = 1.15078;
pub const HPA_TO_INHG: f64 = 0.02953;
pub const INHG_TO_HPA: f64 = 33.8639;

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

pub fn knots_to_mph(kt: f64) -> f64 {
    kt * KNOTS_TO_MPH
}

pub fn hpa_to_inches_hg(hpa: f64) -> f64 {
    hpa * HPA_TO_INHG
}

pub fn inches_hg_to_hpa(inhg: f64) -> f64 {
    inhg * INHG_TO_HPA
}

/// Convert value between units of the same quantity
pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, UnitError> {
    if from == to {
        return Ok(value);
    }

    match (from, to) {
        (Unit::Celsius, Unit::Fahrenheit) => Ok(celsius_to_fahrenheit(value)),
        (Unit::Fahrenheit, Unit::Celsius) => Ok(fahrenheit_to_celsius(value)),
        (Unit::Knots, Unit::MilesPerHour) => Ok(knots_to_mph(value)),
        (Unit::MilesPerHour, Unit::Knots) => Ok(value / KNOTS_TO_MPH),
        (Unit::Hectopascal, Unit::InchesHg) => Ok(hpa_to_inches_hg(value)),
        (Unit::InchesHg, Unit::Hectopascal) => Ok(inches_hg_to_hpa(value)),
        _ => Err(UnitError::ConversionNotSupported { from, to }),
    }
}

/// Decode a two-digit upper-air temperature code.
///
/// Codes `50..=99` stand for `-(code - 50)` degrees Celsius. Anything else,
/// including codes below 50 and non-digit input, cannot be represented and
/// yields `None`.
pub fn decode_temperature_code(code: &str) -> Option<i32> {
    let code = code.trim();
    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i32 = code.parse().ok()?;
    if (50..=99).contains(&value) {
        Some(-(value - 50))
    } else {
        None
    }
}

/// Numeric statute-mile value of a visibility token.
///
/// Accepts `10`, `10+`, `6+`, `P6SM`, `3/4`, `1 1/2SM` and `M1/4SM`. The
/// "at least" and "less than" markers are dropped.
pub fn visibility_statute_miles(token: &str) -> Option<f64> {
    let cleaned = token
        .trim()
        .trim_end_matches("SM")
        .trim_start_matches(&['P', 'M'][..])
        .trim_end_matches('+');
    let mut total = 0.0;
    let mut seen = false;
    for part in cleaned.split_whitespace() {
        total += match part.split_once('/') {
            Some((num, den)) => {
                let num: f64 = num.parse().ok()?;
                let den: f64 = den.parse().ok()?;
                if den == 0.0 {
                    return None;
                }
                num / den
            }
            None => part.parse::<f64>().ok()?,
        };
        seen = true;
    }
    seen.then_some(total)
}

/// Metres to statute miles
pub fn meters_to_statute_miles(m: f64) -> f64 {
    m / 1609.344
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_conversion() {
        assert!((celsius_to_fahrenheit(0.0) - 32.0).abs() < 0.001);
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 0.001);
        assert!((celsius_to_fahrenheit(-40.0) + 40.0).abs() < 0.001);
        let back = convert(212.0, Unit::Fahrenheit, Unit::Celsius).unwrap();
        assert!((back - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_pressure_conversion() {
        assert!((inches_hg_to_hpa(29.90) - 1012.530_61).abs() < 0.001);
        assert!((hpa_to_inches_hg(1013.0) - 29.913_89).abs() < 0.001);
    }

    #[test]
    fn test_speed_conversion() {
        assert!((knots_to_mph(10.0) - 11.5078).abs() < 1e-9);
        let kt = convert(11.5078, Unit::MilesPerHour, Unit::Knots).unwrap();
        assert!((kt - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_unit_conversion() {
        assert_eq!(convert(25.0, Unit::Knots, Unit::Knots).unwrap(), 25.0);
    }

    #[test]
    fn test_mismatched_units_rejected() {
        assert!(matches!(
            convert(1.0, Unit::Knots, Unit::Celsius),
            Err(UnitError::ConversionNotSupported { .. })
        ));
        assert!("furlongs".parse::<Unit>().is_err());
        assert_eq!("INS".parse::<Unit>().unwrap(), Unit::InchesHg);
    }

    #[test]
    fn test_temperature_code_round_trip() {
        for t in -49..=0 {
            let code = format!("{:02}", 50 - t);
            assert_eq!(decode_temperature_code(&code), Some(t), "code {code}");
        }
    }

    #[test]
    fn test_temperature_code_rejects_out_of_band() {
        for code in ["00", "49", "07", "", "5", "100", "A5", "-5"] {
            assert_eq!(decode_temperature_code(code), None, "code {code:?}");
        }
    }

    #[test]
    fn test_visibility_values() {
        assert_eq!(visibility_statute_miles("10"), Some(10.0));
        assert_eq!(visibility_statute_miles("10+"), Some(10.0));
        assert_eq!(visibility_statute_miles("P6SM"), Some(6.0));
        assert_eq!(visibility_statute_miles("3/4"), Some(0.75));
        assert_eq!(visibility_statute_miles("1 1/2SM"), Some(1.5));
        assert_eq!(visibility_statute_miles("M1/4SM"), Some(0.25));
        assert_eq!(visibility_statute_miles("1/0"), None);
        assert_eq!(visibility_statute_miles(""), None);
        assert_eq!(visibility_statute_miles("XX"), None);
    }
}
