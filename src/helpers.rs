//! Shared helpers: Decimal ↔ f64 conversion, comma-separated query values,
//! and compass labels for wind/swell directions.
//!
//! Forecast values are stored as NUMERIC rounded to one decimal place; a
//! surfer-submitted 1.83 m swell is persisted as 1.8.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 8-point compass labels, clockwise from north.
const CARDINAL_DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Convert an f64 to Decimal, rounded to 1 decimal place.
///
/// Returns `Decimal::ZERO` for non-finite inputs (NaN, ±Inf).
pub(crate) fn f64_to_decimal_1dp(v: f64) -> Decimal {
    if !v.is_finite() {
        tracing::warn!(
            "f64_to_decimal_1dp received non-finite value {}, defaulting to 0",
            v
        );
        return Decimal::ZERO;
    }
    Decimal::from_str_exact(&format!("{:.1}", v)).unwrap_or_default()
}

/// Convert a Decimal to f64, defaulting to 0.0 for values that can't be represented.
pub(crate) fn dec_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Split a comma-separated query value into its non-empty, trimmed parts.
///
/// `None`, `""` and `",,"` all yield an empty list.
pub(crate) fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Map a direction in degrees to its 8-point compass label.
///
/// Degrees outside 0..360 wrap around; non-finite input yields "N/A".
pub(crate) fn degrees_to_cardinal(degrees: f64) -> &'static str {
    if !degrees.is_finite() {
        return "N/A";
    }
    let normalized = degrees.rem_euclid(360.0);
    let index = (normalized / 45.0).round() as usize % CARDINAL_DIRECTIONS.len();
    CARDINAL_DIRECTIONS[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_f64_to_decimal_1dp_rounds() {
        assert_eq!(f64_to_decimal_1dp(1.83), Decimal::from_str("1.8").unwrap());
        assert_eq!(f64_to_decimal_1dp(12.46), Decimal::from_str("12.5").unwrap());
    }

    #[test]
    fn test_f64_to_decimal_1dp_non_finite() {
        assert_eq!(f64_to_decimal_1dp(f64::NAN), Decimal::ZERO);
        assert_eq!(f64_to_decimal_1dp(f64::INFINITY), Decimal::ZERO);
    }

    #[test]
    fn test_dec_to_f64() {
        let d = Decimal::from_str("3.4").unwrap();
        assert!((dec_to_f64(d) - 3.4).abs() < 1e-10);
        assert_eq!(dec_to_f64(Decimal::ZERO), 0.0);
    }

    #[test]
    fn test_split_csv() {
        assert!(split_csv(None).is_empty());
        assert!(split_csv(Some("")).is_empty());
        assert!(split_csv(Some(",,")).is_empty());
        assert_eq!(
            split_csv(Some("Uluwatu, Padang Padang,,Keramas")),
            vec!["Uluwatu", "Padang Padang", "Keramas"]
        );
    }

    #[test]
    fn test_degrees_to_cardinal() {
        assert_eq!(degrees_to_cardinal(0.0), "N");
        assert_eq!(degrees_to_cardinal(44.0), "NE");
        assert_eq!(degrees_to_cardinal(180.0), "S");
        assert_eq!(degrees_to_cardinal(225.0), "SW");
        assert_eq!(degrees_to_cardinal(350.0), "N");
        assert_eq!(degrees_to_cardinal(-90.0), "W");
        assert_eq!(degrees_to_cardinal(f64::NAN), "N/A");
    }
}
