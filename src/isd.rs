//! NOAA ISD mandatory-field decoding
//!
//! ISD stores each measurement as a signed integer scaled by ten followed by a
//! quality code, e.g. `+0056,1` for 5.6 °C. A reserved sentinel (`+9999` for
//! temperatures, `99999` for pressure) marks "no observation". Decoding lives
//! here so the contract can be tested without any file I/O.

use crate::constants::{ISD_SCALE, sentinels};

/// Decode a raw scaled value, mapping the sentinel (and its fractions) to missing
pub fn decode(raw: f64, sentinel: i64, scale: f64) -> Option<f64> {
    if !raw.is_finite() || raw.abs().trunc() == sentinel as f64 {
        return None;
    }
    Some(raw / scale)
}

/// Decode an ISD field such as `+0056,1`; the quality code after the comma is ignored
pub fn decode_field(text: &str, sentinel: i64) -> Option<f64> {
    let value = text.split(',').next()?.trim();
    if value.is_empty() {
        return None;
    }
    let raw = value.strip_prefix('+').unwrap_or(value).parse::<f64>().ok()?;
    decode(raw, sentinel, ISD_SCALE)
}

/// Decode a TMP field to degrees Celsius
pub fn decode_air_temperature(text: &str) -> Option<f64> {
    decode_field(text, sentinels::AIR_TEMPERATURE)
}

/// Decode a DEW field to degrees Celsius
pub fn decode_dew_point(text: &str) -> Option<f64> {
    decode_field(text, sentinels::DEW_POINT)
}

/// Decode an SLP field to hectopascals
pub fn decode_sea_level_pressure(text: &str) -> Option<f64> {
    decode_field(text, sentinels::SEA_LEVEL_PRESSURE)
}

/// Parse an already-decoded numeric field; anything non-numeric is missing
pub fn parse_measurement(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_scales_by_ten() {
        assert_eq!(decode(56.0, 9999, 10.0), Some(5.6));
        assert_eq!(decode(-12.0, 9999, 10.0), Some(-1.2));
        assert_eq!(decode(0.0, 9999, 10.0), Some(0.0));
    }

    #[test]
    fn test_temperature_sentinel_is_missing() {
        assert_eq!(decode(9999.0, 9999, 10.0), None);
        assert_eq!(decode(9999.5, 9999, 10.0), None);
        assert_eq!(decode(9999.9, 9999, 10.0), None);
        assert_eq!(decode_air_temperature("+9999,9"), None);
        assert_eq!(decode_air_temperature("9999"), None);
    }

    #[test]
    fn test_pressure_sentinel_is_missing() {
        assert_eq!(decode_sea_level_pressure("99999,9"), None);
        assert_eq!(decode_sea_level_pressure("10132,1"), Some(1013.2));
    }

    #[test]
    fn test_pressure_scale_is_not_a_temperature_sentinel() {
        // 999.9 hPa is a legitimate (deep low) pressure reading
        assert_eq!(decode_sea_level_pressure("09999,1"), Some(999.9));
    }

    #[test]
    fn test_decode_field_formats() {
        assert_eq!(decode_air_temperature("+0056,1"), Some(5.6));
        assert_eq!(decode_air_temperature("-0023,5"), Some(-2.3));
        assert_eq!(decode_dew_point("+0300,1"), Some(30.0));
        assert_eq!(decode_air_temperature(""), None);
        assert_eq!(decode_air_temperature(",1"), None);
        assert_eq!(decode_air_temperature("abc,1"), None);
    }

    #[test]
    fn test_parse_measurement() {
        assert_eq!(parse_measurement(" 23.5 "), Some(23.5));
        assert_eq!(parse_measurement("+0056,1"), None);
        assert_eq!(parse_measurement("NaN"), None);
        assert_eq!(parse_measurement(""), None);
    }
}
