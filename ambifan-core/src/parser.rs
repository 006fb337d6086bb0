//! Sensor line parser
//!
//! Decodes lines of the form `H:90.0,T:27.9,G:169` into a [`PartialReading`].
//!
//! The parser is strict on the number of comma separated fields and lenient on
//! their content: an unknown prefix or an unparsable number only drops that
//! field, the other fields of the same line are still applied.

use tracing::{debug, warn};

use crate::error::{AmbifanError, Result};
use crate::types::{clamp_to_limit, Limits, PartialReading, SensorField};

/// Number of comma separated fields in a sensor line.
pub const FIELD_COUNT: usize = 3;

/// Default minimum trimmed line length.
pub const DEFAULT_MIN_LINE_LENGTH: usize = 10;

/// Result of parsing one line.
#[derive(Debug, Default)]
pub struct ParsedLine {
    /// Fields that decoded successfully, already clamped
    pub reading: PartialReading,
    /// Non-fatal per-field problems, in line order
    pub skipped: Vec<AmbifanError>,
}

/// Parse one raw sensor line.
///
/// Returns `MalformedLine` for empty or too short lines and `WrongFieldCount`
/// unless the line splits into exactly three fields. Both leave the caller's
/// state untouched. Field level failures are collected in
/// [`ParsedLine::skipped`].
pub fn parse_line(line: &str, limits: &Limits, min_len: usize) -> Result<ParsedLine> {
    let line = line.trim();

    if line.is_empty() || line.chars().count() < min_len {
        debug!("Rejecting short line: {:?}", line);
        return Err(AmbifanError::MalformedLine(line.to_string()));
    }

    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != FIELD_COUNT {
        warn!(
            "Expected {} fields, found {}: {:?}",
            FIELD_COUNT,
            parts.len(),
            line
        );
        return Err(AmbifanError::WrongFieldCount { found: parts.len() });
    }

    let mut parsed = ParsedLine::default();

    for part in parts {
        let part = part.trim();

        let Some((field, raw)) = split_prefix(part) else {
            warn!("Unknown field prefix: {:?}", part);
            parsed
                .skipped
                .push(AmbifanError::UnknownFieldPrefix(part.to_string()));
            continue;
        };

        match parse_value(raw) {
            Some(value) => {
                let clamped = clamp_to_limit(value, limits.limit_for(field));
                parsed.reading.set(field, clamped);
            }
            None => {
                debug!("Skipping unparsable {} value {:?}", field, raw);
                parsed.skipped.push(AmbifanError::FieldParseFailure {
                    field: field.name(),
                    value: raw.to_string(),
                });
            }
        }
    }

    Ok(parsed)
}

/// Match the field prefix and return the remaining text.
fn split_prefix(part: &str) -> Option<(SensorField, &str)> {
    SensorField::ALL
        .iter()
        .find_map(|field| part.strip_prefix(field.prefix()).map(|rest| (*field, rest)))
}

/// Locale independent decimal parse. Rejects NaN so the clamp invariant holds.
fn parse_value(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Reading;

    fn limits() -> Limits {
        Limits {
            max_temperature: 50.0,
            max_gas: 1000.0,
        }
    }

    fn parse(line: &str) -> Result<ParsedLine> {
        parse_line(line, &limits(), DEFAULT_MIN_LINE_LENGTH)
    }

    #[test]
    fn test_parse_valid_line() {
        let parsed = parse("H:90.0,T:27.9,G:169").unwrap();

        assert_eq!(parsed.reading.humidity, Some(90.0));
        assert_eq!(parsed.reading.temperature, Some(27.9));
        assert_eq!(parsed.reading.gas, Some(169.0));
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_parse_values_read_back_unchanged() {
        for (h, t, g) in [(0.0f32, 0.0f32, 0.0f32), (45.5, 12.25, 300.0), (100.0, 50.0, 1000.0)] {
            let line = format!("H:{},T:{},G:{}", h, t, g);
            let mut reading = Reading::default();
            reading.merge(&parse(&line).unwrap().reading);

            assert_eq!(reading.humidity, h, "line {}", line);
            assert_eq!(reading.temperature, t, "line {}", line);
            assert_eq!(reading.gas, g, "line {}", line);
        }
    }

    #[test]
    fn test_parse_any_field_order() {
        let parsed = parse("G:5,H:40.0,T:20.5").unwrap();

        assert_eq!(parsed.reading.gas, Some(5.0));
        assert_eq!(parsed.reading.humidity, Some(40.0));
        assert_eq!(parsed.reading.temperature, Some(20.5));
    }

    #[test]
    fn test_parse_clamps_humidity() {
        let parsed = parse("H:150.0,T:10,G:5").unwrap();
        assert_eq!(parsed.reading.humidity, Some(100.0));
    }

    #[test]
    fn test_parse_clamps_configured_limits() {
        let parsed = parse("H:-5.0,T:80,G:5000").unwrap();

        assert_eq!(parsed.reading.humidity, Some(0.0));
        assert_eq!(parsed.reading.temperature, Some(50.0));
        assert_eq!(parsed.reading.gas, Some(1000.0));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let parsed = parse("  H: 50.0 , T:21.0 ,G:7 \r\n").unwrap();

        assert_eq!(parsed.reading.humidity, Some(50.0));
        assert_eq!(parsed.reading.temperature, Some(21.0));
        assert_eq!(parsed.reading.gas, Some(7.0));
    }

    #[test]
    fn test_parse_failure_keeps_previous_value() {
        let mut reading = Reading::default();
        reading.merge(&parse("H:50.0,T:10,G:5").unwrap().reading);

        let second = parse("H:-,T:20,G:5").unwrap();
        reading.merge(&second.reading);

        assert_eq!(reading.humidity, 50.0);
        assert_eq!(reading.temperature, 20.0);
        assert_eq!(second.skipped.len(), 1);
        assert!(matches!(
            &second.skipped[0],
            AmbifanError::FieldParseFailure { field: "humidity", value } if value == "-"
        ));
    }

    #[test]
    fn test_parse_unknown_prefix_is_skipped() {
        let parsed = parse("H:50.0,X:10.0,G:5").unwrap();

        assert_eq!(parsed.reading.humidity, Some(50.0));
        assert_eq!(parsed.reading.temperature, None);
        assert_eq!(parsed.reading.gas, Some(5.0));
        assert!(matches!(
            &parsed.skipped[0],
            AmbifanError::UnknownFieldPrefix(p) if p == "X:10.0"
        ));
    }

    #[test]
    fn test_parse_wrong_field_count() {
        let result = parse("H:50.0,T:10.0");
        assert!(matches!(
            result,
            Err(AmbifanError::WrongFieldCount { found: 2 })
        ));

        let result = parse("H:50.0,T:10.0,G:5,X:1");
        assert!(matches!(
            result,
            Err(AmbifanError::WrongFieldCount { found: 4 })
        ));
    }

    #[test]
    fn test_parse_short_line_rejected() {
        assert!(matches!(parse(""), Err(AmbifanError::MalformedLine(_))));
        assert!(matches!(parse("   "), Err(AmbifanError::MalformedLine(_))));
        assert!(matches!(parse("H:1,T:2"), Err(AmbifanError::MalformedLine(_))));
    }

    #[test]
    fn test_parse_min_length_is_configurable() {
        let parsed = parse_line("H:1,T:2,G:3", &limits(), 0).unwrap();
        assert_eq!(parsed.reading.gas, Some(3.0));

        let result = parse_line("H:1,T:2,G:3", &limits(), 20);
        assert!(matches!(result, Err(AmbifanError::MalformedLine(_))));
    }

    #[test]
    fn test_parse_rejects_locale_decimal_comma() {
        // A comma decimal separator changes the field count.
        let result = parse("H:50,5,T:10,G:5");
        assert!(matches!(
            result,
            Err(AmbifanError::WrongFieldCount { found: 4 })
        ));
    }

    #[test]
    fn test_parse_rejects_nan() {
        let parsed = parse("H:NaN,T:10,G:5").unwrap();
        assert_eq!(parsed.reading.humidity, None);
        assert_eq!(parsed.skipped.len(), 1);
    }

    #[test]
    fn test_parse_all_fields_bad_yields_empty_reading() {
        let parsed = parse("H:abc,T:def,G:ghi").unwrap();
        assert!(parsed.reading.is_empty());
        assert_eq!(parsed.skipped.len(), 3);
    }
}
