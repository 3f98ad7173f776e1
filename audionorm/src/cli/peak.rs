use std::fmt;

/// Parse a target peak argument into a validated `f32`.
///
/// Accepts any decimal the standard float parser does (`0.9`, `1`, `.5`,
/// `1e-1`), then requires the value to be positive and finite. Values above
/// 1.0 are allowed; the output container is float WAV, so they only clip
/// once converted back to PCM downstream.
pub fn parse_peak(value: &str) -> Result<f32, PeakParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PeakParseError::Empty);
    }

    let parsed: f32 = trimmed
        .parse()
        .map_err(|_| PeakParseError::NotANumber(value.to_owned()))?;

    if parsed.is_nan() || parsed.is_infinite() {
        return Err(PeakParseError::NotFinite(value.to_owned()));
    }
    if parsed <= 0.0 {
        return Err(PeakParseError::NonPositive(parsed));
    }

    Ok(parsed)
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeakParseError {
    Empty,
    NotANumber(String),
    NotFinite(String),
    NonPositive(f32),
}

impl std::error::Error for PeakParseError {}

impl fmt::Display for PeakParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeakParseError::Empty => write!(f, "target peak cannot be empty"),
            PeakParseError::NotANumber(value) => {
                write!(f, "target peak '{value}' is not a number")
            }
            PeakParseError::NotFinite(value) => {
                write!(f, "target peak '{value}' must be finite")
            }
            PeakParseError::NonPositive(value) => {
                write!(f, "target peak must be greater than zero, got {value}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_decimals() {
        assert_eq!(parse_peak("1.0").unwrap(), 1.0);
        assert_eq!(parse_peak("0.9").unwrap(), 0.9);
        assert_eq!(parse_peak(".5").unwrap(), 0.5);
        assert_eq!(parse_peak("1").unwrap(), 1.0);
    }

    #[test]
    fn accepts_scientific_notation_and_whitespace() {
        assert_eq!(parse_peak("1e-1").unwrap(), 0.1);
        assert_eq!(parse_peak("  0.75  ").unwrap(), 0.75);
    }

    #[test]
    fn accepts_values_above_full_scale() {
        assert_eq!(parse_peak("1.5").unwrap(), 1.5);
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(parse_peak("   "), Err(PeakParseError::Empty));
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert!(matches!(
            parse_peak("loud"),
            Err(PeakParseError::NotANumber(_))
        ));
    }

    #[test]
    fn rejects_zero_and_negative_values() {
        assert_eq!(parse_peak("0"), Err(PeakParseError::NonPositive(0.0)));
        assert_eq!(parse_peak("-0.9"), Err(PeakParseError::NonPositive(-0.9)));
    }

    #[test]
    fn rejects_nan_and_infinity() {
        assert!(matches!(
            parse_peak("NaN"),
            Err(PeakParseError::NotFinite(_))
        ));
        assert!(matches!(
            parse_peak("inf"),
            Err(PeakParseError::NotFinite(_))
        ));
    }
}
