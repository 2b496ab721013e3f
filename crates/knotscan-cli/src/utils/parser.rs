use knotscan::core::models::chain::Terminus;
use knotscan::core::models::core_range::KnotCore;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid terminus '{0}'. Expected 'n' or 'c'.")]
    InvalidTerminus(String),

    #[error("Invalid core range '{0}'. Expected 'BEGIN-END' (e.g., '12-95').")]
    InvalidCoreRange(String),

    #[error("Core range '{0}' ends before it begins.")]
    ReversedCoreRange(String),

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),
}

pub fn parse_terminus(value: &str) -> Result<Terminus, ParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "n" | "n-terminus" => Ok(Terminus::N),
        "c" | "c-terminus" => Ok(Terminus::C),
        _ => Err(ParseError::InvalidTerminus(value.to_string())),
    }
}

/// Parses `BEGIN-END` or `BEGIN,END`.
pub fn parse_core_range(value: &str) -> Result<KnotCore, ParseError> {
    let invalid = || ParseError::InvalidCoreRange(value.to_string());
    let (begin, end) = value
        .split_once(['-', ','])
        .ok_or_else(invalid)?;
    let begin: usize = begin.trim().parse().map_err(|_| invalid())?;
    let end: usize = end.trim().parse().map_err(|_| invalid())?;
    core_from_bounds(begin, end).ok_or_else(|| ParseError::ReversedCoreRange(value.to_string()))
}

pub fn core_from_bounds(begin: usize, end: usize) -> Option<KnotCore> {
    (begin <= end).then(|| KnotCore::new(begin, end))
}

pub fn parse_assignment(kv_pair: &str) -> Result<(&str, &str), ParseError> {
    kv_pair
        .split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| ParseError::InvalidAssignment(kv_pair.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminus_accepts_short_and_long_names() {
        assert_eq!(parse_terminus("N"), Ok(Terminus::N));
        assert_eq!(parse_terminus("c-terminus"), Ok(Terminus::C));
        assert_eq!(
            parse_terminus("x"),
            Err(ParseError::InvalidTerminus("x".to_string()))
        );
    }

    #[test]
    fn core_range_accepts_dash_and_comma() {
        assert_eq!(parse_core_range("12-95"), Ok(KnotCore::new(12, 95)));
        assert_eq!(parse_core_range(" 3 , 40 "), Ok(KnotCore::new(3, 40)));
    }

    #[test]
    fn core_range_rejects_malformed_input() {
        assert!(matches!(
            parse_core_range("12"),
            Err(ParseError::InvalidCoreRange(_))
        ));
        assert!(matches!(
            parse_core_range("a-b"),
            Err(ParseError::InvalidCoreRange(_))
        ));
        assert!(matches!(
            parse_core_range("95-12"),
            Err(ParseError::ReversedCoreRange(_))
        ));
    }

    #[test]
    fn assignment_splits_on_the_first_equals_sign() {
        assert_eq!(
            parse_assignment("oracle.program=/opt/a=b"),
            Ok(("oracle.program", "/opt/a=b"))
        );
        assert!(parse_assignment("detection.scope").is_err());
        assert!(parse_assignment("=3").is_err());
    }
}
