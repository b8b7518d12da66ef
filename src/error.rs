//! Error types for the cache pipeline

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error while reading the source file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A source line failed to parse
    #[error("Parse error: {0}")]
    Parse(#[from] RecordParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Errors produced while parsing one source line.
///
/// During a reload these never abort the pass: malformed lines are
/// skipped with a logged diagnostic and the remaining lines continue
/// to be aggregated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordParseError {
    /// The line did not split into exactly the expected number of fields
    #[error("Expected {expected} fields, got {actual}")]
    FieldCount {
        /// Number of fields a well-formed line carries
        expected: usize,
        /// Number of fields actually found
        actual: usize,
    },

    /// The temperature field did not parse as a floating-point number
    #[error("Invalid temperature: {value}")]
    InvalidTemperature {
        /// The offending field content
        value: String,
    },

    /// The city field was empty or whitespace-only
    #[error("Empty city field")]
    EmptyCity,

    /// The date field carried no year component
    #[error("Empty year component in date field: {value}")]
    EmptyYear {
        /// The offending field content
        value: String,
    },
}

/// Caller-visible errors of the lookup surface.
///
/// Background reload failures are never surfaced here; they affect only
/// the freshness of previously loaded data, not its availability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The supplied city identifier was empty or whitespace-only
    #[error("City cannot be empty")]
    InvalidCity,

    /// The city is not present in the current cache. A normal, expected
    /// outcome, not a fault.
    #[error("Data for city {0} was not found")]
    CityNotFound(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = RecordParseError::FieldCount {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Expected 3 fields, got 2");

        let err = RecordParseError::InvalidTemperature {
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid temperature: abc");
    }

    #[test]
    fn test_lookup_error_display() {
        let err = LookupError::CityNotFound("Londyn".to_string());
        assert_eq!(err.to_string(), "Data for city Londyn was not found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
