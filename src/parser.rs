//! Source line parser
//!
//! Turns one raw delimited line into a structured [`Record`]. The format
//! is three fields separated by a fixed delimiter:
//!
//! ```text
//! <city><delim><date><delim><temperature>
//! ```
//!
//! The date field is any string whose leading segment before a `-` is
//! taken as the year; the temperature must parse as an `f64`. No header
//! line exists, so every line is expected to be a record.
//!
//! # Example
//!
//! ```rust
//! use citytemp::parser::RecordParser;
//!
//! let parser = RecordParser::new();
//! let record = parser.parse_line("Gdansk;2019-01-01;10.0").unwrap();
//! assert_eq!(record.city, "Gdansk");
//! assert_eq!(record.year, "2019");
//! ```

use crate::error::RecordParseError;
use crate::types::Record;

/// Number of fields a well-formed line carries
const FIELD_COUNT: usize = 3;

/// Stateless parser for one source file line.
#[derive(Debug, Clone)]
pub struct RecordParser {
    delimiter: char,
}

impl RecordParser {
    /// Create a parser with the default `;` field delimiter
    pub fn new() -> Self {
        Self { delimiter: ';' }
    }

    /// Create a parser with a custom field delimiter
    pub fn with_delimiter(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Parse a single line into a [`Record`].
    ///
    /// Fails when the line does not split into exactly three fields,
    /// the city is empty, the date carries no year component, or the
    /// temperature does not parse as a floating-point number.
    pub fn parse_line(&self, line: &str) -> Result<Record, RecordParseError> {
        let fields: Vec<&str> = line.split(self.delimiter).collect();
        if fields.len() != FIELD_COUNT {
            return Err(RecordParseError::FieldCount {
                expected: FIELD_COUNT,
                actual: fields.len(),
            });
        }

        let city = fields[0];
        if city.trim().is_empty() {
            return Err(RecordParseError::EmptyCity);
        }

        // Leading segment of the date, up to the first '-'. split always
        // yields at least one segment.
        let year = fields[1].split('-').next().unwrap_or_default();
        if year.is_empty() {
            return Err(RecordParseError::EmptyYear {
                value: fields[1].to_string(),
            });
        }

        let temperature: f64 =
            fields[2]
                .trim()
                .parse()
                .map_err(|_| RecordParseError::InvalidTemperature {
                    value: fields[2].to_string(),
                })?;

        Ok(Record::new(city, year, temperature))
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        let parser = RecordParser::new();
        let record = parser.parse_line("Gdansk;2019-06-01;20.5").unwrap();

        assert_eq!(record.city, "Gdansk");
        assert_eq!(record.year, "2019");
        assert_eq!(record.temperature, 20.5);
    }

    #[test]
    fn test_parse_negative_temperature() {
        let parser = RecordParser::new();
        let record = parser.parse_line("Warsaw;2020-01-15;-12.3").unwrap();
        assert_eq!(record.temperature, -12.3);
    }

    #[test]
    fn test_city_preserved_verbatim() {
        let parser = RecordParser::new();
        let record = parser.parse_line(" Gdansk ;2019-01-01;1.0").unwrap();
        // City identifiers are whitespace-sensitive as they appear in
        // the source file.
        assert_eq!(record.city, " Gdansk ");
    }

    #[test]
    fn test_year_is_leading_date_segment() {
        let parser = RecordParser::new();

        let record = parser.parse_line("Gdansk;2019-01-01;1.0").unwrap();
        assert_eq!(record.year, "2019");

        // A date without '-' is taken whole as the year segment.
        let record = parser.parse_line("Gdansk;2019;1.0").unwrap();
        assert_eq!(record.year, "2019");
    }

    #[test]
    fn test_too_few_fields() {
        let parser = RecordParser::new();
        let err = parser.parse_line("Gdansk;2019-01-01").unwrap_err();
        assert_eq!(
            err,
            RecordParseError::FieldCount {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_too_many_fields() {
        let parser = RecordParser::new();
        let err = parser.parse_line("Gdansk;2019-01-01;1.0;extra").unwrap_err();
        assert_eq!(
            err,
            RecordParseError::FieldCount {
                expected: 3,
                actual: 4
            }
        );
    }

    #[test]
    fn test_invalid_temperature() {
        let parser = RecordParser::new();
        let err = parser.parse_line("Gdansk;2019-01-01;warm").unwrap_err();
        assert_eq!(
            err,
            RecordParseError::InvalidTemperature {
                value: "warm".to_string()
            }
        );
    }

    #[test]
    fn test_empty_city() {
        let parser = RecordParser::new();
        let err = parser.parse_line(";2019-01-01;1.0").unwrap_err();
        assert_eq!(err, RecordParseError::EmptyCity);
    }

    #[test]
    fn test_empty_year() {
        let parser = RecordParser::new();
        let err = parser.parse_line("Gdansk;-01-01;1.0").unwrap_err();
        assert!(matches!(err, RecordParseError::EmptyYear { .. }));
    }

    #[test]
    fn test_empty_line() {
        let parser = RecordParser::new();
        let err = parser.parse_line("").unwrap_err();
        assert!(matches!(err, RecordParseError::FieldCount { actual: 1, .. }));
    }

    #[test]
    fn test_custom_delimiter() {
        let parser = RecordParser::with_delimiter(',');
        let record = parser.parse_line("Gdansk,2019-01-01,10.0").unwrap();
        assert_eq!(record.city, "Gdansk");
        assert_eq!(record.temperature, 10.0);
    }
}
