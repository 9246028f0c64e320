//! Test result records
//!
//! A record is one line of comma-separated integers: the first field is the
//! test identifier, the rest are the values observed (or expected) for it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Record parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Line had no fields at all
    #[error("empty record")]
    Empty,

    /// A field did not parse as an integer
    #[error("field {index} is not an integer: {value:?}")]
    InvalidField {
        /// Zero-based field position
        index: usize,
        /// Offending text
        value: String,
    },
}

/// An ordered list of integer fields, identifier first
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestRecord(Vec<i64>);

impl TestRecord {
    /// Create a record from raw fields
    pub fn new(fields: Vec<i64>) -> Self {
        Self(fields)
    }

    /// Parse a comma-separated line of integers
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(RecordError::Empty);
        }

        line.split(',')
            .enumerate()
            .map(|(index, field)| {
                let field = field.trim();
                field.parse::<i64>().map_err(|_| RecordError::InvalidField {
                    index,
                    value: field.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Test identifier (first field)
    pub fn id(&self) -> Option<i64> {
        self.0.first().copied()
    }

    /// Values after the identifier
    pub fn values(&self) -> &[i64] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// All fields, identifier included
    pub fn fields(&self) -> &[i64] {
        &self.0
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Has no fields?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i64>> for TestRecord {
    fn from(fields: Vec<i64>) -> Self {
        Self(fields)
    }
}

impl fmt::Display for TestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let record = TestRecord::parse("1,10,20").unwrap();
        assert_eq!(record.fields(), &[1, 10, 20]);
        assert_eq!(record.id(), Some(1));
        assert_eq!(record.values(), &[10, 20]);
    }

    #[test]
    fn test_parse_tolerates_padding() {
        let record = TestRecord::parse(" 2, 5 ,5\r").unwrap();
        assert_eq!(record.fields(), &[2, 5, 5]);
    }

    #[test]
    fn test_parse_single_field() {
        let record = TestRecord::parse("7").unwrap();
        assert_eq!(record.id(), Some(7));
        assert!(record.values().is_empty());
    }

    #[test]
    fn test_parse_rejects_text_field() {
        let err = TestRecord::parse("3,abc,5").unwrap_err();
        assert_eq!(
            err,
            RecordError::InvalidField {
                index: 1,
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_empty_field() {
        assert!(matches!(
            TestRecord::parse("3,,5"),
            Err(RecordError::InvalidField { index: 1, .. })
        ));
        assert_eq!(TestRecord::parse("   "), Err(RecordError::Empty));
    }

    #[test]
    fn test_display() {
        let record = TestRecord::new(vec![4, -1, 0]);
        assert_eq!(record.to_string(), "4,-1,0");
    }

    #[test]
    fn test_serializes_as_array() {
        let record = TestRecord::new(vec![1, 2]);
        assert_eq!(serde_json::to_string(&record).unwrap(), "[1,2]");
    }
}
