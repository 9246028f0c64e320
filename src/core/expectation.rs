//! Expectation table loading
//!
//! The table is comma-separated text: one header row, which is discarded,
//! followed by one row per test. Blank rows are skipped. Test identifiers
//! (first column) must be unique.

use super::record::{RecordError, TestRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Expectation loading errors
#[derive(Error, Debug)]
pub enum ExpectationError {
    /// Table could not be opened or read
    #[error("expectation source unavailable: {path}: {source}")]
    SourceUnavailable {
        /// Table path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A data row did not parse
    #[error("malformed expectation row {line}: {source}")]
    MalformedInput {
        /// One-based line number in the table
        line: usize,
        /// Parse failure
        #[source]
        source: RecordError,
    },

    /// Two rows share a test identifier
    #[error("duplicate test id {id} on row {line} (first defined on row {first_line})")]
    DuplicateId {
        /// Repeated identifier
        id: i64,
        /// One-based line of the repeat
        line: usize,
        /// One-based line of the first definition
        first_line: usize,
    },
}

/// Load expected records from a file
pub fn load_expectations(path: &Path) -> Result<Vec<TestRecord>, ExpectationError> {
    let content =
        std::fs::read_to_string(path).map_err(|source| ExpectationError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

    let expected = parse_expectations(&content)?;
    tracing::debug!(path = %path.display(), rows = expected.len(), "Loaded expectations");
    Ok(expected)
}

/// Parse expectation table content
pub fn parse_expectations(content: &str) -> Result<Vec<TestRecord>, ExpectationError> {
    let mut expected = Vec::new();
    let mut seen: HashMap<i64, usize> = HashMap::new();

    for (index, row) in content.lines().enumerate().skip(1) {
        if row.trim().is_empty() {
            continue;
        }
        let line = index + 1;
        let record = TestRecord::parse(row)
            .map_err(|source| ExpectationError::MalformedInput { line, source })?;
        if let Some(id) = record.id() {
            if let Some(&first_line) = seen.get(&id) {
                return Err(ExpectationError::DuplicateId {
                    id,
                    line,
                    first_line,
                });
            }
            seen.insert(id, line);
        }
        expected.push(record);
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_header_is_discarded() {
        let expected = parse_expectations("id,a,b\n1,10,20\n2,5,5\n").unwrap();
        assert_eq!(
            expected,
            vec![TestRecord::new(vec![1, 10, 20]), TestRecord::new(vec![2, 5, 5])]
        );
    }

    #[test]
    fn test_header_only() {
        assert!(parse_expectations("id,value\n").unwrap().is_empty());
        assert!(parse_expectations("").unwrap().is_empty());
    }

    #[test]
    fn test_blank_rows_and_crlf() {
        let expected = parse_expectations("id,v\r\n1,2\r\n\r\n3,4\r\n").unwrap();
        assert_eq!(expected.len(), 2);
        assert_eq!(expected[1].fields(), &[3, 4]);
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let err = parse_expectations("id,v\n1,2\n2,x\n").unwrap_err();
        match err {
            ExpectationError::MalformedInput { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = parse_expectations("id,v\n1,1\n2,2\n1,2\n").unwrap_err();
        assert!(matches!(
            err,
            ExpectationError::DuplicateId {
                id: 1,
                line: 4,
                first_line: 2
            }
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "test,expected").unwrap();
        writeln!(file, "1,42").unwrap();

        let expected = load_expectations(file.path()).unwrap();
        assert_eq!(expected, vec![TestRecord::new(vec![1, 42])]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_expectations(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, ExpectationError::SourceUnavailable { .. }));
    }
}
