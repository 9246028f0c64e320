//! Result verification
//!
//! Pairs received records with expected ones and decides pass/fail per test.
//! The total always counts the expected tests, so a device that reports too
//! few results shows up as a deficit in the aggregate figures.

use super::reader::MalformedLine;
use super::record::TestRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How received records are matched to expected ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairingMode {
    /// Nth received against Nth expected; surplus on either side is dropped
    #[default]
    Positional,
    /// Match on test identifier; reports missing and unexpected tests
    ById,
}

impl std::str::FromStr for PairingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "positional" => Ok(Self::Positional),
            "by-id" | "by_id" | "id" => Ok(Self::ById),
            other => Err(format!("unknown pairing mode: {other}")),
        }
    }
}

/// Verdict for one paired test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Test identifier, taken from the expected record
    pub test_id: i64,
    /// Record received from the device
    pub actual: TestRecord,
    /// Record from the expectation table
    pub expected: TestRecord,
    /// Records identical, identifier included
    pub passed: bool,
}

/// Verification result for a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Per-test verdicts in pairing order
    pub outcomes: Vec<VerificationOutcome>,
    /// Number of passing outcomes
    pub passed_count: usize,
    /// Number of expected tests
    pub total_count: usize,
    /// Expected tests with no paired result
    pub missing: Vec<i64>,
    /// Received records that matched no expected test
    pub unexpected: Vec<TestRecord>,
    /// Result lines the device sent that could not be parsed
    pub malformed: Vec<MalformedLine>,
}

impl RunSummary {
    /// Every expected test passed?
    pub fn all_passed(&self) -> bool {
        self.passed_count == self.total_count
    }

    /// Number of failing outcomes
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count
    }

    /// Attach malformed-line warnings from the reader
    #[must_use]
    pub fn with_malformed(mut self, malformed: Vec<MalformedLine>) -> Self {
        self.malformed = malformed;
        self
    }
}

fn test_id(record: &TestRecord) -> i64 {
    record.id().unwrap_or_default()
}

/// Verify received records against expectations
pub fn verify(received: &[TestRecord], expected: &[TestRecord], mode: PairingMode) -> RunSummary {
    let summary = match mode {
        PairingMode::Positional => verify_positional(received, expected),
        PairingMode::ById => verify_by_id(received, expected),
    };

    tracing::debug!(
        passed = summary.passed_count,
        total = summary.total_count,
        missing = summary.missing.len(),
        unexpected = summary.unexpected.len(),
        "Verification complete"
    );
    summary
}

fn verify_positional(received: &[TestRecord], expected: &[TestRecord]) -> RunSummary {
    let outcomes: Vec<_> = received
        .iter()
        .zip(expected)
        .map(|(actual, expected)| outcome(actual, expected))
        .collect();

    let missing = expected
        .iter()
        .skip(received.len())
        .map(test_id)
        .collect();
    let unexpected = received.iter().skip(expected.len()).cloned().collect();

    summarize(outcomes, expected.len(), missing, unexpected)
}

fn verify_by_id(received: &[TestRecord], expected: &[TestRecord]) -> RunSummary {
    let mut by_id: HashMap<i64, &TestRecord> = HashMap::new();
    let mut unexpected = Vec::new();
    let expected_ids: HashSet<i64> = expected.iter().map(test_id).collect();

    for record in received {
        let id = test_id(record);
        if expected_ids.contains(&id) && !by_id.contains_key(&id) {
            by_id.insert(id, record);
        } else {
            unexpected.push(record.clone());
        }
    }

    let mut outcomes = Vec::new();
    let mut missing = Vec::new();
    let mut used = HashSet::new();

    for expected_record in expected {
        let id = test_id(expected_record);
        match by_id.get(&id) {
            Some(actual) if used.insert(id) => outcomes.push(outcome(actual, expected_record)),
            _ => missing.push(id),
        }
    }

    summarize(outcomes, expected.len(), missing, unexpected)
}

fn outcome(actual: &TestRecord, expected: &TestRecord) -> VerificationOutcome {
    VerificationOutcome {
        test_id: test_id(expected),
        actual: actual.clone(),
        expected: expected.clone(),
        passed: actual == expected,
    }
}

fn summarize(
    outcomes: Vec<VerificationOutcome>,
    total_count: usize,
    missing: Vec<i64>,
    unexpected: Vec<TestRecord>,
) -> RunSummary {
    let passed_count = outcomes.iter().filter(|o| o.passed).count();
    RunSummary {
        outcomes,
        passed_count,
        total_count,
        missing,
        unexpected,
        malformed: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(rows: &[&[i64]]) -> Vec<TestRecord> {
        rows.iter().map(|r| TestRecord::new(r.to_vec())).collect()
    }

    #[test]
    fn test_all_match() {
        let expected = records(&[&[1, 10, 20], &[2, 5, 5]]);
        let summary = verify(&expected, &expected, PairingMode::Positional);
        assert_eq!(summary.passed_count, 2);
        assert_eq!(summary.total_count, 2);
        assert!(summary.all_passed());
        assert!(summary.missing.is_empty());
    }

    #[test]
    fn test_field_mismatch_fails_that_test() {
        let expected = records(&[&[1, 10, 20], &[2, 5, 5]]);
        let received = records(&[&[1, 10, 20], &[2, 5, 6]]);
        let summary = verify(&received, &expected, PairingMode::Positional);
        assert_eq!(summary.passed_count, 1);
        assert!(!summary.outcomes[1].passed);
        assert_eq!(summary.outcomes[1].test_id, 2);
        assert_eq!(summary.failed_count(), 1);
    }

    #[test]
    fn test_length_mismatch_fails() {
        let expected = records(&[&[1, 10, 20]]);
        let received = records(&[&[1, 10]]);
        let summary = verify(&received, &expected, PairingMode::Positional);
        assert!(!summary.outcomes[0].passed);
    }

    #[test]
    fn test_total_counts_expected_tests() {
        let expected = records(&[&[1, 1], &[2, 2], &[3, 3], &[4, 4]]);
        let received = records(&[&[1, 1], &[2, 2]]);
        let summary = verify(&received, &expected, PairingMode::Positional);
        assert_eq!(summary.total_count, 4);
        assert_eq!(summary.passed_count, 2);
        assert_eq!(summary.outcomes.len(), 2);
        assert_eq!(summary.missing, vec![3, 4]);
        assert!(!summary.all_passed());
    }

    #[test]
    fn test_positional_ignores_identifiers_for_pairing() {
        let expected = records(&[&[1, 7], &[2, 8]]);
        let received = records(&[&[2, 8], &[1, 7], &[3, 0]]);
        let summary = verify(&received, &expected, PairingMode::Positional);
        assert_eq!(summary.passed_count, 0);
        assert_eq!(summary.unexpected, records(&[&[3, 0]]));
    }

    #[test]
    fn test_by_id_tolerates_reordering() {
        let expected = records(&[&[1, 7], &[2, 8], &[3, 9]]);
        let received = records(&[&[2, 8], &[1, 7], &[5, 5], &[1, 0]]);
        let summary = verify(&received, &expected, PairingMode::ById);
        assert_eq!(summary.passed_count, 2);
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.missing, vec![3]);
        assert_eq!(summary.unexpected, records(&[&[5, 5], &[1, 0]]));
        assert_eq!(summary.outcomes[0].test_id, 1);
    }

    #[test]
    fn test_empty_inputs() {
        let summary = verify(&[], &[], PairingMode::Positional);
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.passed_count, 0);

        let expected = records(&[&[1, 1]]);
        let summary = verify(&[], &expected, PairingMode::ById);
        assert_eq!(summary.total_count, 1);
        assert_eq!(summary.missing, vec![1]);
    }

    #[test]
    fn test_pairing_mode_from_str() {
        assert_eq!("positional".parse::<PairingMode>(), Ok(PairingMode::Positional));
        assert_eq!("By-Id".parse::<PairingMode>(), Ok(PairingMode::ById));
        assert!("fuzzy".parse::<PairingMode>().is_err());
    }
}
