//! Status badges
//!
//! Badges use the shields.io endpoint schema, so a dashboard can point a
//! badge URL straight at the published JSON files:
//!
//! ```json
//! {"schemaVersion":1,"label":"Supervisor Tests","message":"pass","color":"brightgreen"}
//! ```
//!
//! Three aggregate badges are always produced (`overall`, `percentage`,
//! `fraction`) plus one `test-<id>` badge per expected test.

use super::verifier::RunSummary;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// shields.io endpoint schema version
pub const SCHEMA_VERSION: u8 = 1;

/// Default label for the aggregate badges
pub const DEFAULT_LABEL: &str = "Supervisor Tests";

/// Color tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BadgeColor {
    /// Everything passed
    #[serde(rename = "brightgreen")]
    Success,
    /// Partially passing
    #[serde(rename = "yellow")]
    Warning,
    /// Failing
    #[serde(rename = "red")]
    Failure,
}

/// A single status document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    /// Always [`SCHEMA_VERSION`]
    pub schema_version: u8,
    /// Left-hand text
    pub label: String,
    /// Right-hand text
    pub message: String,
    /// Color tier
    pub color: BadgeColor,
}

impl Badge {
    /// Create a badge
    pub fn new(label: impl Into<String>, message: impl Into<String>, color: BadgeColor) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            label: label.into(),
            message: message.into(),
            color,
        }
    }

    fn pass_fail(label: impl Into<String>, passed: bool) -> Self {
        if passed {
            Self::new(label, "pass", BadgeColor::Success)
        } else {
            Self::new(label, "fail", BadgeColor::Failure)
        }
    }

    /// Serialized document, as written to disk
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A badge together with its destination name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBadge {
    /// Stable file stem
    pub name: String,
    /// Document
    pub badge: Badge,
}

impl NamedBadge {
    fn new(name: impl Into<String>, badge: Badge) -> Self {
        Self {
            name: name.into(),
            badge,
        }
    }

    /// File name under the output directory
    pub fn file_name(&self) -> String {
        format!("{}.json", self.name)
    }
}

/// Stable badge name for a test identifier
pub fn test_badge_name(test_id: i64) -> String {
    format!("test-{test_id}")
}

/// Integer pass percentage; zero when nothing was expected
pub fn pass_percentage(passed: usize, total: usize) -> usize {
    if total == 0 {
        0
    } else {
        passed * 100 / total
    }
}

/// `pass` iff every expected test passed
pub fn overall_badge(summary: &RunSummary, label: &str) -> Badge {
    Badge::pass_fail(label, summary.all_passed())
}

/// Floor percentage, green at 100, yellow from 50
pub fn percentage_badge(summary: &RunSummary, label: &str) -> Badge {
    let percent = pass_percentage(summary.passed_count, summary.total_count);
    let color = match percent {
        _ if summary.total_count == 0 => BadgeColor::Failure,
        100 => BadgeColor::Success,
        50..=99 => BadgeColor::Warning,
        _ => BadgeColor::Failure,
    };
    Badge::new(label, format!("{percent}%"), color)
}

/// `passed/total`, green when equal, yellow when anything passed
pub fn fraction_badge(summary: &RunSummary, label: &str) -> Badge {
    let (passed, total) = (summary.passed_count, summary.total_count);
    let color = if total > 0 && passed == total {
        BadgeColor::Success
    } else if passed > 0 {
        BadgeColor::Warning
    } else {
        BadgeColor::Failure
    };
    Badge::new(label, format!("{passed}/{total}"), color)
}

/// One badge per outcome, plus `missing` badges for unreported tests
pub fn test_badges(summary: &RunSummary) -> Vec<NamedBadge> {
    let outcomes = summary.outcomes.iter().map(|outcome| {
        NamedBadge::new(
            test_badge_name(outcome.test_id),
            Badge::pass_fail(format!("test {}", outcome.test_id), outcome.passed),
        )
    });
    let missing = summary.missing.iter().map(|&id| {
        NamedBadge::new(
            test_badge_name(id),
            Badge::new(format!("test {id}"), "missing", BadgeColor::Failure),
        )
    });
    outcomes.chain(missing).collect()
}

/// The full badge family for a run
pub fn build_badges(summary: &RunSummary, label: &str) -> Vec<NamedBadge> {
    let mut badges = vec![
        NamedBadge::new("overall", overall_badge(summary, label)),
        NamedBadge::new("percentage", percentage_badge(summary, &format!("{label} pass rate"))),
        NamedBadge::new("fraction", fraction_badge(summary, &format!("{label} passed"))),
    ];
    badges.extend(test_badges(summary));
    badges
}

/// A badge that could not be persisted
#[derive(Error, Debug)]
#[error("failed to write badge {name} to {}: {source}", path.display())]
pub struct BadgeWriteFailure {
    /// Badge name
    pub name: String,
    /// Destination
    pub path: PathBuf,
    /// Underlying I/O error
    #[source]
    pub source: std::io::Error,
}

/// Result of publishing a badge family
#[derive(Debug, Default)]
pub struct BadgeReport {
    /// Files written
    pub written: Vec<PathBuf>,
    /// Badges that failed to write
    pub failures: Vec<BadgeWriteFailure>,
}

impl BadgeReport {
    /// Every badge written?
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes badge documents into a directory
#[derive(Debug, Clone)]
pub struct BadgeReporter {
    output_dir: PathBuf,
    label: String,
}

impl BadgeReporter {
    /// Create a reporter writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            label: label.into(),
        }
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Badges for a summary, without writing them
    pub fn render(&self, summary: &RunSummary) -> Vec<NamedBadge> {
        build_badges(summary, &self.label)
    }

    /// Write every badge; a failed write does not stop the others
    pub fn publish(&self, summary: &RunSummary) -> BadgeReport {
        if let Err(e) = std::fs::create_dir_all(&self.output_dir) {
            tracing::warn!(dir = %self.output_dir.display(), error = %e, "Cannot create badge directory");
        }

        let mut report = BadgeReport::default();
        for named in self.render(summary) {
            let path = self.output_dir.join(named.file_name());
            match write_badge(&path, &named.badge) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), message = %named.badge.message, "Badge written");
                    report.written.push(path);
                }
                Err(source) => {
                    let failure = BadgeWriteFailure {
                        name: named.name,
                        path,
                        source,
                    };
                    tracing::error!("{failure}");
                    report.failures.push(failure);
                }
            }
        }
        report
    }
}

fn write_badge(path: &Path, badge: &Badge) -> std::io::Result<()> {
    let json = badge.to_json().map_err(std::io::Error::from)?;
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::TestRecord;
    use crate::core::verifier::{verify, PairingMode};

    fn summary(passed: usize, total: usize) -> RunSummary {
        RunSummary {
            outcomes: Vec::new(),
            passed_count: passed,
            total_count: total,
            missing: Vec::new(),
            unexpected: Vec::new(),
            malformed: Vec::new(),
        }
    }

    #[test]
    fn test_overall_badge() {
        let badge = overall_badge(&summary(4, 4), "Supervisor Tests");
        assert_eq!(badge.message, "pass");
        assert_eq!(badge.color, BadgeColor::Success);

        let badge = overall_badge(&summary(3, 4), "Supervisor Tests");
        assert_eq!(badge.message, "fail");
        assert_eq!(badge.color, BadgeColor::Failure);
    }

    #[test]
    fn test_percentage_tiers() {
        let badge = percentage_badge(&summary(3, 4), "rate");
        assert_eq!(badge.message, "75%");
        assert_eq!(badge.color, BadgeColor::Warning);

        assert_eq!(percentage_badge(&summary(4, 4), "rate").color, BadgeColor::Success);
        assert_eq!(percentage_badge(&summary(1, 2), "rate").color, BadgeColor::Warning);
        assert_eq!(percentage_badge(&summary(1, 3), "rate").message, "33%");
        assert_eq!(percentage_badge(&summary(1, 3), "rate").color, BadgeColor::Failure);
        assert_eq!(percentage_badge(&summary(2, 3), "rate").message, "66%");
    }

    #[test]
    fn test_fraction_tiers() {
        let badge = fraction_badge(&summary(0, 5), "passed");
        assert_eq!(badge.message, "0/5");
        assert_eq!(badge.color, BadgeColor::Failure);

        assert_eq!(fraction_badge(&summary(2, 5), "passed").color, BadgeColor::Warning);
        assert_eq!(fraction_badge(&summary(5, 5), "passed").color, BadgeColor::Success);
    }

    #[test]
    fn test_zero_total_is_not_green() {
        let empty = summary(0, 0);
        let pct = percentage_badge(&empty, "rate");
        assert_eq!(pct.message, "0%");
        assert_eq!(pct.color, BadgeColor::Failure);

        let frac = fraction_badge(&empty, "passed");
        assert_eq!(frac.message, "0/0");
        assert_eq!(frac.color, BadgeColor::Failure);
    }

    #[test]
    fn test_badge_json_schema() {
        let json = Badge::new("Supervisor Tests", "pass", BadgeColor::Success)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert_eq!(value["label"], "Supervisor Tests");
        assert_eq!(value["message"], "pass");
        assert_eq!(value["color"], "brightgreen");
    }

    #[test]
    fn test_per_test_badges() {
        let expected = vec![
            TestRecord::new(vec![1, 10]),
            TestRecord::new(vec![2, 20]),
            TestRecord::new(vec![3, 30]),
        ];
        let received = vec![TestRecord::new(vec![1, 10]), TestRecord::new(vec![2, 21])];
        let summary = verify(&received, &expected, PairingMode::Positional);

        let badges = test_badges(&summary);
        let messages: Vec<_> = badges
            .iter()
            .map(|b| (b.name.as_str(), b.badge.message.as_str()))
            .collect();
        assert_eq!(
            messages,
            vec![("test-1", "pass"), ("test-2", "fail"), ("test-3", "missing")]
        );
    }

    #[test]
    fn test_publish_writes_every_badge() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("badges");
        let expected = vec![TestRecord::new(vec![1, 1]), TestRecord::new(vec![2, 2])];
        let summary = verify(&expected, &expected, PairingMode::Positional);

        let report = BadgeReporter::new(&out, DEFAULT_LABEL).publish(&summary);
        assert!(report.is_complete());
        assert_eq!(report.written.len(), 5);
        for name in ["overall", "percentage", "fraction", "test-1", "test-2"] {
            assert!(out.join(format!("{name}.json")).exists(), "{name} missing");
        }
    }

    #[test]
    fn test_publish_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let expected = vec![
            TestRecord::new(vec![1, 1]),
            TestRecord::new(vec![2, 2]),
            TestRecord::new(vec![3, 3]),
        ];
        let received = vec![TestRecord::new(vec![1, 1]), TestRecord::new(vec![2, 3])];
        let summary = verify(&received, &expected, PairingMode::Positional);
        let reporter = BadgeReporter::new(dir.path(), DEFAULT_LABEL);

        let snapshot = || {
            let mut files: Vec<_> = std::fs::read_dir(dir.path())
                .unwrap()
                .map(|entry| {
                    let path = entry.unwrap().path();
                    let bytes = std::fs::read(&path).unwrap();
                    (path, bytes)
                })
                .collect();
            files.sort();
            files
        };

        let first_report = reporter.publish(&summary);
        let first = snapshot();
        let second_report = reporter.publish(&summary);
        let second = snapshot();

        assert_eq!(first.len(), 6);
        assert_eq!(first_report.written, second_report.written);
        assert_eq!(first, second);
    }

    #[test]
    fn test_publish_reports_write_failures() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let report = BadgeReporter::new(&blocker, DEFAULT_LABEL).publish(&summary(0, 0));
        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 3);
        assert!(report.written.is_empty());
    }
}
