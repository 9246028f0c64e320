//! Run summary output

use crate::core::runner::RunOutcome;
use std::fmt::Write as _;

/// CLI output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON for scripting
    Json,
}

/// Render a finished run
pub fn format_outcome(outcome: &RunOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&outcome.report()).unwrap_or_default(),
        OutputFormat::Text => format_text(outcome),
    }
}

fn format_text(outcome: &RunOutcome) -> String {
    let summary = &outcome.summary;
    let mut out = String::new();

    let _ = writeln!(out, "Checking results...");
    for o in &summary.outcomes {
        let status = if o.passed { "PASS" } else { "FAIL" };
        let _ = writeln!(
            out,
            "Test {}: Got {:?} | Expected {:?} -> {}",
            o.test_id,
            o.actual.values(),
            o.expected.values(),
            status
        );
    }
    for id in &summary.missing {
        let _ = writeln!(out, "Test {id}: no result received -> FAIL");
    }
    for record in &summary.unexpected {
        let _ = writeln!(out, "Unexpected result: {record}");
    }
    for line in &summary.malformed {
        let _ = writeln!(
            out,
            "Warning: malformed result on line {}: {:?} ({})",
            line.line_number, line.raw, line.reason
        );
    }
    let stats = &outcome.link_stats;
    let _ = writeln!(
        out,
        "Link: {} ({} lines, {} bytes, {} idle reads)",
        outcome.transport, outcome.lines_seen, stats.bytes_received, stats.idle_reads
    );
    for failure in &outcome.badges.failures {
        let _ = writeln!(out, "Error: {failure}");
    }

    let _ = writeln!(
        out,
        "{}/{} passed -> {}",
        summary.passed_count,
        summary.total_count,
        if summary.all_passed() { "PASS" } else { "FAIL" }
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::badge::BadgeReport;
    use crate::core::reader::{MalformedLine, StreamEnd};
    use crate::core::record::TestRecord;
    use crate::core::transport::{TransportStats, TransportType};
    use crate::core::verifier::{verify, PairingMode};

    fn outcome() -> RunOutcome {
        let expected = vec![
            TestRecord::new(vec![1, 10, 20]),
            TestRecord::new(vec![2, 5, 5]),
            TestRecord::new(vec![3, 0]),
        ];
        let received = vec![TestRecord::new(vec![1, 10, 20]), TestRecord::new(vec![2, 5, 6])];
        let summary = verify(&received, &expected, PairingMode::Positional).with_malformed(vec![
            MalformedLine {
                line_number: 4,
                raw: "3,abc".into(),
                reason: "field 1 is not an integer: \"abc\"".into(),
            },
        ]);
        RunOutcome {
            summary,
            badges: BadgeReport::default(),
            end: StreamEnd::Terminated,
            lines_seen: 5,
            transport: TransportType::Replay,
            link_stats: TransportStats {
                bytes_received: 40,
                reads: 2,
                idle_reads: 1,
                ..TransportStats::default()
            },
        }
    }

    #[test]
    fn test_text_output() {
        let text = format_outcome(&outcome(), OutputFormat::Text);
        assert!(text.contains("Test 1: Got [10, 20] | Expected [10, 20] -> PASS"));
        assert!(text.contains("Test 2: Got [5, 6] | Expected [5, 5] -> FAIL"));
        assert!(text.contains("Test 3: no result received -> FAIL"));
        assert!(text.contains("malformed result on line 4"));
        assert!(text.contains("Link: Replay (5 lines, 40 bytes, 1 idle reads)"));
        assert!(text.ends_with("1/3 passed -> FAIL\n"));
    }

    #[test]
    fn test_json_output() {
        let json = format_outcome(&outcome(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["passedCount"], 1);
        assert_eq!(value["summary"]["missing"][0], 3);
        assert_eq!(value["linesSeen"], 5);
        assert_eq!(value["link"]["idleReads"], 1);
    }
}
