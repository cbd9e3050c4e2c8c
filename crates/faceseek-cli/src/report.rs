//! End-of-scan reporting: console summary plus optional JSON dump.

use crate::scanner::{MatchRecord, ScanOutcome};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Print the final summary block. Matches go to stdout as a timestamp list;
/// no matches prints a single not-detected line.
pub fn print_summary(outcome: &ScanOutcome, output: &Path) {
    if outcome.matches.is_empty() {
        println!("Person not detected in the video.");
    } else {
        println!("Person detected at these timestamps:");
        for record in &outcome.matches {
            println!(
                " - Frame {}, Time {:.2}s",
                record.frame_index, record.timestamp_secs
            );
        }
    }
    println!("Annotated video saved to {}", output.display());
}

#[derive(Serialize)]
struct JsonReport<'a> {
    frames_scanned: u64,
    matches: &'a [MatchRecord],
}

/// Write the scan outcome as pretty-printed JSON to `path`.
pub fn write_json_report(outcome: &ScanOutcome, path: &Path) -> Result<()> {
    let report = JsonReport {
        frames_scanned: outcome.frames,
        matches: &outcome.matches,
    };

    let file = File::create(path)
        .with_context(|| format!("failed to create report {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(matches: Vec<MatchRecord>, frames: u64) -> ScanOutcome {
        ScanOutcome { matches, frames }
    }

    #[test]
    fn test_json_report_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let out = outcome(
            vec![
                MatchRecord {
                    frame_index: 12,
                    timestamp_secs: 0.48,
                },
                MatchRecord {
                    frame_index: 13,
                    timestamp_secs: 0.52,
                },
            ],
            250,
        );
        write_json_report(&out, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["frames_scanned"], 250);
        assert_eq!(parsed["matches"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["matches"][0]["frame_index"], 12);
    }

    #[test]
    fn test_json_report_empty_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_json_report(&outcome(Vec::new(), 10), &path).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["matches"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_json_report_unwritable_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-subdir").join("report.json");
        assert!(write_json_report(&outcome(Vec::new(), 0), &path).is_err());
    }
}
