use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::{ScanOutcome, ScanState};

/// Terminal outcome of a scan, ready for presentation
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub found: bool,
    pub candidate_id: Option<String>,
    pub score: Option<f64>,
    pub elapsed: Duration,
    pub processed: usize,
    pub total: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

/// Build the report for a finished (or cancelled) scan
pub fn summarize(state: &ScanState, elapsed: Duration) -> ScanReport {
    let best = state.best();
    ScanReport {
        found: best.is_some(),
        candidate_id: best.map(|b| b.candidate_id.clone()),
        score: best.map(|b| b.score()),
        elapsed,
        processed: state.processed(),
        total: state.total(),
        skipped: state.skipped(),
        cancelled: state.outcome() == ScanOutcome::Cancelled,
    }
}

impl ScanReport {
    /// Score with exactly two decimals, `None` when nothing matched
    pub fn score_text(&self) -> Option<String> {
        self.score.map(|s| format!("{:.2}", s))
    }

    /// Elapsed wall-clock seconds with exactly four decimals
    pub fn elapsed_text(&self) -> String {
        format!("{:.4}", self.elapsed.as_secs_f64())
    }

    pub fn record(&self) -> ReportRecord {
        ReportRecord {
            found: self.found,
            candidate_id: self.candidate_id.clone(),
            score: self.score_text(),
            elapsed_seconds: self.elapsed_text(),
        }
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.candidate_id, self.score_text()) {
            (Some(id), Some(score)) => {
                writeln!(f, "BEST MATCH FOUND: {}", id)?;
                writeln!(f, "SCORE: {}", score)?;
            }
            _ => writeln!(f, "No match found.")?,
        }
        write!(f, "EXEC TIME: {} seconds", self.elapsed_text())?;
        if self.cancelled {
            write!(f, "\n(cancelled after {} of {} candidates)", self.processed, self.total)?;
        }
        Ok(())
    }
}

/// Flat record handed to presenters: score and time pre-formatted
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ReportRecord {
    pub found: bool,
    pub candidate_id: Option<String>,
    pub score: Option<String>,
    pub elapsed_seconds: String,
}

impl ReportRecord {
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{fixture, sample_image, Fake};
    use crate::engine::{CancelToken, NoProgress};

    #[test]
    fn test_end_to_end_report() {
        let (engine, paths) = fixture(
            &[
                ("A", Fake::Accept(4550)),
                ("B", Fake::Accept(9012)),
                ("C", Fake::NoDescriptors),
            ],
            10_000,
        );
        let state = engine
            .scan(&sample_image(), &paths, &mut NoProgress, &CancelToken::new())
            .unwrap();
        let report = summarize(&state, state.elapsed());
        let record = report.record();

        assert!(record.found);
        assert_eq!(record.candidate_id.as_deref(), Some("B"));
        assert_eq!(record.score.as_deref(), Some("90.12"));
        let (whole, frac) = record.elapsed_seconds.split_once('.').unwrap();
        assert!(whole.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(frac.len(), 4);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_no_match_report() {
        let (engine, paths) = fixture(&[], 10);
        let state = engine
            .scan(&sample_image(), &paths, &mut NoProgress, &CancelToken::new())
            .unwrap();
        let report = summarize(&state, Duration::from_millis(1500));

        assert!(!report.found);
        assert_eq!(report.score_text(), None);
        assert_eq!(report.total, 0);
        assert_eq!(report.to_string(), "No match found.\nEXEC TIME: 1.5000 seconds");
    }

    #[test]
    fn test_found_display() {
        let report = ScanReport {
            found: true,
            candidate_id: Some("101__M_Left_index_finger.BMP".to_string()),
            score: Some(45.5),
            elapsed: Duration::from_micros(123_456),
            processed: 3,
            total: 3,
            skipped: 0,
            cancelled: false,
        };
        assert_eq!(
            report.to_string(),
            "BEST MATCH FOUND: 101__M_Left_index_finger.BMP\nSCORE: 45.50\nEXEC TIME: 0.1235 seconds"
        );
    }

    #[test]
    fn test_cancelled_display() {
        let report = ScanReport {
            found: false,
            candidate_id: None,
            score: None,
            elapsed: Duration::from_secs(2),
            processed: 2,
            total: 5,
            skipped: 0,
            cancelled: true,
        };
        assert!(report.to_string().ends_with("(cancelled after 2 of 5 candidates)"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_record_json_keys() {
        let record = ReportRecord {
            found: true,
            candidate_id: Some("B".to_string()),
            score: Some("90.12".to_string()),
            elapsed_seconds: "0.0100".to_string(),
        };
        let json = record.to_json().unwrap();
        assert!(json.contains("\"candidateId\": \"B\""));
        assert!(json.contains("\"elapsedSeconds\": \"0.0100\""));
    }
}
