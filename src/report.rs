//! Delivery of finished scan reports
//!
//! A report pairs the statistics of one scan with the generated summary, if
//! any. Sinks decide where reports go; the default writes them to stdout.

use crate::events::Statistics;
use chrono::{DateTime, Local};
use log::error;
use serde::Serialize;
use std::io::Write;

/// Which scan produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Full scan establishing the cursors
    Baseline,
    /// Incremental scan of newly appended lines
    Update,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub generated_at: DateTime<Local>,
    pub statistics: Statistics,
    /// Generated text; `None` when summaries are off or the summarizer failed
    pub summary: Option<String>,
}

impl Report {
    pub fn new(kind: ReportKind, statistics: Statistics, summary: Option<String>) -> Self {
        Self {
            kind,
            generated_at: Local::now(),
            statistics,
            summary,
        }
    }

    /// Human-readable rendering used by [`StdoutSink`]
    pub fn render_text(&self) -> String {
        let stats = &self.statistics;
        let title = match self.kind {
            ReportKind::Baseline => "LOG ANALYSIS",
            ReportKind::Update => "NEW LOG ENTRIES",
        };

        let mut out = format!(
            "=== {} ({}) ===\nFiles scanned: {}  Lines scanned: {}\n",
            title,
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            stats.files_scanned,
            stats.lines_scanned
        );

        out.push_str(&format!("Startup events: {}\n", stats.startup_events.len()));
        for event in &stats.startup_events {
            out.push_str(&format!(
                "  [{}] {}: {}\n",
                event.timestamp, event.source_file, event.raw_line
            ));
        }

        out.push_str(&format!("Shutdown events: {}\n", stats.stop_events.len()));
        for event in &stats.stop_events {
            out.push_str(&format!(
                "  [{}] {}: {}\n",
                event.timestamp, event.source_file, event.raw_line
            ));
        }

        out.push_str("Message counts:\n");
        let counts = stats.sorted_counts();
        if counts.is_empty() {
            out.push_str("  (none)\n");
        }
        for (pattern, count) in counts {
            out.push_str(&format!("  {}: {}\n", pattern, count));
        }

        if let Some(summary) = &self.summary {
            out.push_str("\n=== AI LOG ANALYSIS SUMMARY ===\n\n");
            out.push_str(summary);
            out.push('\n');
        }

        out
    }
}

/// Destination for finished reports
#[cfg_attr(test, mockall::automock)]
pub trait ReportSink: Send {
    fn emit(&mut self, report: &Report);
}

/// Writes reports to stdout, as text or as one JSON document per report
#[derive(Debug, Default)]
pub struct StdoutSink {
    json: bool,
}

impl StdoutSink {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl ReportSink for StdoutSink {
    fn emit(&mut self, report: &Report) {
        let rendered = if self.json {
            match serde_json::to_string_pretty(report) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize report: {}", e);
                    return;
                }
            }
        } else {
            report.render_text()
        };

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = writeln!(handle, "{}", rendered).and_then(|_| handle.flush()) {
            error!("Failed to write report: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;

    fn sample_report(summary: Option<String>) -> Report {
        let mut stats = Statistics::new();
        stats.files_scanned = 2;
        stats.lines_scanned = 10;
        stats
            .startup_events
            .push(Event::new(Some("01-01-2024 10:00:00"), "app.log", "started"));
        stats.increment("ERROR");
        Report::new(ReportKind::Baseline, stats, summary)
    }

    #[test]
    fn test_render_text_lists_events_and_counts() {
        let text = sample_report(None).render_text();
        assert!(text.starts_with("=== LOG ANALYSIS"));
        assert!(text.contains("Files scanned: 2  Lines scanned: 10"));
        assert!(text.contains("Startup events: 1"));
        assert!(text.contains("[01-01-2024 10:00:00] app.log: started"));
        assert!(text.contains("Shutdown events: 0"));
        assert!(text.contains("  ERROR: 1"));
        assert!(!text.contains("AI LOG ANALYSIS SUMMARY"));
    }

    #[test]
    fn test_render_text_appends_summary() {
        let text = sample_report(Some("All quiet.".to_string())).render_text();
        assert!(text.contains("=== AI LOG ANALYSIS SUMMARY ==="));
        assert!(text.trim_end().ends_with("All quiet."));
    }

    #[test]
    fn test_update_report_title() {
        let report = Report::new(ReportKind::Update, Statistics::new(), None);
        let text = report.render_text();
        assert!(text.starts_with("=== NEW LOG ENTRIES"));
        assert!(text.contains("(none)"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let json = serde_json::to_value(sample_report(Some("ok".to_string()))).unwrap();
        assert_eq!(json["kind"], "baseline");
        assert_eq!(json["summary"], "ok");
        assert_eq!(json["statistics"]["message_counts"]["ERROR"], 1);
        assert_eq!(
            json["statistics"]["startup_events"][0]["source_file"],
            "app.log"
        );
    }
}
