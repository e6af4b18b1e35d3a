//! Core event types produced by log scans
//!
//! This module defines the data handed from the scanner to the reporting side:
//! individual startup/shutdown events, the per-scan statistics aggregate and
//! the tagged outcome of a scan call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Timestamp recorded for lines that carry no recognizable timestamp
pub const UNKNOWN_TIMESTAMP: &str = "unknown";

/// A startup or shutdown line found in a log file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    /// Timestamp text as it appeared in the line, or [`UNKNOWN_TIMESTAMP`]
    pub timestamp: String,
    /// Base name of the file the line came from
    pub source_file: String,
    /// The line itself, trimmed
    pub raw_line: String,
}

impl Event {
    pub fn new(timestamp: Option<&str>, source_file: &str, line: &str) -> Self {
        Self {
            timestamp: timestamp.unwrap_or(UNKNOWN_TIMESTAMP).to_string(),
            source_file: source_file.to_string(),
            raw_line: line.trim().to_string(),
        }
    }
}

/// Aggregate produced by a single scan call
///
/// Events keep file-scan order: files in enumeration order, lines in file order.
/// A keyword pattern that never matched has no entry in `message_counts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statistics {
    pub startup_events: Vec<Event>,
    pub stop_events: Vec<Event>,
    pub message_counts: HashMap<String, u64>,
    /// Files that were read (fully or partially) during the scan
    #[serde(default)]
    pub files_scanned: usize,
    /// Complete lines classified during the scan
    #[serde(default)]
    pub lines_scanned: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occurrence count for a keyword pattern, zero when it never matched
    pub fn count_for(&self, pattern: &str) -> u64 {
        self.message_counts.get(pattern).copied().unwrap_or(0)
    }

    /// True when no events were recorded and no keyword matched
    pub fn has_no_matches(&self) -> bool {
        self.startup_events.is_empty()
            && self.stop_events.is_empty()
            && self.message_counts.values().all(|count| *count == 0)
    }

    /// Keyword counts sorted by pattern, for stable rendering
    pub fn sorted_counts(&self) -> Vec<(&str, u64)> {
        let mut counts: Vec<(&str, u64)> = self
            .message_counts
            .iter()
            .map(|(pattern, count)| (pattern.as_str(), *count))
            .collect();
        counts.sort_unstable_by(|a, b| a.0.cmp(b.0));
        counts
    }

    pub(crate) fn increment(&mut self, pattern: &str) {
        *self.message_counts.entry(pattern.to_string()).or_insert(0) += 1;
    }

    /// Append `other`'s events after this one's and add its counts
    pub(crate) fn merge(&mut self, other: Statistics) {
        self.startup_events.extend(other.startup_events);
        self.stop_events.extend(other.stop_events);
        for (pattern, count) in other.message_counts {
            *self.message_counts.entry(pattern).or_insert(0) += count;
        }
        self.files_scanned += other.files_scanned;
        self.lines_scanned += other.lines_scanned;
    }
}

/// Result of a scan call
///
/// Keeps "no files at all", "files present but nothing new" and "new content"
/// apart so the monitor loop can decide whether the summarizer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// No file in the directory matched the log suffix
    NoFilesFound,
    /// Files exist but none had unread bytes
    Empty,
    /// At least one file contributed content; statistics may still be all zero
    Populated(Statistics),
}
