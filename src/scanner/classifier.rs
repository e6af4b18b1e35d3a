use crate::config::ScannerConfig;
use crate::events::{Event, Statistics};
use crate::scanner::timestamp;

/// Categories a single line belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification<'a> {
    pub is_startup: bool,
    pub is_stop: bool,
    /// Keyword patterns present in the line, each listed once, in configuration order
    pub matched_keywords: Vec<&'a str>,
}

impl Classification<'_> {
    pub fn is_empty(&self) -> bool {
        !self.is_startup && !self.is_stop && self.matched_keywords.is_empty()
    }
}

/// Decides which categories a log line falls into
///
/// All tests are literal, case-sensitive substring checks. Startup and
/// shutdown are independent, so a line carrying both markers yields both
/// events. A keyword counts once per line no matter how often it repeats.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    startup_pattern: String,
    shutdown_pattern: String,
    keyword_patterns: Vec<String>,
}

impl LineClassifier {
    pub fn new(
        startup_pattern: impl Into<String>,
        shutdown_pattern: impl Into<String>,
        keyword_patterns: &[String],
    ) -> Self {
        let mut keywords: Vec<String> = Vec::with_capacity(keyword_patterns.len());
        for pattern in keyword_patterns {
            if !keywords.contains(pattern) {
                keywords.push(pattern.clone());
            }
        }

        Self {
            startup_pattern: startup_pattern.into(),
            shutdown_pattern: shutdown_pattern.into(),
            keyword_patterns: keywords,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            config.startup_pattern.clone(),
            config.shutdown_pattern.clone(),
            &config.keyword_patterns,
        )
    }

    pub fn keyword_patterns(&self) -> &[String] {
        &self.keyword_patterns
    }

    pub fn classify<'a>(&'a self, line: &str) -> Classification<'a> {
        Classification {
            is_startup: line.contains(self.startup_pattern.as_str()),
            is_stop: line.contains(self.shutdown_pattern.as_str()),
            matched_keywords: self
                .keyword_patterns
                .iter()
                .filter(|pattern| line.contains(pattern.as_str()))
                .map(String::as_str)
                .collect(),
        }
    }

    /// Classify `line` and fold the result into `stats`
    pub fn record(&self, line: &str, source_file: &str, stats: &mut Statistics) {
        stats.lines_scanned += 1;

        let classification = self.classify(line);
        if classification.is_empty() {
            return;
        }

        let ts = timestamp::extract(line);
        if classification.is_startup {
            stats.startup_events.push(Event::new(ts, source_file, line));
        }
        if classification.is_stop {
            stats.stop_events.push(Event::new(ts, source_file, line));
        }
        for keyword in classification.matched_keywords {
            stats.increment(keyword);
        }
    }
}
