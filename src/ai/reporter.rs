use crate::ai::backends::Summarizer;
use crate::error::SummaryError;
use crate::events::{Event, Statistics};
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Instant;

/// Builds summary prompts from scan statistics and sends them to a summarizer
///
/// The reporter never touches scan state; a failed summary leaves the
/// statistics it was given exactly as they were. A reporter without a
/// backend renders prompts but never generates summaries.
pub struct SummaryReporter {
    backend: Option<Arc<dyn Summarizer>>,
    model: String,
}

impl SummaryReporter {
    /// Create a reporter that asks `model` on `backend` for summaries
    pub fn new(backend: Arc<dyn Summarizer>, model: impl Into<String>) -> Self {
        Self {
            backend: Some(backend),
            model: model.into(),
        }
    }

    /// Create a reporter with summary generation turned off
    pub fn disabled(model: impl Into<String>) -> Self {
        Self {
            backend: None,
            model: model.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Render the prompt for `stats`
    ///
    /// Deterministic for a given input: keyword counts are listed in pattern
    /// order. The prompt always carries the startup, shutdown and keyword
    /// blocks, even when they are empty.
    pub fn format_prompt(&self, stats: &Statistics) -> String {
        let counts = stats.sorted_counts();
        let keyword_block = if counts.is_empty() {
            "   (no configured patterns matched)".to_string()
        } else {
            counts
                .iter()
                .map(|(pattern, count)| format!("   - \"{}\": {}", pattern, count))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"Here is the technical analysis of the application logs:

1. Startup Events Detected: {}
   Timestamps: {}

2. Shutdown Events Detected: {}
   Timestamps: {}

3. Critical Message Counts:
{}

Please provide a professional "Executive Summary" of the system health.
Highlight any potential uptime issues based on the start/stop times and
flag high frequencies of specific errors."#,
            stats.startup_events.len(),
            timestamp_list(&stats.startup_events),
            stats.stop_events.len(),
            timestamp_list(&stats.stop_events),
            keyword_block
        )
    }

    /// Ask the summarizer for an executive summary of `stats`
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::BackendError` when the reporter is disabled, and
    /// whatever the backend reports otherwise.
    pub async fn summarize(&self, stats: &Statistics) -> Result<String, SummaryError> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            SummaryError::BackendError("summary generation is disabled".to_string())
        })?;

        let prompt = self.format_prompt(stats);
        info!(
            "Sending statistics to summarizer (model {}): {} startup, {} shutdown, {} patterns",
            self.model,
            stats.startup_events.len(),
            stats.stop_events.len(),
            stats.message_counts.len()
        );
        debug!("Summary prompt:\n{}", prompt);

        let start_time = Instant::now();
        let result = backend.generate(&self.model, &prompt).await;
        let duration = start_time.elapsed();

        match &result {
            Ok(text) => info!(
                "Summary generated in {:?} ({} characters)",
                duration,
                text.len()
            ),
            Err(e) => error!("Summary generation failed after {:?}: {}", duration, e),
        }

        result
    }
}

fn timestamp_list(events: &[Event]) -> String {
    if events.is_empty() {
        return "none".to_string();
    }
    events
        .iter()
        .map(|event| event.timestamp.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::backends::MockBackend;

    fn sample_stats() -> Statistics {
        let mut stats = Statistics::new();
        stats
            .startup_events
            .push(Event::new(Some("01-01-2024 10:00:00"), "app.log", "started"));
        stats
            .startup_events
            .push(Event::new(None, "app.log", "started again"));
        stats
            .stop_events
            .push(Event::new(Some("01-01-2024 12:00:00"), "app.log", "shutdown"));
        stats.increment("timeout");
        stats.increment("ERROR");
        stats.increment("ERROR");
        stats
    }

    fn reporter(backend: MockBackend) -> SummaryReporter {
        SummaryReporter::new(Arc::new(backend), "llama2")
    }

    #[test]
    fn test_prompt_contains_all_blocks() {
        let prompt = reporter(MockBackend::success()).format_prompt(&sample_stats());

        assert!(prompt.contains("Startup Events Detected: 2"));
        assert!(prompt.contains("Timestamps: 01-01-2024 10:00:00, unknown"));
        assert!(prompt.contains("Shutdown Events Detected: 1"));
        assert!(prompt.contains("Timestamps: 01-01-2024 12:00:00"));
        assert!(prompt.contains("Critical Message Counts:"));
        assert!(prompt.contains("\"ERROR\": 2"));
        assert!(prompt.contains("\"timeout\": 1"));
        assert!(prompt.contains("Executive Summary"));
    }

    #[test]
    fn test_prompt_orders_keywords() {
        let prompt = reporter(MockBackend::success()).format_prompt(&sample_stats());
        let error_pos = prompt.find("\"ERROR\"").unwrap();
        let timeout_pos = prompt.find("\"timeout\"").unwrap();
        assert!(error_pos < timeout_pos);
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let r = reporter(MockBackend::success());
        let stats = sample_stats();
        assert_eq!(r.format_prompt(&stats), r.format_prompt(&stats.clone()));
    }

    #[test]
    fn test_prompt_for_empty_statistics() {
        let prompt = reporter(MockBackend::success()).format_prompt(&Statistics::new());
        assert!(prompt.contains("Startup Events Detected: 0"));
        assert!(prompt.contains("Shutdown Events Detected: 0"));
        assert!(prompt.contains("Timestamps: none"));
        assert!(prompt.contains("no configured patterns matched"));
    }

    #[tokio::test]
    async fn test_summarize_sends_prompt_and_model() {
        let backend = MockBackend::with_response(Ok("Uptime looks healthy".to_string()));
        let r = SummaryReporter::new(Arc::new(backend.clone()), "mistral");
        let stats = sample_stats();

        let text = r.summarize(&stats).await.unwrap();
        assert_eq!(text, "Uptime looks healthy");

        let (model, prompt) = backend.last_call().unwrap();
        assert_eq!(model, "mistral");
        assert_eq!(prompt, r.format_prompt(&stats));
    }

    #[tokio::test]
    async fn test_summarize_failure_leaves_statistics_untouched() {
        let r = reporter(MockBackend::error("connection refused".to_string()));
        let stats = sample_stats();
        let before = stats.clone();

        let result = r.summarize(&stats).await;
        assert!(matches!(result, Err(SummaryError::BackendError(_))));
        assert_eq!(stats, before);
    }

    #[tokio::test]
    async fn test_disabled_reporter_has_no_backend() {
        let r = SummaryReporter::disabled("llama2");
        assert!(!r.is_enabled());
        assert_eq!(r.model(), "llama2");
        assert!(r.format_prompt(&sample_stats()).contains("Startup Events Detected: 2"));
        assert!(matches!(
            r.summarize(&sample_stats()).await,
            Err(SummaryError::BackendError(_))
        ));
    }
}
