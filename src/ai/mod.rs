/// Summarizer capability and backend implementations
pub mod backends;
pub mod reporter;

pub use backends::{MockBackend, OllamaBackend, OpenAIBackend, Summarizer};
pub use reporter::SummaryReporter;
