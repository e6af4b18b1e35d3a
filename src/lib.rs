/// Error types for scanning, summaries and configuration
pub mod error;

/// Events, per-scan statistics and scan outcomes
pub mod events;

/// Configuration management
pub mod config;

/// Log file enumeration, line classification and read cursors
pub mod scanner;

/// Summary prompt construction and backend implementations
pub mod ai;

/// Report rendering and delivery
pub mod report;

/// Continuous monitoring loop
pub mod monitor;

// Re-export commonly used types
pub use error::{ConfigError, ScanError, SummaryError};
pub use events::{Event, ScanOutcome, Statistics};
pub use monitor::{MonitorLoop, ShutdownSignal};
pub use scanner::LogScanner;
