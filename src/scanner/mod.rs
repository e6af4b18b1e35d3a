/// Timestamp extraction from free-text lines
pub mod timestamp;

/// Per-line startup/shutdown/keyword classification
pub mod classifier;

/// Per-file byte-offset cursors
pub mod state;

/// Full and incremental directory scans
pub mod log_scanner;

pub use classifier::{Classification, LineClassifier};
pub use log_scanner::LogScanner;
pub use state::ScanState;
