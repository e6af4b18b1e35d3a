//! Configuration management
//!
//! Settings are loaded from an optional TOML file, then overridden by
//! command-line flags. Named presets bundle the startup/shutdown markers and
//! keyword lists for common kinds of services.

pub mod presets;
pub mod settings;

pub use presets::Preset;
pub use settings::{AppConfig, ScannerConfig, SummaryBackendConfig, SummaryConfig};
