use crate::config::Preset;
use crate::error::ConfigError;
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

/// What to scan and which lines count
///
/// Immutable once handed to a scanner.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScannerConfig {
    /// Directory holding the log files (not searched recursively)
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Literal substring marking a startup line
    #[serde(default = "default_startup_pattern")]
    pub startup_pattern: String,
    /// Literal substring marking a shutdown line
    #[serde(default = "default_shutdown_pattern")]
    pub shutdown_pattern: String,
    /// Literal substrings whose per-line occurrences are counted
    #[serde(default = "default_keyword_patterns")]
    pub keyword_patterns: Vec<String>,
    /// Seconds between incremental scans in monitoring mode
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    /// File name suffix selecting log files
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
}

/// Summary generation settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SummaryConfig {
    /// When false, scans are reported without calling the summarizer
    #[serde(default = "default_summary_enabled")]
    pub enabled: bool,
    /// Model identifier passed to the backend
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub backend: SummaryBackendConfig,
}

/// Which summarizer backend to talk to
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SummaryBackendConfig {
    Ollama {
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        #[serde(default = "default_request_timeout_seconds")]
        timeout_seconds: u64,
    },
    OpenAI {
        /// Falls back to the `OPENAI_API_KEY` environment variable
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_openai_base_url")]
        base_url: String,
        #[serde(default = "default_request_timeout_seconds")]
        timeout_seconds: u64,
    },
    Mock,
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_startup_pattern() -> String {
    "started".to_string()
}

fn default_shutdown_pattern() -> String {
    "shutdown".to_string()
}

fn default_keyword_patterns() -> Vec<String> {
    ["ERROR", "WARNING", "CRITICAL", "timeout", "failed", "exception"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_poll_interval_seconds() -> u64 {
    60
}

fn default_file_suffix() -> String {
    ".log".to_string()
}

fn default_summary_enabled() -> bool {
    true
}

fn default_model() -> String {
    "llama2".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    120
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            startup_pattern: default_startup_pattern(),
            shutdown_pattern: default_shutdown_pattern(),
            keyword_patterns: default_keyword_patterns(),
            poll_interval_seconds: default_poll_interval_seconds(),
            file_suffix: default_file_suffix(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: default_summary_enabled(),
            model: default_model(),
            backend: SummaryBackendConfig::default(),
        }
    }
}

impl Default for SummaryBackendConfig {
    fn default() -> Self {
        SummaryBackendConfig::Ollama {
            endpoint: default_ollama_endpoint(),
            timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl ScannerConfig {
    pub fn new(
        directory: impl Into<PathBuf>,
        startup_pattern: impl Into<String>,
        shutdown_pattern: impl Into<String>,
        keyword_patterns: Vec<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            startup_pattern: startup_pattern.into(),
            shutdown_pattern: shutdown_pattern.into(),
            keyword_patterns,
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Replace the markers and keyword list with those of a preset
    pub fn apply_preset(&mut self, preset: Preset) {
        debug!("Applying preset: {:?}", preset);
        self.startup_pattern = preset.startup_pattern().to_string();
        self.shutdown_pattern = preset.shutdown_pattern().to_string();
        self.keyword_patterns = preset
            .keyword_patterns()
            .iter()
            .map(|s| s.to_string())
            .collect();
    }

    /// Check the invariants a scanner relies on
    ///
    /// Empty patterns are rejected; they would match every line.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.startup_pattern.is_empty() {
            return Err(ConfigError::ValidationError(
                "startup_pattern must not be empty".to_string(),
            ));
        }
        if self.shutdown_pattern.is_empty() {
            return Err(ConfigError::ValidationError(
                "shutdown_pattern must not be empty".to_string(),
            ));
        }
        if let Some(index) = self.keyword_patterns.iter().position(|k| k.is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "keyword_patterns[{}] must not be empty",
                index
            )));
        }
        if self.poll_interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.file_suffix.is_empty() {
            return Err(ConfigError::ValidationError(
                "file_suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl SummaryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "summary.model must not be empty when summaries are enabled".to_string(),
            ));
        }
        match &self.backend {
            SummaryBackendConfig::Ollama {
                endpoint,
                timeout_seconds,
            } => {
                if endpoint.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "summary.backend.endpoint must not be empty".to_string(),
                    ));
                }
                if *timeout_seconds == 0 {
                    return Err(ConfigError::ValidationError(
                        "summary.backend.timeout_seconds must be greater than zero".to_string(),
                    ));
                }
            }
            SummaryBackendConfig::OpenAI {
                base_url,
                timeout_seconds,
                ..
            } => {
                if base_url.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "summary.backend.base_url must not be empty".to_string(),
                    ));
                }
                if *timeout_seconds == 0 {
                    return Err(ConfigError::ValidationError(
                        "summary.backend.timeout_seconds must be greater than zero".to_string(),
                    ));
                }
            }
            SummaryBackendConfig::Mock => {}
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from: {}", path.display());
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scanner.validate()?;
        self.summary.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.scanner.directory, PathBuf::from("."));
        assert_eq!(config.scanner.startup_pattern, "started");
        assert_eq!(config.scanner.shutdown_pattern, "shutdown");
        assert_eq!(config.scanner.keyword_patterns.len(), 6);
        assert_eq!(config.scanner.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.scanner.file_suffix, ".log");
        assert!(config.summary.enabled);
        assert_eq!(config.summary.model, "llama2");
        assert!(matches!(
            config.summary.backend,
            SummaryBackendConfig::Ollama { .. }
        ));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_full_document() {
        let toml = r#"
[scanner]
directory = "/var/log/myapp"
startup_pattern = "server started"
shutdown_pattern = "server stopped"
keyword_patterns = ["ERROR", "500"]
poll_interval_seconds = 15
file_suffix = ".txt"

[summary]
enabled = false
model = "mistral"
backend = { type = "openai", api_key = "sk-test", base_url = "http://localhost:8080/v1" }
"#;
        let config = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.scanner.directory, PathBuf::from("/var/log/myapp"));
        assert_eq!(config.scanner.startup_pattern, "server started");
        assert_eq!(config.scanner.keyword_patterns, vec!["ERROR", "500"]);
        assert_eq!(config.scanner.poll_interval_seconds, 15);
        assert_eq!(config.scanner.file_suffix, ".txt");
        assert!(!config.summary.enabled);
        assert_eq!(config.summary.model, "mistral");
        match config.summary.backend {
            SummaryBackendConfig::OpenAI {
                api_key,
                base_url,
                timeout_seconds,
            } => {
                assert_eq!(api_key.as_deref(), Some("sk-test"));
                assert_eq!(base_url, "http://localhost:8080/v1");
                assert_eq!(timeout_seconds, 120);
            }
            other => panic!("Expected OpenAI backend, got {:?}", other),
        }
    }

    #[test]
    fn test_mock_backend_section() {
        let toml = r#"
[summary]
backend = { type = "mock" }
"#;
        let config = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.summary.backend, SummaryBackendConfig::Mock);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let toml = r#"
[scanner]
poll_interval_seconds = 0
"#;
        let result = AppConfig::from_toml_str(toml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_empty_patterns_rejected() {
        let mut config = ScannerConfig::default();
        config.startup_pattern.clear();
        assert!(config.validate().is_err());

        let mut config = ScannerConfig::default();
        config.shutdown_pattern.clear();
        assert!(config.validate().is_err());

        let mut config = ScannerConfig::default();
        config.keyword_patterns.push(String::new());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("keyword_patterns[6]"));

        let mut config = ScannerConfig::default();
        config.file_suffix.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_keyword_list_is_valid() {
        let config = ScannerConfig::new("logs", "up", "down", vec![]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_model_rejected_only_when_enabled() {
        let mut summary = SummaryConfig {
            model: " ".to_string(),
            ..SummaryConfig::default()
        };
        assert!(summary.validate().is_err());
        summary.enabled = false;
        assert!(summary.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_reports_parse_error() {
        let result = AppConfig::from_toml_str("[scanner\ndirectory = ");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_missing_file_reports_read_error() {
        let result = AppConfig::from_file(Path::new("/nonexistent/logsift.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_apply_preset_replaces_patterns() {
        let mut config = ScannerConfig::default();
        config.apply_preset(Preset::Database);
        assert_eq!(config.startup_pattern, "database initialized");
        assert_eq!(config.shutdown_pattern, "database shutdown");
        assert!(config.keyword_patterns.contains(&"deadlock".to_string()));
        assert_eq!(config.directory, PathBuf::from("."));
    }
}
