use anyhow::{bail, Context};
use clap::Parser;
use log::{error, info, warn};
use logsift::ai::{MockBackend, OllamaBackend, OpenAIBackend, Summarizer, SummaryReporter};
use logsift::config::{AppConfig, Preset, SummaryBackendConfig};
use logsift::error::ConfigError;
use logsift::events::ScanOutcome;
use logsift::monitor::{IntervalScheduler, MonitorLoop, ShutdownSignal};
use logsift::report::{Report, ReportKind, ReportSink, StdoutSink};
use logsift::scanner::LogScanner;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Command-line arguments for logsift
#[derive(Parser)]
#[command(
    name = "logsift",
    version,
    about = "Log directory analyzer - counts lifecycle events and error keywords, with AI summaries",
    long_about = "Scans a directory of log files for startup and shutdown markers and configured \
                  keywords, then asks a language model for an executive summary. In continuous \
                  mode only newly appended lines are analyzed on each poll."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short = 'C',
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Directory containing log files
    #[arg(short, long, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Substring marking a startup line
    #[arg(short, long, value_name = "TEXT")]
    startup_msg: Option<String>,

    /// Substring marking a shutdown line
    #[arg(short = 't', long, value_name = "TEXT")]
    stop_msg: Option<String>,

    /// Keywords to count (replaces the configured list)
    #[arg(short = 'e', long, value_name = "TERM", num_args = 1..)]
    search_terms: Option<Vec<String>>,

    /// Model identifier passed to the summary backend
    #[arg(short, long)]
    model: Option<String>,

    /// Report statistics without generating a summary
    #[arg(long)]
    no_summary: bool,

    /// Use a predefined set of markers and keywords
    #[arg(short, long, value_enum)]
    preset: Option<Preset>,

    /// Keep polling for newly appended lines until interrupted
    #[arg(short, long)]
    continuous: bool,

    /// Seconds between scans in continuous mode
    #[arg(short, long, value_name = "SECONDS")]
    interval: Option<u64>,

    /// Print reports as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files fall back to defaults in load_config
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        if self.interval == Some(0) {
            return Err("Interval must be at least one second".to_string());
        }

        if self.interval.is_some() && !self.continuous {
            warn!("--interval has no effect without --continuous");
        }

        Ok(())
    }

    /// Layer preset and flag values over the loaded configuration
    ///
    /// The preset is applied first so that explicit flags win over it.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(preset) = self.preset {
            info!("Applying {:?} preset", preset);
            config.scanner.apply_preset(preset);
        }
        if let Some(ref directory) = self.directory {
            config.scanner.directory = directory.clone();
        }
        if let Some(ref startup) = self.startup_msg {
            config.scanner.startup_pattern = startup.clone();
        }
        if let Some(ref stop) = self.stop_msg {
            config.scanner.shutdown_pattern = stop.clone();
        }
        if let Some(ref terms) = self.search_terms {
            config.scanner.keyword_patterns = terms.clone();
        }
        if let Some(interval) = self.interval {
            config.scanner.poll_interval_seconds = interval;
        }
        if let Some(ref model) = self.model {
            config.summary.model = model.clone();
        }
        if self.no_summary {
            config.summary.enabled = false;
        }
    }
}

/// Load configuration from `path`, or defaults when no usable file is given
///
/// A missing file falls back to defaults. A file that exists but does not
/// parse or validate is an error.
fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => match AppConfig::from_file(path) {
            Ok(config) => Ok(config),
            Err(ConfigError::ReadError(e)) => {
                warn!(
                    "Configuration file not found or unreadable ({}), using defaults",
                    e
                );
                Ok(AppConfig::default())
            }
            Err(e) => Err(e),
        },
        None => {
            info!("Using default configuration");
            Ok(AppConfig::default())
        }
    }
}

/// Construct the summarizer named by the configuration
fn build_summarizer(config: &SummaryBackendConfig) -> anyhow::Result<Arc<dyn Summarizer>> {
    let backend: Arc<dyn Summarizer> = match config {
        SummaryBackendConfig::Ollama {
            endpoint,
            timeout_seconds,
        } => {
            info!("Using Ollama backend at {}", endpoint);
            Arc::new(OllamaBackend::new(
                endpoint.clone(),
                Duration::from_secs(*timeout_seconds),
            )?)
        }
        SummaryBackendConfig::OpenAI {
            api_key,
            base_url,
            timeout_seconds,
        } => {
            let api_key = match api_key {
                Some(key) => key.clone(),
                None => std::env::var("OPENAI_API_KEY")
                    .context("OpenAI backend needs api_key in config or OPENAI_API_KEY")?,
            };
            info!("Using OpenAI-compatible backend at {}", base_url);
            Arc::new(OpenAIBackend::new(
                api_key,
                base_url.clone(),
                Duration::from_secs(*timeout_seconds),
            )?)
        }
        SummaryBackendConfig::Mock => {
            info!("Using mock summary backend");
            Arc::new(MockBackend::success())
        }
    };
    Ok(backend)
}

/// Scan once, report, and exit
async fn run_once(mut scanner: LogScanner, reporter: SummaryReporter, json: bool) -> anyhow::Result<()> {
    let outcome = scanner.scan_full()?;
    let stats = match outcome {
        ScanOutcome::Populated(stats) => stats,
        ScanOutcome::NoFilesFound | ScanOutcome::Empty => {
            println!("No log files found in the specified directory.");
            return Ok(());
        }
    };

    let summary = if reporter.is_enabled() {
        match reporter.summarize(&stats).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Continuing without a summary: {}", e);
                None
            }
        }
    } else {
        None
    };

    StdoutSink::new(json).emit(&Report::new(ReportKind::Baseline, stats, summary));
    Ok(())
}

/// Poll until Ctrl+C
async fn run_continuous(scanner: LogScanner, reporter: SummaryReporter, json: bool) -> anyhow::Result<()> {
    let shutdown = ShutdownSignal::new();
    let handler_signal = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received interrupt signal (SIGINT), stopping after the current scan...");
        handler_signal.trigger();
    })
    .context("Error setting SIGINT handler for graceful shutdown")?;

    info!("Monitoring is running. Press Ctrl+C to stop.");

    let mut monitor = MonitorLoop::new(scanner, reporter, Box::new(StdoutSink::new(json)));
    monitor.run(&mut IntervalScheduler, &shutdown).await?;
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Err(e) = cli.validate() {
        bail!("Invalid arguments: {}", e);
    }

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    let reporter = if config.summary.enabled {
        let backend = build_summarizer(&config.summary.backend)?;
        let reporter = SummaryReporter::new(backend, config.summary.model.clone());
        info!("Summaries generated with model {}", reporter.model());
        reporter
    } else {
        info!("Summary generation disabled");
        SummaryReporter::disabled(config.summary.model.clone())
    };

    let scanner = LogScanner::new(config.scanner);
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    if cli.continuous {
        runtime.block_on(run_continuous(scanner, reporter, cli.json))
    } else {
        runtime.block_on(run_once(scanner, reporter, cli.json))
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    info!("Starting logsift");

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["logsift"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_validation_with_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[summary]\nenabled = false\n").unwrap();

        let cli = cli(&["--config", path.to_str().unwrap()]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_validation_with_missing_file() {
        let cli = cli(&["--config", "/nonexistent/config.toml"]);

        // Should not fail - missing files fall back to defaults
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_validation_with_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = cli(&["--config", dir.path().to_str().unwrap()]);

        // Should fail - directories are not valid config files
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_cli_validation_rejects_zero_interval() {
        let cli = cli(&["--continuous", "--interval", "0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_search_terms_take_multiple_values() {
        let cli = cli(&["--search-terms", "ERROR", "panic", "--no-summary"]);
        assert_eq!(
            cli.search_terms,
            Some(vec!["ERROR".to_string(), "panic".to_string()])
        );
        assert!(cli.no_summary);
    }

    #[test]
    fn test_short_aliases() {
        let cli = cli(&[
            "-d", "/srv/logs", "-s", "up", "-t", "down", "-e", "ERROR", "panic", "-c", "-i",
            "10", "-C", "logsift.toml",
        ]);
        assert_eq!(cli.directory, Some(PathBuf::from("/srv/logs")));
        assert_eq!(cli.startup_msg.as_deref(), Some("up"));
        assert_eq!(cli.stop_msg.as_deref(), Some("down"));
        assert_eq!(
            cli.search_terms,
            Some(vec!["ERROR".to_string(), "panic".to_string()])
        );
        assert!(cli.continuous);
        assert_eq!(cli.interval, Some(10));
        assert_eq!(cli.config, Some(PathBuf::from("logsift.toml")));
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["logsift", "--version"])
            .err()
            .expect("--version should short-circuit parsing");
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_flags_override_preset() {
        let cli = cli(&[
            "--preset",
            "web",
            "--stop-msg",
            "bye",
            "--directory",
            "/var/log/app",
            "--interval",
            "5",
            "--model",
            "mistral",
            "--no-summary",
        ]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.scanner.startup_pattern, Preset::Web.startup_pattern());
        assert_eq!(config.scanner.shutdown_pattern, "bye");
        assert_eq!(config.scanner.directory, PathBuf::from("/var/log/app"));
        assert_eq!(config.scanner.poll_interval_seconds, 5);
        assert_eq!(config.summary.model, "mistral");
        assert!(!config.summary.enabled);
    }

    #[test]
    fn test_no_flags_keep_loaded_config() {
        let mut config = AppConfig::default();
        cli(&[]).apply_overrides(&mut config);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let config = load_config(Some(Path::new("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scanner]\npoll_interval_seconds = 0\n").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_build_mock_summarizer() {
        assert!(build_summarizer(&SummaryBackendConfig::Mock).is_ok());
    }

    #[test]
    fn test_openai_key_from_config() {
        let config = SummaryBackendConfig::OpenAI {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:8080/v1".to_string(),
            timeout_seconds: 5,
        };
        assert!(build_summarizer(&config).is_ok());
    }

    #[tokio::test]
    async fn test_run_once_on_empty_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.scanner.directory = dir.path().to_path_buf();

        let reporter = SummaryReporter::new(Arc::new(MockBackend::success()), "llama2");
        assert!(run_once(LogScanner::new(config.scanner), reporter, false)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_run_once_on_missing_directory_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.scanner.directory = dir.path().join("missing");

        let reporter = SummaryReporter::new(Arc::new(MockBackend::success()), "llama2");
        assert!(run_once(LogScanner::new(config.scanner), reporter, true)
            .await
            .is_err());
    }
}
