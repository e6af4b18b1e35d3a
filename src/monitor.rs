//! Continuous monitoring of a log directory
//!
//! The monitor is a small state machine. The first run performs a full scan
//! to seed the cursors and reports it; afterwards every tick scans only the
//! appended lines. Waiting between ticks goes through a [`Scheduler`], so tests
//! can drive the loop without real time passing, and cancellation through a
//! [`ShutdownSignal`] is only observed between ticks.

use crate::ai::SummaryReporter;
use crate::error::ScanError;
use crate::events::{ScanOutcome, Statistics};
use crate::report::{Report, ReportKind, ReportSink};
use crate::scanner::LogScanner;
use chrono::Local;
use log::{debug, error, info, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Lifecycle of a [`MonitorLoop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No baseline scan yet
    Idle,
    /// Baseline taken, incremental scans on each tick
    Polling,
    /// Cancelled or failed; cursors are kept
    Stopped,
}

/// What a single scan step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Statistics were reported; `summarized` tells whether a summary came back
    Reported { summarized: bool },
    /// Files exist but nothing was appended
    NoChange,
    /// The directory holds no matching files
    NoFiles,
}

/// Waits out the interval between ticks
pub trait Scheduler: Send {
    fn wait<'a>(&'a mut self, interval: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Real-time scheduler backed by `tokio::time::sleep`
#[derive(Debug, Default)]
pub struct IntervalScheduler;

impl Scheduler for IntervalScheduler {
    fn wait<'a>(&'a mut self, interval: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(tokio::time::sleep(interval))
    }
}

/// Cooperative stop request shared between the loop and whoever cancels it
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Ask the loop to stop at the next tick boundary
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once [`trigger`](Self::trigger) has been called
    pub async fn triggered(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}

/// Periodic incremental scanner feeding a summary reporter and a report sink
pub struct MonitorLoop {
    scanner: LogScanner,
    reporter: SummaryReporter,
    sink: Box<dyn ReportSink>,
    state: MonitorState,
    baselined: bool,
    scan_count: u64,
}

impl MonitorLoop {
    pub fn new(scanner: LogScanner, reporter: SummaryReporter, sink: Box<dyn ReportSink>) -> Self {
        Self {
            scanner,
            reporter,
            sink,
            state: MonitorState::Idle,
            baselined: false,
            scan_count: 0,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn scanner(&self) -> &LogScanner {
        &self.scanner
    }

    /// Number of incremental scans performed so far
    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    /// Take the baseline: full scan, report it, move to `Polling`
    ///
    /// The baseline is reported even when nothing matched. When no log file
    /// exists there is nothing to summarize and only a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns the enumeration error and moves to `Stopped` if the directory
    /// cannot be read.
    pub async fn start(&mut self) -> Result<TickOutcome, ScanError> {
        info!(
            "Initial scan of {}",
            self.scanner.config().directory.display()
        );

        let outcome = match self.scanner.scan_full() {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Initial scan failed: {}", e);
                self.state = MonitorState::Stopped;
                return Err(e);
            }
        };
        self.state = MonitorState::Polling;
        self.baselined = true;

        Ok(match outcome {
            ScanOutcome::Populated(stats) => self.deliver(ReportKind::Baseline, stats).await,
            ScanOutcome::Empty => TickOutcome::NoChange,
            ScanOutcome::NoFilesFound => {
                warn!(
                    "No log files found in {}; waiting for some to appear",
                    self.scanner.config().directory.display()
                );
                TickOutcome::NoFiles
            }
        })
    }

    /// One polling step: incremental scan, report if anything was appended
    ///
    /// Ticking a monitor that has no baseline yet takes the baseline instead.
    ///
    /// # Errors
    ///
    /// Returns the enumeration error and moves to `Stopped` if the directory
    /// cannot be read. Per-file failures are logged by the scanner and do not
    /// surface here.
    pub async fn tick(&mut self) -> Result<TickOutcome, ScanError> {
        if !self.baselined {
            return self.start().await;
        }

        self.scan_count += 1;
        info!(
            "[{}] Scan #{} - checking for new entries",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.scan_count
        );

        let outcome = match self.scanner.scan_incremental() {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Scan #{} failed: {}", self.scan_count, e);
                self.state = MonitorState::Stopped;
                return Err(e);
            }
        };

        Ok(match outcome {
            ScanOutcome::Populated(stats) => {
                info!("New log content detected");
                self.deliver(ReportKind::Update, stats).await
            }
            ScanOutcome::Empty => {
                info!("No new events detected");
                TickOutcome::NoChange
            }
            ScanOutcome::NoFilesFound => {
                info!("No log files present");
                TickOutcome::NoFiles
            }
        })
    }

    /// Run until `shutdown` fires or the directory becomes unreadable
    ///
    /// A monitor that was stopped by cancellation can be run again; it resumes
    /// polling from its existing cursors without a second baseline.
    pub async fn run<S>(&mut self, scheduler: &mut S, shutdown: &ShutdownSignal) -> Result<(), ScanError>
    where
        S: Scheduler + ?Sized,
    {
        let interval = self.scanner.config().poll_interval();
        if shutdown.is_triggered() {
            info!("Shutdown requested before monitoring started");
            return Ok(());
        }

        info!(
            "Starting continuous log monitoring of {} every {:?}",
            self.scanner.config().directory.display(),
            interval
        );

        if self.baselined {
            info!(
                "Resuming monitoring with {} tracked files",
                self.scanner.state().len()
            );
            debug!("Tracked files: {:?}", self.scanner.state().tracked_files());
            self.state = MonitorState::Polling;
        } else {
            self.start().await?;
        }

        loop {
            if shutdown.is_triggered() {
                break;
            }

            tokio::select! {
                _ = scheduler.wait(interval) => {}
                _ = shutdown.triggered() => {}
            }

            if shutdown.is_triggered() {
                break;
            }

            self.tick().await?;
        }

        self.state = MonitorState::Stopped;
        info!("Monitoring stopped after {} scans", self.scan_count);
        Ok(())
    }

    async fn deliver(&mut self, kind: ReportKind, stats: Statistics) -> TickOutcome {
        let summary = if self.reporter.is_enabled() {
            self.reporter.summarize(&stats).await.ok()
        } else {
            None
        };

        let summarized = summary.is_some();
        self.sink.emit(&Report::new(kind, stats, summary));
        TickOutcome::Reported { summarized }
    }
}
