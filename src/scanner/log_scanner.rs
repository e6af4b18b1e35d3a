use crate::config::ScannerConfig;
use crate::error::ScanError;
use crate::events::{ScanOutcome, Statistics};
use crate::scanner::{LineClassifier, ScanState};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Scans a directory of text logs, fully or incrementally
///
/// The scanner owns its cursor map, so every scan that goes through one
/// instance sees the offsets recorded by the previous one. Scans take
/// `&mut self`; two scans can never interleave on the same cursors.
#[derive(Debug)]
pub struct LogScanner {
    config: ScannerConfig,
    classifier: LineClassifier,
    state: ScanState,
}

impl LogScanner {
    /// Create a scanner for the given configuration
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use logsift::config::ScannerConfig;
    /// use logsift::scanner::LogScanner;
    ///
    /// let config = ScannerConfig::new("./logs", "started", "shutdown", vec!["ERROR".to_string()]);
    /// let mut scanner = LogScanner::new(config);
    /// let outcome = scanner.scan_full().unwrap();
    /// ```
    pub fn new(config: ScannerConfig) -> Self {
        let classifier = LineClassifier::from_config(&config);
        Self {
            config,
            classifier,
            state: ScanState::new(),
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// List regular files in the configured directory whose names end with the
    /// configured suffix, sorted by path. Subdirectories are not descended into.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::DirectoryUnavailable` if the directory cannot be
    /// read and `ScanError::NotADirectory` if the path is something else.
    pub fn list_log_files(&self) -> Result<Vec<PathBuf>, ScanError> {
        let dir = &self.config.directory;
        let metadata = fs::metadata(dir).map_err(|source| ScanError::DirectoryUnavailable {
            path: dir.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(dir.clone()));
        }

        let entries = fs::read_dir(dir).map_err(|source| ScanError::DirectoryUnavailable {
            path: dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            let name_matches = entry
                .file_name()
                .to_string_lossy()
                .ends_with(self.config.file_suffix.as_str());
            let path = entry.path();
            if name_matches && path.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Read every matching file from the start and record end-of-file cursors
    ///
    /// This establishes the baseline for [`scan_incremental`](Self::scan_incremental).
    /// A trailing line without a newline is classified here, since the whole
    /// file is consumed.
    ///
    /// # Returns
    ///
    /// `ScanOutcome::NoFilesFound` when nothing matches the suffix, otherwise
    /// `ScanOutcome::Populated`, even if no line matched any pattern.
    pub fn scan_full(&mut self) -> Result<ScanOutcome, ScanError> {
        let files = self.list_log_files()?;
        if files.is_empty() {
            info!(
                "No log files found in {}",
                self.config.directory.display()
            );
            return Ok(ScanOutcome::NoFilesFound);
        }

        info!("No. of files to scan: {}", files.len());
        let stats = self.full_scan_of(&files);

        info!(
            "Full scan complete: {} lines, {} startup, {} shutdown",
            stats.lines_scanned,
            stats.startup_events.len(),
            stats.stop_events.len()
        );
        Ok(ScanOutcome::Populated(stats))
    }

    /// Read only what was appended since the last recorded cursors
    ///
    /// A file smaller than its cursor is taken as truncated or rotated and is
    /// re-read from the start. Only complete lines are consumed: bytes after the
    /// last newline stay unread until a later scan sees the terminator.
    ///
    /// # Returns
    ///
    /// `ScanOutcome::Empty` when no file consumed any bytes,
    /// `ScanOutcome::Populated` when at least one did (matches or not), and
    /// `ScanOutcome::NoFilesFound` when nothing matches the suffix.
    pub fn scan_incremental(&mut self) -> Result<ScanOutcome, ScanError> {
        let files = self.list_log_files()?;
        if files.is_empty() {
            debug!(
                "No log files found in {}",
                self.config.directory.display()
            );
            return Ok(ScanOutcome::NoFilesFound);
        }

        Ok(match self.incremental_scan_of(&files) {
            Some(stats) => {
                debug!(
                    "Incremental scan: {} new lines across {} files",
                    stats.lines_scanned, stats.files_scanned
                );
                ScanOutcome::Populated(stats)
            }
            None => ScanOutcome::Empty,
        })
    }

    fn full_scan_of(&mut self, files: &[PathBuf]) -> Statistics {
        let mut stats = Statistics::new();
        for path in files {
            let (file_stats, consumed) = match self.scan_range(path, 0, None, false) {
                Ok(result) => result,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };

            stats.merge(file_stats);
            stats.files_scanned += 1;
            self.state.reset(path);
            self.state.advance(path, consumed);
        }
        stats
    }

    /// `None` when no file consumed any bytes
    fn incremental_scan_of(&mut self, files: &[PathBuf]) -> Option<Statistics> {
        let mut stats = Statistics::new();
        let mut contributed = false;

        for path in files {
            let size = match fs::metadata(path) {
                Ok(metadata) => metadata.len(),
                Err(source) => {
                    warn!(
                        "{}",
                        ScanError::FileRead {
                            path: path.clone(),
                            source,
                        }
                    );
                    continue;
                }
            };

            let recorded = self.state.position_for(path);
            let truncated = size < recorded;
            let start = if truncated {
                info!(
                    "{} shrank from {} to {} bytes, rescanning from the start",
                    path.display(),
                    recorded,
                    size
                );
                0
            } else {
                recorded
            };

            if size == start && !truncated {
                continue;
            }

            let (file_stats, consumed) = match self.scan_range(path, start, Some(size), true) {
                Ok(result) => result,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };

            if truncated {
                self.state.reset(path);
            }
            if consumed == 0 {
                debug!(
                    "{}: {} bytes without a line terminator, waiting for more",
                    path.display(),
                    size - start
                );
                continue;
            }

            stats.merge(file_stats);
            stats.files_scanned += 1;
            self.state.advance(path, start + consumed);
            contributed = true;
        }

        contributed.then_some(stats)
    }

    /// Stream the lines of `path` from byte `start` up to `end` (or EOF)
    ///
    /// Lines are classified into a fresh `Statistics` so a read failure half
    /// way through leaves the caller's totals and the cursor untouched. With
    /// `hold_partial`, a final line without a newline is neither classified
    /// nor counted as consumed.
    ///
    /// # Returns
    ///
    /// The statistics of the consumed lines and the number of bytes consumed
    fn scan_range(
        &self,
        path: &Path,
        start: u64,
        end: Option<u64>,
        hold_partial: bool,
    ) -> Result<(Statistics, u64), ScanError> {
        let to_error = |source| ScanError::FileRead {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(to_error)?;
        if start > 0 {
            file.seek(SeekFrom::Start(start)).map_err(to_error)?;
        }
        let limit = end.map_or(u64::MAX, |end| end.saturating_sub(start));
        let mut reader = BufReader::new(file.take(limit));

        let source_file = source_name(path);
        let mut stats = Statistics::new();
        let mut line = Vec::new();
        let mut consumed = 0u64;

        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line).map_err(to_error)?;
            if read == 0 {
                break;
            }
            if hold_partial && line.last() != Some(&b'\n') {
                break;
            }

            self.classify_line(&line, &source_file, &mut stats);
            consumed += read as u64;
        }

        Ok((stats, consumed))
    }

    fn classify_line(&self, raw: &[u8], source_file: &str, stats: &mut Statistics) {
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        self.classifier.record(&line, source_file, stats);
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
