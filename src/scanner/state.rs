use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Byte-offset cursors for every file a scanner has seen
///
/// Entries are created lazily and never expire; a cursor for a file that has
/// since been deleted is simply never consulted again.
#[derive(Debug, Default, Clone)]
pub struct ScanState {
    cursors: HashMap<PathBuf, u64>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded offset for `path`, zero for unseen files
    pub fn position_for(&self, path: &Path) -> u64 {
        self.cursors.get(path).copied().unwrap_or(0)
    }

    /// Move the cursor forward to `new_offset`
    ///
    /// Cursors only grow. A smaller offset is refused and logged; callers that
    /// detected truncation must [`reset`](Self::reset) first.
    ///
    /// # Returns
    ///
    /// `true` if the recorded offset now equals `new_offset`
    pub fn advance(&mut self, path: &Path, new_offset: u64) -> bool {
        let current = self.position_for(path);
        if new_offset < current {
            warn!(
                "Refusing to move cursor backwards for {}: {} -> {}",
                path.display(),
                current,
                new_offset
            );
            return false;
        }

        debug!(
            "Cursor for {} advanced {} -> {}",
            path.display(),
            current,
            new_offset
        );
        self.cursors.insert(path.to_path_buf(), new_offset);
        true
    }

    /// Rewind the cursor for `path` to the start of the file
    pub fn reset(&mut self, path: &Path) {
        debug!("Cursor for {} reset to 0", path.display());
        self.cursors.insert(path.to_path_buf(), 0);
    }

    /// Whether a cursor has ever been recorded for `path`
    pub fn is_tracked(&self, path: &Path) -> bool {
        self.cursors.contains_key(path)
    }

    /// Paths with a recorded cursor, sorted
    pub fn tracked_files(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.cursors.keys().map(PathBuf::as_path).collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}
