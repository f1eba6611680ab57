//! CLI-specific progress handling for butterfly-mirror
//!
//! Provides a progress bar that is reused for every extract of a run.

use std::sync::Arc;

use butterfly_mirror::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

/// Creates a progress bar for CLI display with enhanced information
pub fn create_progress_bar(total_size: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {bytes_per_sec} ETA: {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    );
    pb
}

/// Progress bar shared by the sequential downloads of one run
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    pub fn new() -> Self {
        Self {
            pb: create_progress_bar(0),
        }
    }

    /// Callback for `DownloadOptions::progress`; `(0, total)` starts a new file
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.pb.clone();
        Arc::new(move |downloaded, total| {
            if downloaded == 0 {
                pb.reset();
                pb.set_length(total);
            }
            pb.set_position(downloaded);
        })
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_bar_template() {
        let pb = create_progress_bar(1000);
        assert_eq!(pb.length().unwrap(), 1000);

        pb.set_position(100);
        pb.finish();
    }

    #[test]
    fn test_callback_resets_for_each_file() {
        let manager = ProgressManager::new();
        let callback = manager.callback();

        callback(0, 500);
        callback(500, 500);
        assert_eq!(manager.pb.position(), 500);

        callback(0, 2000);
        assert_eq!(manager.pb.length().unwrap(), 2000);
        assert_eq!(manager.pb.position(), 0);

        manager.finish();
    }
}
