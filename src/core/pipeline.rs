//! End-to-end run: download, merge, then upload or skip.

use log::{error, info};

use crate::core::config::Settings;
use crate::core::downloader::Downloader;
use crate::core::error::{Error, Result};
use crate::core::merge::{MergeBackend, Merger};
use crate::core::stream::DownloadOptions;
use crate::core::upload::{StorageConnector, Uploader};

/// How a run ended. Every variant is a normal process exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Merged file was uploaded
    Uploaded,
    /// Merged file was produced and upload is disabled
    UploadSkipped,
    /// Merged file was produced but the upload failed
    UploadFailed,
    /// No extract was downloaded or found locally
    NoInputs,
    /// The merge backend failed
    MergeFailed,
}

/// Wires downloader, merger and uploader together for one run
pub struct Pipeline<M, C> {
    settings: Settings,
    merger: Merger<M>,
    uploader: Uploader<C>,
    options: DownloadOptions,
}

impl<M: MergeBackend, C: StorageConnector> Pipeline<M, C> {
    pub fn new(settings: Settings, merger: Merger<M>, uploader: Uploader<C>) -> Self {
        Self {
            settings,
            merger,
            uploader,
            options: DownloadOptions::default(),
        }
    }

    pub fn with_download_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn merger(&self) -> &Merger<M> {
        &self.merger
    }

    pub fn uploader(&self) -> &Uploader<C> {
        &self.uploader
    }

    /// Run the pipeline. Only a missing source URL (or an unusable HTTP
    /// client) is returned as an error; stage failures end in an [`Outcome`].
    pub async fn run(&self) -> Result<Outcome> {
        let source = self
            .settings
            .source_url
            .as_deref()
            .ok_or(Error::MissingSource)?;

        tokio::fs::create_dir_all(self.settings.output_dir()).await?;

        let downloader = Downloader::new(source, &self.settings.download_dir(), self.options.clone())?;
        let files = downloader.download_all(&self.settings.locations).await;

        if files.is_empty() {
            error!("No files were downloaded or found locally");
            return Ok(Outcome::NoInputs);
        }

        let Some(merged) = self.merger.merge(&files, &self.settings.output_path()).await else {
            error!("Failed to merge files");
            return Ok(Outcome::MergeFailed);
        };

        if !self.settings.s3_enabled {
            info!(
                "Upload to {} is disabled...",
                self.settings.storage.endpoint_url
            );
            return Ok(Outcome::UploadSkipped);
        }

        if self.uploader.upload(&merged, &self.settings.storage).await {
            info!("Process completed successfully");
            Ok(Outcome::Uploaded)
        } else {
            error!("Process completed with errors");
            Ok(Outcome::UploadFailed)
        }
    }
}
