//! Core download functionality for butterfly-mirror
//!
//! Refreshes each configured extract with a single streaming GET when the
//! local copy is missing or stale.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info, warn};
use reqwest::{Client, ClientBuilder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::core::error::{Error, Result};
use crate::core::freshness::needs_download;
use crate::core::source::{DownloadJob, Location};
use crate::core::stream::{create_http_stream, DownloadOptions};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum silence between two body reads
const READ_TIMEOUT: Duration = Duration::from_secs(60);

fn build_client() -> Result<Client> {
    ClientBuilder::new()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(READ_TIMEOUT)
        .tcp_keepalive(Duration::from_secs(60))
        .user_agent(format!("butterfly-mirror/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::HttpError(format!("Failed to create HTTP client: {e}")))
}

/// Sequential downloader for regional extracts
pub struct Downloader {
    client: Client,
    base_url: String,
    download_dir: PathBuf,
    options: DownloadOptions,
}

impl Downloader {
    /// Create a downloader for `base_url` writing into `download_dir`
    pub fn new(base_url: &str, download_dir: &Path, options: DownloadOptions) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.to_string(),
            download_dir: download_dir.to_path_buf(),
            options,
        })
    }

    /// Jobs this downloader would run for `locations`, in order
    pub fn jobs(&self, locations: &[Location]) -> Vec<DownloadJob> {
        locations
            .iter()
            .map(|location| DownloadJob::new(location, &self.base_url, &self.download_dir))
            .collect()
    }

    /// Refresh every location and return the local paths available for merging.
    ///
    /// A path is returned when its file exists after the attempt: it was fresh,
    /// it was just downloaded, or the refresh failed but a stale copy remains.
    /// Locations whose first download fails are left out.
    pub async fn download_all(&self, locations: &[Location]) -> Vec<PathBuf> {
        let mut available = Vec::with_capacity(locations.len());

        if let Err(e) = tokio::fs::create_dir_all(&self.download_dir).await {
            error!(
                "Failed to create download directory {}: {e}",
                self.download_dir.display()
            );
        }

        for job in self.jobs(locations) {
            if needs_download(&job.path) {
                info!("Downloading OSM file for {}", job.location);
                match self.download_job(&job).await {
                    Ok(bytes) => {
                        info!("Successfully downloaded {} OSM data ({bytes} bytes)", job.location);
                    }
                    Err(e) => {
                        error!("Failed to download {} OSM data: {e}", job.location);
                    }
                }
            } else {
                debug!("{} is fresh, skipping download", job.path.display());
            }

            if job.path.is_file() {
                available.push(job.path);
            } else {
                warn!(
                    "⚠️  No local copy of {} is available, leaving it out of the merge",
                    job.location
                );
            }
        }

        available
    }

    /// Fetch one job into `{path}.part` and move it over `path` on success
    pub async fn download_job(&self, job: &DownloadJob) -> Result<u64> {
        let partial = partial_path(&job.path);

        let result = match self.fetch_to(&job.url, &partial).await {
            Ok(bytes) => tokio::fs::rename(&partial, &job.path)
                .await
                .map(|()| bytes)
                .map_err(Error::from),
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("⚠️  Could not remove {}: {cleanup}", partial.display());
                }
            }
        }
        result
    }

    async fn fetch_to(&self, url: &str, target: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::HttpError(format!("Failed to download {url}: {status}")));
        }

        let total_size = response.content_length().unwrap_or(0);
        let mut stream = create_http_stream(response);
        let mut file = tokio::fs::File::create(target).await?;
        let mut buffer = vec![0u8; self.options.buffer_size];
        let mut downloaded = 0u64;

        if let Some(ref progress) = self.options.progress {
            progress(0, total_size);
        }

        loop {
            let bytes_read = stream
                .read(&mut buffer)
                .await
                .map_err(|e| Error::NetworkError(format!("Stream read error: {e}")))?;

            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read]).await?;
            downloaded += bytes_read as u64;

            if let Some(ref progress) = self.options.progress {
                progress(downloaded, total_size);
            }
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(downloaded)
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
