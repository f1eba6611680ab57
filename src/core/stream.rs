//! Streaming helpers for butterfly-mirror
//!
//! Wraps HTTP response bodies as `AsyncRead` and carries download options.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::TryStreamExt;
use tokio::io::{AsyncRead, ReadBuf};

/// Fixed chunk size used when writing extracts to disk
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

/// A response body read as a byte stream
pub struct DownloadStream(Box<dyn AsyncRead + Send + Unpin>);

impl AsyncRead for DownloadStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

/// Progress callback receiving `(downloaded, total)`; `total` is 0 when unknown
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Options for download operations
#[derive(Clone)]
pub struct DownloadOptions {
    /// Optional progress callback, called with `(0, total)` when a file starts
    pub progress: Option<ProgressCallback>,

    /// Chunk size for streaming to disk
    pub buffer_size: usize,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            progress: None,
            buffer_size: DOWNLOAD_CHUNK_SIZE,
        }
    }
}

impl std::fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("progress", &self.progress.is_some())
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}

/// Creates a DownloadStream from an HTTP response
pub fn create_http_stream(response: reqwest::Response) -> DownloadStream {
    let stream = tokio_util::io::StreamReader::new(
        response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
    );
    DownloadStream(Box::new(stream))
}
