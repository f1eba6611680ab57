//! # Butterfly-mirror Library
//!
//! Keeps a local mirror of regional OpenStreetMap extracts current, merges
//! them into a single PBF file and optionally pushes the result to
//! S3-compatible object storage.
//!
//! ## Pipeline
//!
//! 1. Each configured `region/country` extract is downloaded when the local
//!    copy is missing or at least seven days old.
//! 2. All available extracts are merged with `osmium merge`.
//! 3. The merged file is uploaded under its base name when `S3_ENABLED` is set.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vars = HashMap::from([
//!         ("OSM_SOURCE".to_string(), "https://download.geofabrik.de".to_string()),
//!         ("OSM_LOCATIONS".to_string(), "europe/monaco,europe/andorra".to_string()),
//!         ("DATA_DIR".to_string(), "./data".to_string()),
//!     ]);
//!
//!     let settings = butterfly_mirror::Settings::from_vars(&vars)?;
//!     let outcome = butterfly_mirror::run(settings).await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

pub use crate::core::config::{Settings, StorageConfig};
pub use crate::core::downloader::Downloader;
pub use crate::core::env_file::{ApplyMode, EnvFile};
pub use crate::core::error::{Error, Result};
pub use crate::core::freshness::needs_download;
pub use crate::core::merge::{MergeBackend, Merger, OsmiumMerge};
pub use crate::core::pipeline::{Outcome, Pipeline};
pub use crate::core::source::{DownloadJob, Location};
pub use crate::core::stream::{DownloadOptions, ProgressCallback};
pub use crate::core::upload::{S3Connector, StorageConnector, Uploader};

pub mod core;

/// Pipeline using `osmium` for merging and S3 for uploads
pub fn default_pipeline(settings: Settings) -> Pipeline<OsmiumMerge, S3Connector> {
    let merger = Merger::new(OsmiumMerge::new(settings.osmium_bin.clone()));
    Pipeline::new(settings, merger, Uploader::new(S3Connector))
}

/// Run the default pipeline once
///
/// Returns `Err` only for fatal problems such as a missing `OSM_SOURCE`;
/// download, merge and upload failures are logged and reported as an
/// [`Outcome`].
pub async fn run(settings: Settings) -> Result<Outcome> {
    default_pipeline(settings).run().await
}
