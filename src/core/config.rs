//! Runtime settings for butterfly-mirror
//!
//! `Settings` is built once from the effective variables and passed
//! explicitly to the pipeline.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::core::error::{Error, Result};
use crate::core::source::Location;

pub const DEFAULT_DATA_DIR: &str = "./";
pub const DEFAULT_LOCATIONS: &str = "africa/togo,africa/benin";
pub const DEFAULT_S3_REGION: &str = "auto";
pub const DEFAULT_OSMIUM_BIN: &str = "osmium";

/// Sub-directory of `DATA_DIR` holding regional extracts
pub const DOWNLOAD_SUBDIR: &str = "osm_downloads";
/// Sub-directory of `DATA_DIR` holding the merged file
pub const OUTPUT_SUBDIR: &str = "openstreetmap";
/// Base name of the merged file
pub const OUTPUT_NAME: &str = "all";

/// Connection settings for S3-compatible storage
#[derive(Clone, PartialEq, Eq, Default)]
pub struct StorageConfig {
    pub bucket_name: String,
    pub endpoint_url: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub region: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket_name", &self.bucket_name)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Effective configuration for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub locations: Vec<Location>,
    pub source_url: Option<String>,
    pub s3_enabled: bool,
    pub storage: StorageConfig,
    pub osmium_bin: PathBuf,
}

impl Settings {
    /// Build settings from a variable map (process env merged with the env file)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let var = |key: &str| lookup(vars, key);

        let data_dir = PathBuf::from(var("DATA_DIR").unwrap_or(DEFAULT_DATA_DIR));
        let source_url = var("OSM_SOURCE")
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        // A missing source is reported before any other setting
        let locations = match Location::parse_list(var("OSM_LOCATIONS").unwrap_or(DEFAULT_LOCATIONS)) {
            Ok(locations) => locations,
            Err(_) if source_url.is_none() => return Err(Error::MissingSource),
            Err(e) => return Err(e),
        };

        let s3_enabled = match var("S3_ENABLED") {
            Some(raw) => parse_bool("S3_ENABLED", raw)?,
            None => false,
        };

        let endpoint_url = match var("S3_ENDPOINT_URL") {
            Some(url) => url.to_string(),
            None => var("S3_ACCOUNT_ID")
                .filter(|id| !id.is_empty())
                .map(r2_endpoint)
                .unwrap_or_default(),
        };

        let storage = StorageConfig {
            bucket_name: var("S3_BUCKET_NAME").unwrap_or_default().to_string(),
            endpoint_url,
            access_key_id: var("S3_ACCESS_KEY_ID").unwrap_or_default().to_string(),
            access_key_secret: var("S3_ACCESS_KEY_SECRET").unwrap_or_default().to_string(),
            region: var("S3_REGION").unwrap_or(DEFAULT_S3_REGION).to_string(),
        };

        Ok(Self {
            data_dir,
            locations,
            source_url,
            s3_enabled,
            storage,
            osmium_bin: PathBuf::from(var("OSMIUM_BIN").unwrap_or(DEFAULT_OSMIUM_BIN)),
        })
    }

    /// `{DATA_DIR}/osm_downloads`
    pub fn download_dir(&self) -> PathBuf {
        self.data_dir.join(DOWNLOAD_SUBDIR)
    }

    /// `{DATA_DIR}/openstreetmap`
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join(OUTPUT_SUBDIR)
    }

    /// `{DATA_DIR}/openstreetmap/all.osm.pbf`
    pub fn output_path(&self) -> PathBuf {
        self.output_dir()
            .join(format!("{OUTPUT_NAME}.{}", crate::core::source::EXTRACT_EXTENSION))
    }
}

fn lookup<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(String::as_str)
}

/// Cloudflare R2 endpoint for an account
pub fn r2_endpoint(account_id: &str) -> String {
    format!("https://{account_id}.r2.cloudflarestorage.com")
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::InvalidSetting {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
