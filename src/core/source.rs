//! Source resolution logic for butterfly-mirror
//!
//! Maps configured `region/country` locations to remote URLs and local files.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result};

/// File extension of regional extracts
pub const EXTRACT_EXTENSION: &str = "osm.pbf";

/// A `region/country` pair such as `africa/togo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    region: String,
    country: String,
}

impl Location {
    /// Parse a single `region/country` entry
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        match trimmed.split_once('/') {
            Some((region, country))
                if !region.is_empty() && !country.is_empty() && !country.contains('/') =>
            {
                Ok(Self {
                    region: region.to_string(),
                    country: country.to_string(),
                })
            }
            _ => Err(Error::InvalidLocation(trimmed.to_string())),
        }
    }

    /// Parse a comma-separated list, ignoring empty entries
    pub fn parse_list(raw: &str) -> Result<Vec<Self>> {
        raw.split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.country)
    }
}

/// Everything needed to fetch one location in this run
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadJob {
    pub location: Location,
    pub path: PathBuf,
    pub url: String,
}

impl DownloadJob {
    pub fn new(location: &Location, base_url: &str, download_dir: &Path) -> Self {
        Self {
            location: location.clone(),
            path: download_dir.join(resolve_output_filename(location)),
            url: resolve_url(base_url, location),
        }
    }
}

/// Builds `{base_url}/{region}/{country}-latest.osm.pbf`
pub fn resolve_url(base_url: &str, location: &Location) -> String {
    format!(
        "{}/{}/{}-latest.{EXTRACT_EXTENSION}",
        base_url.trim_end_matches('/'),
        location.region,
        location.country
    )
}

/// Generates the local filename for a location
pub fn resolve_output_filename(location: &Location) -> String {
    format!("{}-latest.{EXTRACT_EXTENSION}", location.country)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        let location = Location::parse("africa/togo").unwrap();
        assert_eq!(location.region(), "africa");
        assert_eq!(location.country(), "togo");
        assert_eq!(location.to_string(), "africa/togo");
    }

    #[test]
    fn test_parse_location_trims_whitespace() {
        let location = Location::parse("  europe/monaco ").unwrap();
        assert_eq!(location.to_string(), "europe/monaco");
    }

    #[test]
    fn test_parse_location_rejects_wrong_separator_count() {
        for raw in ["togo", "africa/", "/togo", "africa/west/togo", ""] {
            match Location::parse(raw) {
                Err(Error::InvalidLocation(_)) => {}
                other => panic!("Expected InvalidLocation for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_list_skips_empty_entries() {
        let locations = Location::parse_list("africa/togo, africa/benin,").unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[1].country(), "benin");
    }

    #[test]
    fn test_resolve_url() {
        let location = Location::parse("africa/togo").unwrap();
        assert_eq!(
            resolve_url("https://download.geofabrik.de", &location),
            "https://download.geofabrik.de/africa/togo-latest.osm.pbf"
        );
        assert_eq!(
            resolve_url("https://download.geofabrik.de/", &location),
            "https://download.geofabrik.de/africa/togo-latest.osm.pbf"
        );
    }

    #[test]
    fn test_download_job_paths() {
        let location = Location::parse("europe/belgium").unwrap();
        let job = DownloadJob::new(&location, "http://mirror", Path::new("/data/osm_downloads"));

        assert_eq!(job.path, PathBuf::from("/data/osm_downloads/belgium-latest.osm.pbf"));
        assert_eq!(job.url, "http://mirror/europe/belgium-latest.osm.pbf");
    }
}
