//! Error types for butterfly-mirror
//!
//! Fatal configuration errors are surfaced to the binary, everything else is
//! logged by the stage that produced it.

use std::fmt;
use std::path::PathBuf;

/// Main error type for butterfly-mirror operations
#[derive(Debug)]
pub enum Error {
    /// Neither the candidate nor the fallback env file could be read
    ConfigNotFound { candidate: PathBuf, fallback: PathBuf },

    /// `OSM_SOURCE` is unset or empty
    MissingSource,

    /// Location entry that is not `region/country`
    InvalidLocation(String),

    /// A setting whose value could not be parsed
    InvalidSetting { key: String, value: String },

    /// Storage configuration that cannot produce a client
    InvalidConfig(String),

    /// HTTP-specific error (non-2xx status, malformed response)
    HttpError(String),

    /// Network connectivity issues
    NetworkError(String),

    /// The merge backend failed to produce an output file
    MergeFailed(String),

    /// Object storage failure
    StorageError(object_store::Error),

    /// Invalid parameters passed to an operation
    InvalidInput(String),

    /// File I/O error
    IoError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigNotFound { candidate, fallback } => {
                write!(
                    f,
                    "Unable to load env vars: neither {} nor {} is a readable file",
                    candidate.display(),
                    fallback.display()
                )
            }
            Error::MissingSource => {
                write!(f, "Incorrect download URL: OSM_SOURCE is not set")
            }
            Error::InvalidLocation(location) => {
                write!(f, "Invalid location '{location}': expected 'region/country'")
            }
            Error::InvalidSetting { key, value } => {
                write!(f, "Invalid value for {key}: '{value}'")
            }
            Error::InvalidConfig(msg) => {
                write!(f, "Invalid configuration: {msg}")
            }
            Error::HttpError(msg) => {
                write!(f, "HTTP error: {msg}")
            }
            Error::NetworkError(msg) => {
                write!(f, "Network error: {msg}")
            }
            Error::MergeFailed(msg) => {
                write!(f, "Merge failed: {msg}")
            }
            Error::StorageError(err) => {
                write!(f, "Storage error: {err}")
            }
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {msg}")
            }
            Error::IoError(err) => {
                write!(f, "I/O error: {err}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            Error::StorageError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::NetworkError(err.to_string())
        } else {
            Error::HttpError(err.to_string())
        }
    }
}

impl From<dotenvy::Error> for Error {
    fn from(err: dotenvy::Error) -> Self {
        match err {
            dotenvy::Error::Io(err) => Error::IoError(err),
            other => Error::InvalidConfig(other.to_string()),
        }
    }
}

impl From<object_store::Error> for Error {
    fn from(err: object_store::Error) -> Self {
        Error::StorageError(err)
    }
}

/// Convenience result type for butterfly-mirror operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_both_config_paths() {
        let err = Error::ConfigNotFound {
            candidate: PathBuf::from(".osm.env"),
            fallback: PathBuf::from(".env"),
        };
        let message = err.to_string();
        assert!(message.contains(".osm.env"));
        assert!(message.contains(".env"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("I/O error"));
    }
}
