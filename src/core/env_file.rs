//! `KEY=value` env file loading
//!
//! Values are collected into a plain map rather than written to the process
//! environment, so callers decide what the effective variables are.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::core::error::{Error, Result};

/// How file values combine with variables that are already set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
    /// Only fill in keys that are not set yet (default)
    #[default]
    SetDefault,
    /// Replace existing values
    Override,
}

/// Parsed contents of an env file, in file order
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    path: PathBuf,
    entries: Vec<(String, String)>,
}

impl EnvFile {
    /// Load `candidate`, or `fallback` when the candidate is not a file
    pub fn load(candidate: &Path, fallback: &Path) -> Result<Self> {
        let path = if candidate.is_file() {
            candidate
        } else if fallback.is_file() {
            fallback
        } else {
            return Err(Error::ConfigNotFound {
                candidate: candidate.to_path_buf(),
                fallback: fallback.to_path_buf(),
            });
        };

        let env = Self::collect(path, dotenvy::from_path_iter(path)?)?;
        debug!("Loaded env file {}", path.display());
        Ok(env)
    }

    /// Parse env file contents that are already in memory
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        Self::collect(path, dotenvy::from_read_iter(contents.as_bytes()))
    }

    /// Keep the first occurrence of every key; warn about and skip lines
    /// that do not parse.
    fn collect<R: Read>(path: &Path, iter: dotenvy::Iter<R>) -> Result<Self> {
        let mut entries: Vec<(String, String)> = Vec::new();

        for item in iter {
            let (key, value) = match item {
                Ok(pair) => pair,
                Err(dotenvy::Error::LineParse(line, _)) => {
                    warn!(
                        "⚠️  Skipping malformed line in {}: '{line}'",
                        path.display()
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if entries.iter().any(|(existing, _)| *existing == key) {
                continue;
            }
            entries.push((key, value));
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge the file's values into `vars`
    pub fn apply(&self, vars: &mut HashMap<String, String>, mode: ApplyMode) {
        for (key, value) in &self.entries {
            match mode {
                ApplyMode::Override => {
                    vars.insert(key.clone(), value.clone());
                }
                ApplyMode::SetDefault => {
                    vars.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
        }
    }
}
