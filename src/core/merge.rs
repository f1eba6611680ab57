//! Merging of regional extracts into a single PBF file
//!
//! The merge itself is delegated to a [`MergeBackend`]; [`OsmiumMerge`] runs
//! `osmium merge`, which handles entity ordering and de-duplication.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{error, info};
use tokio::process::Command;

use crate::core::error::{Error, Result};

/// Anything that can combine N extract files into one output file
#[async_trait]
pub trait MergeBackend: Send + Sync {
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<PathBuf>;
}

/// Merge backend that shells out to the osmium command-line tool
#[derive(Debug, Clone)]
pub struct OsmiumMerge {
    program: PathBuf,
}

impl OsmiumMerge {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for OsmiumMerge {
    fn default() -> Self {
        Self::new(crate::core::config::DEFAULT_OSMIUM_BIN)
    }
}

#[async_trait]
impl MergeBackend for OsmiumMerge {
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<PathBuf> {
        if inputs.is_empty() {
            return Err(Error::MergeFailed("no input files".to_string()));
        }

        let result = Command::new(&self.program)
            .arg("merge")
            .arg("--overwrite")
            .arg("--output")
            .arg(output)
            .args(inputs)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::MergeFailed(format!("could not run {}: {e}", self.program.display()))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::MergeFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                result.status,
                stderr.trim()
            )));
        }

        Ok(output.to_path_buf())
    }
}

/// What happened to a previous merge output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Deleted,
    NotFound,
    PermissionDenied,
    Failed(String),
}

/// Delete a previous merge output. Never fails; the outcome is logged.
pub fn clean_old_merge(path: &Path) -> CleanupOutcome {
    info!("Cleaning up old merged file..");

    let outcome = match std::fs::remove_file(path) {
        Ok(()) => CleanupOutcome::Deleted,
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => CleanupOutcome::NotFound,
            std::io::ErrorKind::PermissionDenied => CleanupOutcome::PermissionDenied,
            _ => CleanupOutcome::Failed(e.to_string()),
        },
    };

    match &outcome {
        CleanupOutcome::Deleted => info!("{} has been deleted successfully.", path.display()),
        CleanupOutcome::NotFound => error!("{} does not exist.", path.display()),
        CleanupOutcome::PermissionDenied => error!("Permission denied: {}.", path.display()),
        CleanupOutcome::Failed(msg) => error!("Error occurred: {msg}"),
    }

    outcome
}

/// Runs a merge backend after clearing the previous output
pub struct Merger<B> {
    backend: B,
}

impl<B: MergeBackend> Merger<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Merge `inputs` into `output`. Returns `None` when the merge failed.
    pub async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Option<PathBuf> {
        info!("Starting merge process");

        clean_old_merge(output);

        if let Some(parent) = output.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                error!("Failed to create {}: {e}", parent.display());
            }
        }

        for input in inputs {
            info!("Processing {}", input.display());
        }

        match self.backend.merge(inputs, output).await {
            Ok(merged) => {
                info!("Successfully merged files into {}", merged.display());
                Some(merged)
            }
            Err(e) => {
                error!("Failed to merge files: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records calls and writes a marker file instead of merging
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<(Vec<PathBuf>, PathBuf, bool)>>,
        fail: bool,
    }

    #[async_trait]
    impl MergeBackend for RecordingBackend {
        async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<PathBuf> {
            let output_existed = output.is_file();
            self.calls
                .lock()
                .unwrap()
                .push((inputs.to_vec(), output.to_path_buf(), output_existed));

            if self.fail {
                return Err(Error::MergeFailed("simulated".to_string()));
            }
            Ok(output.to_path_buf())
        }
    }

    #[test]
    fn test_clean_old_merge_outcomes() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("all.osm.pbf");

        assert_eq!(clean_old_merge(&output), CleanupOutcome::NotFound);

        std::fs::write(&output, b"old").unwrap();
        assert_eq!(clean_old_merge(&output), CleanupOutcome::Deleted);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_merge_deletes_stale_output_first() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("openstreetmap").join("all.osm.pbf");
        std::fs::create_dir_all(output.parent().unwrap()).unwrap();
        std::fs::write(&output, b"stale merge").unwrap();

        let inputs = vec![dir.path().join("togo.pbf"), dir.path().join("benin.pbf")];
        let merger = Merger::new(RecordingBackend::default());

        let merged = merger.merge(&inputs, &output).await;

        assert_eq!(merged, Some(output.clone()));
        let calls = merger.backend().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, inputs);
        assert!(!calls[0].2, "Stale output should be gone before the backend runs");
    }

    #[tokio::test]
    async fn test_merge_proceeds_when_cleanup_fails() {
        let dir = tempdir().unwrap();
        // A directory cannot be removed with remove_file
        let output = dir.path().join("all.osm.pbf");
        std::fs::create_dir(&output).unwrap();

        let outcome = clean_old_merge(&output);
        assert!(!matches!(outcome, CleanupOutcome::Deleted | CleanupOutcome::NotFound));

        let merger = Merger::new(RecordingBackend::default());
        merger.merge(&[dir.path().join("togo.pbf")], &output).await;

        assert_eq!(merger.backend().calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_merge_failure_returns_none() {
        let dir = tempdir().unwrap();
        let merger = Merger::new(RecordingBackend {
            fail: true,
            ..Default::default()
        });

        let merged = merger
            .merge(&[dir.path().join("togo.pbf")], &dir.path().join("all.osm.pbf"))
            .await;
        assert_eq!(merged, None);
    }

    #[tokio::test]
    async fn test_osmium_rejects_empty_inputs() {
        let dir = tempdir().unwrap();
        let result = OsmiumMerge::default()
            .merge(&[], &dir.path().join("all.osm.pbf"))
            .await;

        match result {
            Err(Error::MergeFailed(msg)) => assert!(msg.contains("no input")),
            other => panic!("Expected MergeFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_osmium_missing_binary() {
        let dir = tempdir().unwrap();
        let backend = OsmiumMerge::new(dir.path().join("no-such-osmium"));
        let result = backend
            .merge(&[dir.path().join("togo.pbf")], &dir.path().join("all.osm.pbf"))
            .await;

        match result {
            Err(Error::MergeFailed(msg)) => assert!(msg.contains("could not run")),
            other => panic!("Expected MergeFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    fn fake_osmium(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let program = dir.join("osmium");
        std::fs::write(&program, script).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        program
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_osmium_arguments() {
        let dir = tempdir().unwrap();
        let args_file = dir.path().join("args.txt");
        let program = fake_osmium(
            dir.path(),
            &format!("#!/bin/sh\necho \"$@\" > {}\n", args_file.display()),
        );

        let inputs = vec![dir.path().join("a.pbf"), dir.path().join("b.pbf")];
        let output = dir.path().join("all.osm.pbf");
        let merged = OsmiumMerge::new(program).merge(&inputs, &output).await.unwrap();

        assert_eq!(merged, output);
        let args = std::fs::read_to_string(&args_file).unwrap();
        assert_eq!(
            args.trim(),
            format!(
                "merge --overwrite --output {} {} {}",
                output.display(),
                inputs[0].display(),
                inputs[1].display()
            )
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_osmium_failure_reports_stderr() {
        let dir = tempdir().unwrap();
        let program = fake_osmium(dir.path(), "#!/bin/sh\necho 'input not sorted' >&2\nexit 1\n");

        let result = OsmiumMerge::new(program)
            .merge(&[dir.path().join("a.pbf")], &dir.path().join("all.osm.pbf"))
            .await;

        match result {
            Err(Error::MergeFailed(msg)) => assert!(msg.contains("input not sorted")),
            other => panic!("Expected MergeFailed, got {other:?}"),
        }
    }
}
