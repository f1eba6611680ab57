//! Decides whether a local extract must be fetched again.

use std::path::Path;
use std::time::SystemTime;

/// Extracts older than this many whole days are refreshed
pub const MAX_AGE_DAYS: u64 = 7;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// True if `path` is missing or at least [`MAX_AGE_DAYS`] old
pub fn needs_download(path: &Path) -> bool {
    needs_download_at(path, SystemTime::now())
}

/// [`needs_download`] against an explicit clock
pub fn needs_download_at(path: &Path, now: SystemTime) -> bool {
    let modified = match std::fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(modified) => modified,
        Err(_) => return true,
    };

    // mtime in the future counts as fresh
    match now.duration_since(modified) {
        Ok(age) => age.as_secs() / SECS_PER_DAY >= MAX_AGE_DAYS,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::tempdir;

    const DAY: Duration = Duration::from_secs(SECS_PER_DAY);

    fn file_modified_at(dir: &Path, name: &str, modified: SystemTime) -> std::path::PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(modified).unwrap();
        path
    }

    #[test]
    fn test_missing_file_needs_download() {
        let dir = tempdir().unwrap();
        assert!(needs_download(&dir.path().join("togo-latest.osm.pbf")));
    }

    #[test]
    fn test_exactly_seven_days_needs_download() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        let path = file_modified_at(dir.path(), "old.pbf", now - 7 * DAY);

        assert!(needs_download_at(&path, now));
    }

    #[test]
    fn test_older_than_seven_days_needs_download() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        let path = file_modified_at(dir.path(), "older.pbf", now - 30 * DAY);

        assert!(needs_download_at(&path, now));
    }

    #[test]
    fn test_just_under_seven_days_is_fresh() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        let path = file_modified_at(dir.path(), "recent.pbf", now - 7 * DAY + Duration::from_secs(60));

        assert!(!needs_download_at(&path, now));
    }

    #[test]
    fn test_new_file_is_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.pbf");
        std::fs::write(&path, b"pbf").unwrap();

        assert!(!needs_download(&path));
    }

    #[test]
    fn test_future_mtime_is_fresh() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        let path = file_modified_at(dir.path(), "future.pbf", now + DAY);

        assert!(!needs_download_at(&path, now));
    }
}
