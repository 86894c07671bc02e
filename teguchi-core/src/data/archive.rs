//! Local archive index.
//!
//! Layout: `{dir}/{YYYY-MM-DD}.{extension}`
//!
//! A file's existence is the only completeness signal; contents are never
//! read back.

use super::provider::{date_key, SyncError};
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The per-date archive directory.
#[derive(Debug, Clone)]
pub struct LocalArchive {
    dir: PathBuf,
    extension: String,
}

impl LocalArchive {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// Root directory of the archive.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a date: `{YYYY-MM-DD}.{extension}`
    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("{}.{}", date_key(date), self.extension)
    }

    /// Full path of the archive entry for a date.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(self.file_name(date))
    }

    /// Create the archive directory if it does not exist yet.
    ///
    /// Returns `true` when the directory was created by this call.
    pub fn ensure_dir(&self) -> Result<bool, SyncError> {
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => return Ok(false),
            Ok(_) => {
                return Err(SyncError::archive(&self.dir, "exists but is not a directory"));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(SyncError::archive(&self.dir, e)),
        }

        tracing::info!(dir = %self.dir.display(), "data dir doesn't exist, creating it");
        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder
            .create(&self.dir)
            .map_err(|e| SyncError::archive(&self.dir, e))?;
        Ok(true)
    }

    /// Whether the entry for `date` has already been captured.
    ///
    /// "Not found" means missing; any other inspection failure is an error.
    pub fn contains(&self, date: NaiveDate) -> Result<bool, SyncError> {
        let path = self.path_for(date);
        match fs::metadata(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SyncError::archive(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, 3).unwrap()
    }

    #[test]
    fn names_files_by_date() {
        let archive = LocalArchive::new("data", "csv");
        assert_eq!(archive.file_name(date()), "2021-05-03.csv");
        assert_eq!(archive.path_for(date()), PathBuf::from("data/2021-05-03.csv"));
    }

    #[test]
    fn ensure_dir_creates_once() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = LocalArchive::new(tmp.path().join("data"), "csv");
        assert!(archive.ensure_dir().unwrap());
        assert!(!archive.ensure_dir().unwrap());
        assert!(archive.dir().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn ensure_dir_uses_0755() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let archive = LocalArchive::new(tmp.path().join("data"), "csv");
        archive.ensure_dir().unwrap();
        let mode = fs::metadata(archive.dir()).unwrap().permissions().mode() & 0o777;
        // umask may only clear bits
        assert_eq!(mode & !0o755, 0);
        assert_eq!(mode & 0o700, 0o700);
    }

    #[test]
    fn ensure_dir_rejects_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data");
        fs::write(&path, b"not a dir").unwrap();
        let archive = LocalArchive::new(&path, "csv");
        assert!(matches!(
            archive.ensure_dir().unwrap_err(),
            SyncError::Archive { .. }
        ));
    }

    #[test]
    fn contains_is_pure_existence() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = LocalArchive::new(tmp.path(), "csv");
        assert!(!archive.contains(date()).unwrap());

        // An empty file still counts as captured.
        fs::write(archive.path_for(date()), b"").unwrap();
        assert!(archive.contains(date()).unwrap());
    }

    #[test]
    fn contains_fails_when_dir_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data");
        fs::write(&path, b"not a dir").unwrap();
        let archive = LocalArchive::new(&path, "csv");
        assert!(matches!(
            archive.contains(date()).unwrap_err(),
            SyncError::Archive { .. }
        ));
    }
}
