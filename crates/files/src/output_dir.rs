//! Dated output folders.

use crate::constants::DATE_LABEL_FORMAT;
use crate::FilesError;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// A folder named `<prefix> MM-DD-YYYY` under an output root.
///
/// Running twice on the same day reuses the same folder.
#[derive(Debug, Clone)]
pub struct DatedOutputDir {
    path: PathBuf,
}

impl DatedOutputDir {
    /// Creates (or reuses) the dated folder for `date` under `root`.
    ///
    /// `root` is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `prefix` is empty or contains a path separator
    /// - the folder cannot be created (I/O)
    pub fn create(root: &Path, prefix: &str, date: NaiveDate) -> Result<Self, FilesError> {
        let path = Self::locate(root, prefix, date)?;
        fs::create_dir_all(&path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create output folder {}: {}", path.display(), e),
            ))
        })?;

        Ok(Self { path })
    }

    /// Path of the dated folder for `date` under `root`, without touching the filesystem.
    pub fn locate(root: &Path, prefix: &str, date: NaiveDate) -> Result<PathBuf, FilesError> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(FilesError::InvalidPath(
                "folder prefix cannot be empty".into(),
            ));
        }
        if prefix.contains(['/', '\\']) || prefix == "." || prefix == ".." {
            return Err(FilesError::InvalidPath(format!(
                "folder prefix must be a single path component: {}",
                prefix
            )));
        }

        Ok(root.join(format!("{} {}", prefix, date.format(DATE_LABEL_FORMAT))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside this folder.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}
