//! Append-only log of user actions.
//!
//! One row per tracked action: who did it, under which role, what they did and when.
//! The log lives in a per-day folder and is created with its header on first use.

use crate::constants::{
    ACTION_LOG_FILE_PREFIX, ACTION_LOG_HEADER, ACTION_TIMESTAMP_FORMAT, DATE_LABEL_FORMAT,
    USER_STATISTICS_FOLDER_PREFIX,
};
use crate::output_dir::DatedOutputDir;
use crate::FilesError;
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// A single row of the action log.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Role")]
    pub role: String,
    #[serde(rename = "Action")]
    pub action: String,
    /// Local time formatted as `MM-DD-YYYY HH:MM:SS`
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
}

/// Handle to the per-day action log files under one output root.
///
/// Each action goes to the file of the day it was stamped with, so a log kept open past
/// midnight starts a new day's file.
#[derive(Debug, Clone)]
pub struct ActionLog {
    root: PathBuf,
}

impl ActionLog {
    /// Opens the log under `root` and makes sure the file for `date` exists with its header.
    ///
    /// Files are `<root>/User Statistics MM-DD-YYYY/user_statistics_MM-DD-YYYY.csv`.
    pub fn open(root: &Path, date: NaiveDate) -> Result<Self, FilesError> {
        let log = Self {
            root: root.to_path_buf(),
        };
        log.prepare(date)?;
        Ok(log)
    }

    /// Path of the log file for `date`.
    pub fn path_on(&self, date: NaiveDate) -> Result<PathBuf, FilesError> {
        let dir = DatedOutputDir::locate(&self.root, USER_STATISTICS_FOLDER_PREFIX, date)?;
        Ok(dir.join(Self::file_name(date)))
    }

    fn file_name(date: NaiveDate) -> String {
        format!(
            "{}_{}.csv",
            ACTION_LOG_FILE_PREFIX,
            date.format(DATE_LABEL_FORMAT)
        )
    }

    /// Creates the folder, file and header for `date` as needed.
    fn prepare(&self, date: NaiveDate) -> Result<PathBuf, FilesError> {
        let dir = DatedOutputDir::create(&self.root, USER_STATISTICS_FOLDER_PREFIX, date)?;
        let path = dir.file(&Self::file_name(date));

        let needs_header = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(FilesError::Io(e)),
        };

        if needs_header {
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(ACTION_LOG_HEADER)?;
            writer.flush()?;
            tracing::debug!("created action log {}", path.display());
        }

        Ok(path)
    }

    /// Appends an action stamped with the current local time.
    pub fn track(&self, username: &str, role: &str, action: &str) -> Result<ActionRecord, FilesError> {
        self.track_at(username, role, action, Local::now().naive_local())
    }

    /// Appends an action stamped with `at` to the file of `at`'s day.
    pub fn track_at(
        &self,
        username: &str,
        role: &str,
        action: &str,
        at: NaiveDateTime,
    ) -> Result<ActionRecord, FilesError> {
        let record = ActionRecord {
            username: username.to_string(),
            role: role.to_string(),
            action: action.to_string(),
            timestamp: at.format(ACTION_TIMESTAMP_FORMAT).to_string(),
        };

        let path = self.prepare(at.date())?;
        let file = OpenOptions::new().append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(&record)?;
        writer.flush()?;

        tracing::info!("{} ({}): {}", record.username, record.role, record.action);
        Ok(record)
    }

    /// Today's actions in the order they were written.
    pub fn entries(&self) -> Result<Vec<ActionRecord>, FilesError> {
        self.entries_on(Local::now().date_naive())
    }

    /// Actions logged on `date`; a day without a file has none.
    pub fn entries_on(&self, date: NaiveDate) -> Result<Vec<ActionRecord>, FilesError> {
        let path = self.path_on(date)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut entries = Vec::new();
        for row in reader.deserialize() {
            entries.push(row?);
        }
        Ok(entries)
    }
}
