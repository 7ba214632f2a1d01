//! Chart tables for the management statistics report.
//!
//! Drawing the charts is left to an external renderer. This module writes the data each
//! chart needs as a two-column CSV (`category,count`) into the day's statistics folder.

use crate::constants::{CHART_TABLE_HEADER, STATISTICS_FOLDER_PREFIX};
use crate::output_dir::DatedOutputDir;
use crate::FilesError;
use chrono::NaiveDate;
use clinic_types::FrequencyTable;
use std::path::{Path, PathBuf};

/// How the renderer should draw a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::Line => write!(f, "line"),
        }
    }
}

/// A chart table that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    pub path: PathBuf,
    pub kind: ChartKind,
    pub title: String,
    pub rows: usize,
}

/// Writer for the chart tables of one statistics run.
#[derive(Debug)]
pub struct ChartArtifacts {
    dir: DatedOutputDir,
}

impl ChartArtifacts {
    /// Creates the `Management Statistics MM-DD-YYYY` folder under `root`.
    pub fn create(root: &Path, date: NaiveDate) -> Result<Self, FilesError> {
        let dir = DatedOutputDir::create(root, STATISTICS_FOLDER_PREFIX, date)?;
        Ok(Self { dir })
    }

    pub fn directory(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `table` to `<file_stem>.csv`, replacing any earlier table of the same name.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if the stem is not a plain file name or the write fails.
    pub fn write_table(
        &self,
        file_stem: &str,
        kind: ChartKind,
        table: &FrequencyTable,
    ) -> Result<ChartArtifact, FilesError> {
        if file_stem.trim().is_empty() || file_stem.contains(['/', '\\', '.']) {
            return Err(FilesError::InvalidPath(format!(
                "chart name must be a plain file stem: '{}'",
                file_stem
            )));
        }

        let path = self.dir.file(&format!("{}.csv", file_stem));
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(CHART_TABLE_HEADER)?;
        for (category, count) in table.entries() {
            writer.write_record([category.as_str(), count.to_string().as_str()])?;
        }
        writer.flush()?;

        tracing::info!(
            "wrote {} chart '{}' ({} rows) to {}",
            kind,
            table.title(),
            table.len(),
            path.display()
        );

        Ok(ChartArtifact {
            path,
            kind,
            title: table.title().to_string(),
            rows: table.len(),
        })
    }
}
