//! Clinic Report Artifacts
//!
//! This crate owns everything the clinic tools write *besides* the visit and note tables:
//!
//! - Dated output folders, created fresh per run (`<root>/<prefix> MM-DD-YYYY/`)
//! - Chart tables handed to an external renderer, one CSV per chart
//! - The append-only user action log
//!
//! ## Layout
//!
//! ```text
//! <output_root>/
//! ├── Management Statistics 03-14-2026/
//! │   ├── chief_complaints.csv
//! │   ├── department_visits.csv
//! │   └── visits_per_year.csv
//! └── User Statistics 03-14-2026/
//!     └── user_statistics_03-14-2026.csv
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use clinic_files::ActionLog;
//! use chrono::Local;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let log = ActionLog::open(Path::new("."), Local::now().date_naive())?;
//! log.track("bob", "nurse", "Logged In")?;
//! # Ok(())
//! # }
//! ```

mod action_log;
mod charts;
mod constants;
mod output_dir;

pub use action_log::{ActionLog, ActionRecord};
pub use charts::{ChartArtifact, ChartArtifacts, ChartKind};
pub use constants::{
    ACTION_LOG_FILE_PREFIX, DATE_LABEL_FORMAT, STATISTICS_FOLDER_PREFIX,
    USER_STATISTICS_FOLDER_PREFIX,
};
pub use output_dir::DatedOutputDir;

/// Errors that can occur while writing or reading artifacts
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Path validation failed (empty name or embedded separator)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
