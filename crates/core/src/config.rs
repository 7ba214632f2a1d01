//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Front ends read environment variables (and `.env`) exactly once
//! and hand the raw values to [`CoreConfig::from_env_values`]; nothing in the core reads the
//! process environment while handling a request.

use crate::constants::{
    CREDENTIALS_FILENAME, DEFAULT_DATA_DIR, DEFAULT_OUTPUT_DIR, NOTES_FILENAME, VISITS_FILENAME,
};
use crate::{ClinicError, ClinicResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    output_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// A data directory that does not exist is accepted: every table in it is then treated
    /// as empty until the first save creates it.
    pub fn new(data_dir: PathBuf, output_dir: PathBuf) -> ClinicResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(ClinicError::InvalidInput(
                "data directory cannot be empty".into(),
            ));
        }
        if output_dir.as_os_str().is_empty() {
            return Err(ClinicError::InvalidInput(
                "output directory cannot be empty".into(),
            ));
        }
        if data_dir.exists() && !data_dir.is_dir() {
            return Err(ClinicError::InvalidInput(format!(
                "data directory is not a directory: {}",
                data_dir.display()
            )));
        }
        if !data_dir.exists() {
            tracing::warn!(
                "data directory {} does not exist; starting with empty tables",
                data_dir.display()
            );
        }

        Ok(Self {
            data_dir,
            output_dir,
        })
    }

    /// Build a configuration from optional raw environment values.
    ///
    /// Missing or whitespace-only values fall back to the defaults.
    pub fn from_env_values(
        data_dir: Option<String>,
        output_dir: Option<String>,
    ) -> ClinicResult<Self> {
        Self::new(
            dir_from_env_value(data_dir, DEFAULT_DATA_DIR),
            dir_from_env_value(output_dir, DEFAULT_OUTPUT_DIR),
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn visits_path(&self) -> PathBuf {
        self.data_dir.join(VISITS_FILENAME)
    }

    pub fn notes_path(&self) -> PathBuf {
        self.data_dir.join(NOTES_FILENAME)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join(CREDENTIALS_FILENAME)
    }
}

fn dir_from_env_value(value: Option<String>, default: &str) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
