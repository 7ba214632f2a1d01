//! Folder and file naming for generated artifacts.

/// Date layout used in artifact folder and file names (`MM-DD-YYYY`).
pub const DATE_LABEL_FORMAT: &str = "%m-%d-%Y";

/// Timestamp layout written to the action log.
pub const ACTION_TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

/// Folder prefix for chart tables.
pub const STATISTICS_FOLDER_PREFIX: &str = "Management Statistics";

/// Folder prefix for the user action log.
pub const USER_STATISTICS_FOLDER_PREFIX: &str = "User Statistics";

/// File name prefix for the user action log.
pub const ACTION_LOG_FILE_PREFIX: &str = "user_statistics";

/// Header row of the action log.
pub const ACTION_LOG_HEADER: [&str; 4] = ["Username", "Role", "Action", "Timestamp"];

/// Header row of every chart table.
pub const CHART_TABLE_HEADER: [&str; 2] = ["category", "count"];
