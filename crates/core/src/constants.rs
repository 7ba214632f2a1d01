//! Constants used throughout the clinic core crate.
//!
//! File names, environment variable names, date layouts and report names live here so
//! that the CSV schema and artifact names stay consistent across the codebase.

/// Default directory holding the visit, notes and credentials tables.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default root under which dated report folders are created.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CLINIC_DATA_DIR";

/// Environment variable overriding the output root.
pub const OUTPUT_DIR_ENV: &str = "CLINIC_OUTPUT_DIR";

/// Filename of the patient/visit table.
pub const VISITS_FILENAME: &str = "Patient_data.csv";

/// Filename of the notes table.
pub const NOTES_FILENAME: &str = "Notes.csv";

/// Filename of the credentials table.
pub const CREDENTIALS_FILENAME: &str = "Credentials.csv";

/// Layout for dates typed by users.
pub const USER_DATE_FORMAT: &str = "%Y-%m-%d";

/// Human-readable form of [`USER_DATE_FORMAT`] for error messages.
pub const USER_DATE_HINT: &str = "YYYY-MM-DD";

/// Visit_time layouts accepted by the strict date-count query.
pub const VISIT_DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%m-%d-%Y"];

/// Visit_time layouts with a time-of-day suffix accepted by the strict date-count query.
pub const VISIT_DATETIME_FORMATS: [&str; 2] = ["%m/%d/%Y %H:%M:%S", "%m-%d-%Y %H:%M:%S"];

/// Department category used when a visit has none.
pub const UNKNOWN_DEPARTMENT: &str = "Unknown";

/// Role recorded in the action log for failed logins.
pub const UNKNOWN_ROLE: &str = "Unknown";

/// Chart table names written by the statistics report.
pub const COMPLAINTS_CHART: &str = "chief_complaints";
pub const DEPARTMENTS_CHART: &str = "department_visits";
pub const YEARLY_CHART: &str = "visits_per_year";

/// Maximum accepted length of a patient identifier.
pub const MAX_PATIENT_ID_LEN: usize = 64;
