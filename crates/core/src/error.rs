use crate::access::Action;
use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid date '{input}': please enter the date as {expected}")]
    InvalidDate {
        input: String,
        expected: &'static str,
    },
    #[error(
        "malformed record in {path} at line {line}: {reason}",
        path = path.display()
    )]
    MalformedRecord {
        path: std::path::PathBuf,
        line: u64,
        reason: String,
    },
    #[error("failed to read data file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write data file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to write table: {0}")]
    Csv(csv::Error),

    #[error("no patient found with ID {0}")]
    PatientNotFound(String),
    #[error("no visit found with ID {0}")]
    VisitNotFound(String),
    #[error("no visit found for patient {patient_id} on {date}")]
    NoVisitOnDate { patient_id: String, date: NaiveDate },
    #[error("no notes found for patient {patient_id} on {date}")]
    NoNotesForVisit { patient_id: String, date: NaiveDate },

    #[error("invalid credentials")]
    AuthenticationFailed,
    #[error("no user is logged in")]
    NotLoggedIn,
    #[error("role '{role}' is not permitted to {action}")]
    PermissionDenied { role: String, action: Action },

    #[error("this step expects {0}")]
    UnexpectedInput(&'static str),
    #[error("the workflow has already finished")]
    WorkflowFinished,

    #[error("identifier allocation failed: {0}")]
    Ids(#[from] clinic_ids::IdError),
    #[error("report artifact error: {0}")]
    Files(#[from] clinic_files::FilesError),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
