//! Record types for the clinic tables.
//!
//! Each table has a fixed schema. Column names match the CSV headers exactly; any column
//! missing from a file is read as an empty string, and unknown columns are ignored.

use serde::{Deserialize, Serialize};

/// One clinical encounter. Identity is `visit_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitRecord {
    #[serde(rename = "Patient_ID")]
    pub patient_id: String,
    #[serde(rename = "Visit_ID")]
    pub visit_id: String,
    /// Date of the visit in one of several textual layouts, usually `M/D/YYYY`.
    #[serde(rename = "Visit_time")]
    pub visit_time: String,
    #[serde(rename = "Visit_department")]
    pub visit_department: String,
    #[serde(rename = "Race")]
    pub race: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Ethnicity")]
    pub ethnicity: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Zip_code")]
    pub zip_code: String,
    #[serde(rename = "Insurance")]
    pub insurance: String,
    #[serde(rename = "Chief_complaint")]
    pub chief_complaint: String,
    #[serde(rename = "Note_ID")]
    pub note_id: String,
    #[serde(rename = "Note_type")]
    pub note_type: String,
}

/// A free-text note attached to exactly one visit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteRecord {
    /// Positional row number; rewritten as 1..N on every save.
    #[serde(
        rename = "",
        alias = "Entry_ID",
        deserialize_with = "csv::invalid_option"
    )]
    pub index: Option<u64>,
    #[serde(rename = "Patient_ID")]
    pub patient_id: String,
    #[serde(rename = "Visit_ID")]
    pub visit_id: String,
    #[serde(rename = "Note_ID")]
    pub note_id: String,
    #[serde(rename = "Note_text", alias = "Note")]
    pub text: String,
}

/// A row of the credentials table.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialEntry {
    pub username: String,
    pub password: String,
    pub role: String,
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Visit fields a user can pick to view after retrieving a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitField {
    Gender,
    Race,
    Age,
    Ethnicity,
    Insurance,
    ZipCode,
    ChiefComplaint,
    NoteId,
    NoteType,
}

impl VisitField {
    pub const ALL: [VisitField; 9] = [
        VisitField::Gender,
        VisitField::Race,
        VisitField::Age,
        VisitField::Ethnicity,
        VisitField::Insurance,
        VisitField::ZipCode,
        VisitField::ChiefComplaint,
        VisitField::NoteId,
        VisitField::NoteType,
    ];

    /// Display label, e.g. `Chief complaint`.
    pub fn label(&self) -> &'static str {
        match self {
            VisitField::Gender => "Gender",
            VisitField::Race => "Race",
            VisitField::Age => "Age",
            VisitField::Ethnicity => "Ethnicity",
            VisitField::Insurance => "Insurance",
            VisitField::ZipCode => "Zip code",
            VisitField::ChiefComplaint => "Chief complaint",
            VisitField::NoteId => "Note ID",
            VisitField::NoteType => "Note type",
        }
    }
}

impl std::str::FromStr for VisitField {
    type Err = crate::ClinicError;

    /// Accepts the CSV column name or the display label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['_', '-'], " ").to_lowercase();
        VisitField::ALL
            .into_iter()
            .find(|f| f.label().to_lowercase() == wanted)
            .ok_or_else(|| crate::ClinicError::InvalidInput(format!("unknown visit field '{}'", s)))
    }
}

impl VisitRecord {
    pub fn field(&self, field: VisitField) -> &str {
        match field {
            VisitField::Gender => &self.gender,
            VisitField::Race => &self.race,
            VisitField::Age => &self.age,
            VisitField::Ethnicity => &self.ethnicity,
            VisitField::Insurance => &self.insurance,
            VisitField::ZipCode => &self.zip_code,
            VisitField::ChiefComplaint => &self.chief_complaint,
            VisitField::NoteId => &self.note_id,
            VisitField::NoteType => &self.note_type,
        }
    }

    /// Labelled values of the selected fields; blank values show as `N/A`.
    pub fn details(&self, fields: &[VisitField]) -> Vec<(&'static str, String)> {
        fields
            .iter()
            .map(|f| {
                let value = self.field(*f).trim();
                let value = if value.is_empty() { "N/A" } else { value };
                (f.label(), value.to_string())
            })
            .collect()
    }

    /// One-line summary used when listing a patient's visits.
    pub fn summary(&self) -> String {
        format!(
            "ID: {}, Time: {}, Dept: {}",
            self.visit_id, self.visit_time, self.visit_department
        )
    }
}
