//! Input validation utilities.
//!
//! Checks applied to user-supplied values before they reach a store.

use crate::constants::MAX_PATIENT_ID_LEN;
use crate::{ClinicError, ClinicResult};
use clinic_types::NonEmptyText;

/// Validates a patient identifier typed by a user and returns it trimmed.
///
/// Patient identifiers are free text and are matched exactly, so only the shape is checked:
/// - Rejects empty or whitespace-only strings
/// - Bounds the length to avoid pathological inputs
/// - Rejects control characters, which would corrupt a CSV row
///
/// # Errors
///
/// Returns `ClinicError::InvalidInput` if the identifier is invalid.
pub fn validate_patient_id(patient_id: &str) -> ClinicResult<String> {
    let text = NonEmptyText::new(patient_id)
        .map_err(|_| ClinicError::InvalidInput("please enter a Patient ID".into()))?;
    let trimmed = text.as_str();

    if trimmed.chars().count() > MAX_PATIENT_ID_LEN {
        return Err(ClinicError::InvalidInput(format!(
            "Patient ID exceeds maximum length of {} characters",
            MAX_PATIENT_ID_LEN
        )));
    }

    if trimmed.chars().any(char::is_control) {
        return Err(ClinicError::InvalidInput(
            "Patient ID contains control characters".into(),
        ));
    }

    Ok(text.into_string())
}

/// Trims a free-text form field, rejecting embedded line breaks.
pub(crate) fn clean_field(name: &str, value: &str) -> ClinicResult<String> {
    let trimmed = value.trim();
    if trimmed.contains(['\n', '\r']) {
        return Err(ClinicError::InvalidInput(format!(
            "{} must be a single line",
            name
        )));
    }
    Ok(trimmed.to_string())
}
