//! Step-by-step workflows for adding a visit and removing a patient.
//!
//! Each workflow is a finite set of states. A step takes the current state and one piece
//! of user input and yields the next state plus an effect for the caller to apply. The
//! transitions themselves never touch a store, so a front end can drive them from any
//! kind of prompt and a cancelled or failed step leaves no trace.
//!
//! ```text
//! CollectPatientId --PatientId(existing)--> CollectFields (prefilled)
//! CollectPatientId --PatientId(unknown)---> ConfirmCreate
//! ConfirmCreate    --Confirm(true)--------> CollectFields (blank)
//! ConfirmSubmit    --Confirm(true)--------> Done, Persist(draft)
//! any              --Cancel---------------> Cancelled
//! ```

use crate::dates::{format_visit_date, parse_user_date};
use crate::query::most_recent_visit;
use crate::records::VisitRecord;
use crate::validation::{clean_field, validate_patient_id};
use crate::{ClinicError, ClinicResult};
use serde::Serialize;

/// The fields a user fills in for a new visit.
///
/// `visit_date` is typed as `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitForm {
    pub department: String,
    pub visit_date: String,
    pub race: String,
    pub gender: String,
    pub ethnicity: String,
    pub age: String,
    pub zip_code: String,
    pub insurance: String,
    pub chief_complaint: String,
    pub note_type: String,
    pub note_text: String,
}

impl VisitForm {
    /// A form carrying over the demographics of `visit`.
    pub fn prefilled_from(visit: &VisitRecord) -> Self {
        Self {
            race: visit.race.clone(),
            gender: visit.gender.clone(),
            ethnicity: visit.ethnicity.clone(),
            age: visit.age.clone(),
            ..Default::default()
        }
    }

    /// Checks the form and converts it into a draft for `patient_id`.
    ///
    /// # Errors
    ///
    /// - `ClinicError::InvalidDate` if `visit_date` is not `YYYY-MM-DD`
    /// - `ClinicError::InvalidInput` if a field spans several lines
    pub fn validate(&self, patient_id: &str) -> ClinicResult<VisitDraft> {
        let date = parse_user_date(&self.visit_date)?;
        Ok(VisitDraft {
            patient_id: validate_patient_id(patient_id)?,
            visit_time: format_visit_date(date),
            department: clean_field("Department", &self.department)?,
            race: clean_field("Race", &self.race)?,
            gender: clean_field("Gender", &self.gender)?,
            ethnicity: clean_field("Ethnicity", &self.ethnicity)?,
            age: clean_field("Age", &self.age)?,
            zip_code: clean_field("Zip code", &self.zip_code)?,
            insurance: clean_field("Insurance", &self.insurance)?,
            chief_complaint: clean_field("Chief complaint", &self.chief_complaint)?,
            note_type: clean_field("Note type", &self.note_type)?,
            note_text: self.note_text.trim().to_string(),
        })
    }
}

/// A validated visit, ready to be stored. `visit_time` is already `M/D/YYYY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitDraft {
    pub patient_id: String,
    pub visit_time: String,
    pub department: String,
    pub race: String,
    pub gender: String,
    pub ethnicity: String,
    pub age: String,
    pub zip_code: String,
    pub insurance: String,
    pub chief_complaint: String,
    pub note_type: String,
    pub note_text: String,
}

impl VisitDraft {
    /// Builds the visit row for the allocated identifiers.
    pub fn to_visit(&self, visit_id: &str, note_id: &str) -> VisitRecord {
        VisitRecord {
            patient_id: self.patient_id.clone(),
            visit_id: visit_id.to_string(),
            visit_time: self.visit_time.clone(),
            visit_department: self.department.clone(),
            race: self.race.clone(),
            gender: self.gender.clone(),
            ethnicity: self.ethnicity.clone(),
            age: self.age.clone(),
            zip_code: self.zip_code.clone(),
            insurance: self.insurance.clone(),
            chief_complaint: self.chief_complaint.clone(),
            note_id: note_id.to_string(),
            note_type: self.note_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddVisitState {
    CollectPatientId,
    ConfirmCreate {
        patient_id: String,
    },
    CollectFields {
        patient_id: String,
        prefill: VisitForm,
        new_patient: bool,
    },
    ConfirmSubmit {
        draft: VisitDraft,
    },
    Done,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddVisitInput {
    PatientId(String),
    Confirm(bool),
    Fields(VisitForm),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddVisitEffect {
    None,
    Persist(VisitDraft),
}

/// One add-visit step. `visits` is consulted for patient existence and prefill only.
///
/// # Errors
///
/// - `ClinicError::WorkflowFinished` once the workflow is `Done` or `Cancelled`
/// - `ClinicError::UnexpectedInput` if the input does not belong to the current step
/// - validation errors from [`validate_patient_id`] and [`VisitForm::validate`]
pub fn add_visit_transition(
    state: &AddVisitState,
    input: AddVisitInput,
    visits: &[VisitRecord],
) -> ClinicResult<(AddVisitState, AddVisitEffect)> {
    use AddVisitInput as In;
    use AddVisitState as St;

    match (state, input) {
        (St::Done | St::Cancelled, _) => Err(ClinicError::WorkflowFinished),
        (_, In::Cancel) => Ok((St::Cancelled, AddVisitEffect::None)),

        (St::CollectPatientId, In::PatientId(raw)) => {
            let patient_id = validate_patient_id(&raw)?;
            let next = match most_recent_visit(visits, &patient_id) {
                Some(latest) => St::CollectFields {
                    prefill: VisitForm::prefilled_from(latest),
                    patient_id,
                    new_patient: false,
                },
                None => St::ConfirmCreate { patient_id },
            };
            Ok((next, AddVisitEffect::None))
        }
        (St::CollectPatientId, _) => Err(ClinicError::UnexpectedInput("a Patient ID")),

        (St::ConfirmCreate { patient_id }, In::Confirm(true)) => Ok((
            St::CollectFields {
                patient_id: patient_id.clone(),
                prefill: VisitForm::default(),
                new_patient: true,
            },
            AddVisitEffect::None,
        )),
        (St::ConfirmCreate { .. }, In::Confirm(false)) => Ok((St::Cancelled, AddVisitEffect::None)),
        (St::ConfirmCreate { .. }, _) => Err(ClinicError::UnexpectedInput("a yes or no answer")),

        (St::CollectFields { patient_id, .. }, In::Fields(form)) => {
            let draft = form.validate(patient_id)?;
            Ok((St::ConfirmSubmit { draft }, AddVisitEffect::None))
        }
        (St::CollectFields { .. }, _) => Err(ClinicError::UnexpectedInput("the visit form")),

        (St::ConfirmSubmit { draft }, In::Confirm(true)) => {
            Ok((St::Done, AddVisitEffect::Persist(draft.clone())))
        }
        (St::ConfirmSubmit { .. }, In::Confirm(false)) => Ok((St::Cancelled, AddVisitEffect::None)),
        (St::ConfirmSubmit { .. }, _) => Err(ClinicError::UnexpectedInput("a yes or no answer")),
    }
}

/// Add-visit workflow that keeps its state across steps.
///
/// A step that fails leaves the state unchanged, so the user can retry it.
#[derive(Debug, Clone)]
pub struct AddVisitWorkflow {
    state: AddVisitState,
}

impl Default for AddVisitWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl AddVisitWorkflow {
    pub fn new() -> Self {
        Self {
            state: AddVisitState::CollectPatientId,
        }
    }

    pub fn state(&self) -> &AddVisitState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, AddVisitState::Done | AddVisitState::Cancelled)
    }

    /// Starting values for the visit form, once the form is being collected.
    pub fn prefill(&self) -> Option<&VisitForm> {
        match &self.state {
            AddVisitState::CollectFields { prefill, .. } => Some(prefill),
            _ => None,
        }
    }

    pub fn step(&mut self, input: AddVisitInput, visits: &[VisitRecord]) -> ClinicResult<AddVisitEffect> {
        let (next, effect) = add_visit_transition(&self.state, input, visits)?;
        self.commit(next);
        Ok(effect)
    }

    /// Moves to a state computed by [`add_visit_transition`] once its effect has been applied.
    pub(crate) fn commit(&mut self, next: AddVisitState) {
        self.state = next;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovePatientState {
    CollectPatientId,
    ConfirmRemoval { patient_id: String },
    Done,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovePatientInput {
    PatientId(String),
    Confirm(bool),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovePatientEffect {
    None,
    Remove(String),
}

/// One remove-patient step.
///
/// # Errors
///
/// - `ClinicError::InvalidInput` for a blank Patient ID
/// - `ClinicError::PatientNotFound` if no visit carries the Patient ID
/// - `ClinicError::UnexpectedInput` / `ClinicError::WorkflowFinished` as for add-visit
pub fn remove_patient_transition(
    state: &RemovePatientState,
    input: RemovePatientInput,
    visits: &[VisitRecord],
) -> ClinicResult<(RemovePatientState, RemovePatientEffect)> {
    use RemovePatientInput as In;
    use RemovePatientState as St;

    match (state, input) {
        (St::Done | St::Cancelled, _) => Err(ClinicError::WorkflowFinished),
        (_, In::Cancel) => Ok((St::Cancelled, RemovePatientEffect::None)),

        (St::CollectPatientId, In::PatientId(raw)) => {
            let patient_id = validate_patient_id(&raw)?;
            if !visits.iter().any(|v| v.patient_id == patient_id) {
                return Err(ClinicError::PatientNotFound(patient_id));
            }
            Ok((St::ConfirmRemoval { patient_id }, RemovePatientEffect::None))
        }
        (St::CollectPatientId, _) => Err(ClinicError::UnexpectedInput("a Patient ID")),

        (St::ConfirmRemoval { patient_id }, In::Confirm(true)) => {
            Ok((St::Done, RemovePatientEffect::Remove(patient_id.clone())))
        }
        (St::ConfirmRemoval { .. }, In::Confirm(false)) => {
            Ok((St::Cancelled, RemovePatientEffect::None))
        }
        (St::ConfirmRemoval { .. }, _) => Err(ClinicError::UnexpectedInput("a yes or no answer")),
    }
}

#[derive(Debug, Clone)]
pub struct RemovePatientWorkflow {
    state: RemovePatientState,
}

impl Default for RemovePatientWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl RemovePatientWorkflow {
    pub fn new() -> Self {
        Self {
            state: RemovePatientState::CollectPatientId,
        }
    }

    pub fn state(&self) -> &RemovePatientState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            RemovePatientState::Done | RemovePatientState::Cancelled
        )
    }

    pub fn step(
        &mut self,
        input: RemovePatientInput,
        visits: &[VisitRecord],
    ) -> ClinicResult<RemovePatientEffect> {
        let (next, effect) = remove_patient_transition(&self.state, input, visits)?;
        self.commit(next);
        Ok(effect)
    }

    pub(crate) fn commit(&mut self, next: RemovePatientState) {
        self.state = next;
    }
}
