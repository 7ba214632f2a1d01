//! Clinic service: the operations behind every menu entry.
//!
//! A [`ClinicService`] owns the visit and notes tables for the lifetime of a session.
//! Reads are served from memory; every mutation rewrites the affected files before it
//! returns. Nothing here checks who is asking; see [`crate::session`] for that.

use crate::config::CoreConfig;
use crate::query::{count_by_date, most_recent_visit, notes_for_visits, visit_ids_on};
use crate::records::{NoteRecord, VisitField, VisitRecord};
use crate::reporting::{ChartSink, StatisticsReport};
use crate::store::{NoteStore, VisitStore};
use crate::validation::validate_patient_id;
use crate::workflow::VisitDraft;
use crate::{ClinicError, ClinicResult};
use chrono::NaiveDate;
use clinic_ids::IdGenerator;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

/// Identifiers allocated for a stored visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVisit {
    pub patient_id: String,
    pub visit_id: String,
    pub note_id: String,
    /// True if this is the patient's first visit.
    pub new_patient: bool,
}

/// What a patient removal deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalSummary {
    pub patient_id: String,
    pub visits_removed: usize,
    pub notes_removed: usize,
}

pub struct ClinicService<R = StdRng> {
    cfg: Arc<CoreConfig>,
    visits: VisitStore,
    notes: NoteStore,
    ids: IdGenerator<R>,
}

impl ClinicService<StdRng> {
    /// Loads both tables from the configured data directory.
    ///
    /// Missing files are read as empty tables.
    pub fn open(cfg: Arc<CoreConfig>) -> ClinicResult<Self> {
        Self::open_with_ids(cfg, IdGenerator::new())
    }
}

impl<R: Rng> ClinicService<R> {
    /// Like [`ClinicService::open`], with a caller-supplied identifier generator.
    pub fn open_with_ids(cfg: Arc<CoreConfig>, ids: IdGenerator<R>) -> ClinicResult<Self> {
        let visits = VisitStore::load(cfg.visits_path())?;
        let notes = NoteStore::load(cfg.notes_path())?;
        tracing::info!(
            "opened clinic data in {} ({} visits, {} notes)",
            cfg.data_dir().display(),
            visits.len(),
            notes.len()
        );
        Ok(Self {
            cfg,
            visits,
            notes,
            ids,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn visits(&self) -> &[VisitRecord] {
        self.visits.records()
    }

    pub fn notes(&self) -> &[NoteRecord] {
        self.notes.records()
    }

    /// Stores a new visit and its note.
    ///
    /// Fresh Visit_ID and Note_ID values are drawn first, so an exhausted identifier
    /// space leaves both tables untouched. The visit table is saved before the notes.
    ///
    /// # Errors
    ///
    /// - `ClinicError::Ids` if no identifier is free
    /// - `ClinicError::FileWrite` / `ClinicError::Csv` if a save fails; memory and disk may
    ///   then disagree until the next [`ClinicService::reload`]
    pub fn add_visit(&mut self, draft: &VisitDraft) -> ClinicResult<NewVisit> {
        let visit_id = self.ids.generate(&self.visits.visit_ids())?;

        let mut note_ids = self.notes.note_ids();
        note_ids.extend(self.visits.note_ids());
        let note_id = self.ids.generate(&note_ids)?;

        let new_patient = !self.visits.patient_exists(&draft.patient_id);

        self.visits.append(draft.to_visit(&visit_id, &note_id));
        self.notes.append(NoteRecord {
            index: None,
            patient_id: draft.patient_id.clone(),
            visit_id: visit_id.clone(),
            note_id: note_id.clone(),
            text: draft.note_text.clone(),
        });

        self.visits.save()?;
        self.notes.save()?;

        tracing::info!(
            "added visit {} for patient {}{}",
            visit_id,
            draft.patient_id,
            if new_patient { " (new patient)" } else { "" }
        );

        Ok(NewVisit {
            patient_id: draft.patient_id.clone(),
            visit_id,
            note_id,
            new_patient,
        })
    }

    /// Deletes every visit and note of `patient_id` and saves both tables.
    ///
    /// # Errors
    ///
    /// - `ClinicError::InvalidInput` for a blank Patient ID
    /// - `ClinicError::PatientNotFound` if no visit carries the Patient ID
    pub fn remove_patient(&mut self, patient_id: &str) -> ClinicResult<RemovalSummary> {
        let patient_id = validate_patient_id(patient_id)?;
        if !self.visits.patient_exists(&patient_id) {
            return Err(ClinicError::PatientNotFound(patient_id));
        }

        let visits_removed = self.visits.retain(|v| v.patient_id != patient_id);
        let notes_removed = self.notes.retain(|n| n.patient_id != patient_id);

        self.visits.save()?;
        self.notes.save()?;

        tracing::info!(
            "removed patient {} ({} visits, {} notes)",
            patient_id,
            visits_removed,
            notes_removed
        );

        Ok(RemovalSummary {
            patient_id,
            visits_removed,
            notes_removed,
        })
    }

    /// The patient's visits in list order.
    pub fn retrieve_patient(&self, patient_id: &str) -> ClinicResult<Vec<&VisitRecord>> {
        let patient_id = validate_patient_id(patient_id)?;
        let visits = self.visits.get(&patient_id);
        if visits.is_empty() {
            return Err(ClinicError::PatientNotFound(patient_id));
        }
        Ok(visits)
    }

    /// Labelled values of `fields` for one of the patient's visits; blank values read `N/A`.
    pub fn visit_details(
        &self,
        patient_id: &str,
        visit_id: &str,
        fields: &[VisitField],
    ) -> ClinicResult<Vec<(&'static str, String)>> {
        let patient_id = validate_patient_id(patient_id)?;
        let visit = self
            .visits
            .find_visit(&patient_id, visit_id.trim())
            .ok_or_else(|| ClinicError::VisitNotFound(visit_id.to_string()))?;
        Ok(visit.details(fields))
    }

    pub fn count_visits_on(&self, date: NaiveDate) -> usize {
        count_by_date(self.visits.records(), date)
    }

    /// Notes attached to the patient's visits stored on `date`.
    ///
    /// # Errors
    ///
    /// - `ClinicError::NoVisitOnDate` if the patient has no visit stored on that date
    /// - `ClinicError::NoNotesForVisit` if those visits carry no notes
    pub fn notes_on(&self, patient_id: &str, date: NaiveDate) -> ClinicResult<Vec<&NoteRecord>> {
        let patient_id = validate_patient_id(patient_id)?;

        let visit_ids = visit_ids_on(self.visits.records(), &patient_id, date);
        if visit_ids.is_empty() {
            return Err(ClinicError::NoVisitOnDate { patient_id, date });
        }

        let notes = notes_for_visits(self.notes.records(), &patient_id, &visit_ids);
        if notes.is_empty() {
            return Err(ClinicError::NoNotesForVisit { patient_id, date });
        }
        Ok(notes)
    }

    pub fn most_recent_visit(&self, patient_id: &str) -> Option<&VisitRecord> {
        most_recent_visit(self.visits.records(), patient_id)
    }

    pub fn statistics(&self) -> StatisticsReport {
        StatisticsReport::from_records(self.visits.records())
    }

    /// Builds the statistics tables and renders them into `sink`.
    pub fn generate_statistics<S: ChartSink>(&self, sink: &mut S) -> ClinicResult<Vec<S::Output>> {
        self.statistics().generate_all(sink)
    }

    /// Re-reads both tables from disk, discarding in-memory state.
    ///
    /// Both files are read before anything is replaced, so a failed reload changes nothing.
    pub fn reload(&mut self) -> ClinicResult<()> {
        let visits = VisitStore::load(self.cfg.visits_path())?;
        let notes = NoteStore::load(self.cfg.notes_path())?;
        self.visits = visits;
        self.notes = notes;
        tracing::debug!("reloaded clinic data from {}", self.cfg.data_dir().display());
        Ok(())
    }
}
