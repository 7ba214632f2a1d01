//! # Clinic Core
//!
//! Core business logic for the clinic visit records system.
//!
//! This crate contains the data operations behind every front end:
//! - CSV-backed record stores for visits, notes and credentials
//! - Date-based queries, most-recent-visit lookup and note retrieval
//! - Aggregate statistics handed to a chart sink
//! - Role-based access control and the action log
//! - Step-by-step add-visit and remove-patient workflows
//!
//! Configuration is resolved once at startup into a [`CoreConfig`] and passed in; nothing
//! here reads the process environment.
//!
//! **No UI concerns**: prompting, menus and argument parsing belong in `clinic-cli` and
//! the `clinic-run` binary.

pub mod access;
pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod query;
pub mod records;
pub mod reporting;
pub mod service;
pub mod session;
pub mod store;
pub mod validation;
pub mod workflow;

pub use access::{allowed_actions, authorize, Action, CredentialStore, Role};
pub use config::CoreConfig;
pub use error::{ClinicError, ClinicResult};
pub use records::{CredentialEntry, NoteRecord, VisitField, VisitRecord};
pub use reporting::{ChartSink, StatisticsReport};
pub use service::{ClinicService, NewVisit, RemovalSummary};
pub use session::{LoggedInUser, Session};
pub use store::{NoteStore, RecordStore, VisitStore};
pub use workflow::{
    AddVisitEffect, AddVisitInput, AddVisitState, AddVisitWorkflow, RemovePatientEffect,
    RemovePatientInput, RemovePatientState, RemovePatientWorkflow, VisitDraft, VisitForm,
};
