//! Authentication and role-based authorization.
//!
//! Credentials come from a plaintext CSV table (`username,password,role`). A role maps to
//! a fixed set of [`Action`]s; anything outside that set is denied.

use crate::records::CredentialEntry;
use crate::store::load_table;
use crate::ClinicResult;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A user's role as stored in the credentials table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Clinician,
    Nurse,
    Management,
    /// Any role the application does not know. It is permitted nothing.
    Other(String),
}

impl Role {
    /// Maps a stored role name to a `Role`. Names are case-sensitive.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "admin" => Role::Admin,
            "clinician" => Role::Clinician,
            "nurse" => Role::Nurse,
            "management" => Role::Management,
            other => Role::Other(other.to_string()),
        }
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Role::from_name(s))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Clinician => write!(f, "clinician"),
            Role::Nurse => write!(f, "nurse"),
            Role::Management => write!(f, "management"),
            Role::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Add,
    Remove,
    Retrieve,
    View,
    Count,
    Statistics,
    ActionLog,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Add,
        Action::Remove,
        Action::Retrieve,
        Action::View,
        Action::Count,
        Action::Statistics,
        Action::ActionLog,
    ];

    /// Short name, as used in menus and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Remove => "remove",
            Action::Retrieve => "retrieve",
            Action::View => "view",
            Action::Count => "count",
            Action::Statistics => "statistics",
            Action::ActionLog => "action-log",
        }
    }

    /// Label written to the action log when the action is performed.
    pub fn tracked_label(&self) -> &'static str {
        match self {
            Action::Add => "Added Patient Visit",
            Action::Remove => "Removed Patient",
            Action::Retrieve => "Retrieved Patient",
            Action::View => "Viewed Notes",
            Action::Count => "Counted Visits",
            Action::Statistics => "Generated Graphs",
            Action::ActionLog => "Viewed User Statistics",
        }
    }

    /// One-line menu description.
    pub fn description(&self) -> &'static str {
        match self {
            Action::Add => "add a patient visit",
            Action::Remove => "remove a patient and all their records",
            Action::Retrieve => "retrieve a patient's visits",
            Action::View => "view notes for a visit date",
            Action::Count => "count visits on a date",
            Action::Statistics => "generate key statistics",
            Action::ActionLog => "view today's user actions",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = crate::ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Action::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| crate::ClinicError::InvalidInput(format!("unknown action '{}'", s)))
    }
}

/// Actions permitted for `role`, in menu order.
pub fn allowed_actions(role: &Role) -> &'static [Action] {
    match role {
        Role::Admin => &[Action::Count],
        Role::Clinician | Role::Nurse => &[
            Action::Add,
            Action::Remove,
            Action::Retrieve,
            Action::View,
            Action::Count,
        ],
        Role::Management => &[Action::Statistics, Action::ActionLog],
        Role::Other(_) => &[],
    }
}

pub fn authorize(role: &Role, action: Action) -> bool {
    allowed_actions(role).contains(&action)
}

/// The loaded credentials table.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: Vec<CredentialEntry>,
}

impl CredentialStore {
    /// Loads credentials from `path`. A missing file gives an empty table.
    pub fn load(path: &Path) -> ClinicResult<Self> {
        let entries = load_table(path)?;
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<CredentialEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Role of the first entry matching both username and password exactly.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<Role> {
        self.entries
            .iter()
            .find(|e| e.username == username && e.password == password)
            .map(|e| Role::from_name(&e.role))
    }
}
