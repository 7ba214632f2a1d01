//! Logged-in sessions.
//!
//! A [`Session`] pairs a [`ClinicService`] with the credentials table and the action log.
//! Every operation checks the current user's role before it reaches the service and records
//! a line in the action log once permitted.
//!
//! Writing the action log is best effort: a failure is logged with `warn!` and never blocks
//! the operation being tracked.

use crate::access::{allowed_actions, authorize, Action, CredentialStore, Role};
use crate::config::CoreConfig;
use crate::constants::UNKNOWN_ROLE;
use crate::records::{NoteRecord, VisitField, VisitRecord};
use crate::service::{ClinicService, NewVisit, RemovalSummary};
use crate::workflow::{
    add_visit_transition, remove_patient_transition, AddVisitEffect, AddVisitInput,
    AddVisitWorkflow, RemovePatientEffect, RemovePatientInput, RemovePatientWorkflow,
};
use crate::{ClinicError, ClinicResult};
use chrono::{Local, NaiveDate};
use clinic_files::{ActionLog, ActionRecord, ChartArtifact, ChartArtifacts};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

const LOGGED_IN: &str = "Logged In";
const FAILED_LOGIN: &str = "Failed Login";
const LOGGED_OUT: &str = "Logged Out";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedInUser {
    pub username: String,
    pub role: Role,
}

pub struct Session<R = StdRng> {
    service: ClinicService<R>,
    credentials: CredentialStore,
    log: ActionLog,
    user: Option<LoggedInUser>,
}

impl Session<StdRng> {
    /// Opens the clinic data, credentials and today's action log for `cfg`.
    pub fn open(cfg: Arc<CoreConfig>) -> ClinicResult<Self> {
        let credentials = CredentialStore::load(&cfg.credentials_path())?;
        let log = ActionLog::open(cfg.output_dir(), Local::now().date_naive())?;
        let service = ClinicService::open(cfg)?;
        Ok(Self::new(service, credentials, log))
    }
}

impl<R: Rng> Session<R> {
    pub fn new(service: ClinicService<R>, credentials: CredentialStore, log: ActionLog) -> Self {
        Self {
            service,
            credentials,
            log,
            user: None,
        }
    }

    pub fn service(&self) -> &ClinicService<R> {
        &self.service
    }

    pub fn current_user(&self) -> Option<&LoggedInUser> {
        self.user.as_ref()
    }

    /// Menu for the logged-in role; empty when nobody is logged in.
    pub fn available_actions(&self) -> &'static [Action] {
        self.user
            .as_ref()
            .map(|u| allowed_actions(&u.role))
            .unwrap_or(&[])
    }

    /// Logs `username` in, replacing any current user.
    ///
    /// Both outcomes are written to the action log; a failed attempt is recorded with
    /// the role `Unknown`.
    pub fn login(&mut self, username: &str, password: &str) -> ClinicResult<Role> {
        match self.credentials.authenticate(username, password) {
            Some(role) => {
                self.track(username, &role.to_string(), LOGGED_IN);
                self.user = Some(LoggedInUser {
                    username: username.to_string(),
                    role: role.clone(),
                });
                Ok(role)
            }
            None => {
                self.track(username, UNKNOWN_ROLE, FAILED_LOGIN);
                Err(ClinicError::AuthenticationFailed)
            }
        }
    }

    pub fn logout(&mut self) -> ClinicResult<LoggedInUser> {
        let user = self.user.take().ok_or(ClinicError::NotLoggedIn)?;
        self.track(&user.username, &user.role.to_string(), LOGGED_OUT);
        Ok(user)
    }

    pub fn count_visits_on(&self, date: NaiveDate) -> ClinicResult<usize> {
        self.gate(Action::Count)?;
        Ok(self.service.count_visits_on(date))
    }

    pub fn retrieve_patient(&self, patient_id: &str) -> ClinicResult<Vec<&VisitRecord>> {
        self.gate(Action::Retrieve)?;
        self.service.retrieve_patient(patient_id)
    }

    /// Field values of one visit. Part of a retrieval, so it is not tracked separately.
    pub fn visit_details(
        &self,
        patient_id: &str,
        visit_id: &str,
        fields: &[VisitField],
    ) -> ClinicResult<Vec<(&'static str, String)>> {
        self.check(Action::Retrieve)?;
        self.service.visit_details(patient_id, visit_id, fields)
    }

    pub fn notes_on(&self, patient_id: &str, date: NaiveDate) -> ClinicResult<Vec<&NoteRecord>> {
        self.gate(Action::View)?;
        self.service.notes_on(patient_id, date)
    }

    pub fn begin_add_visit(&self) -> ClinicResult<AddVisitWorkflow> {
        self.gate(Action::Add)?;
        Ok(AddVisitWorkflow::new())
    }

    /// Advances `workflow` and stores the visit when the user confirms it.
    ///
    /// Returns the new identifiers on the confirming step and `None` otherwise. If storing
    /// fails the workflow stays on the confirmation.
    pub fn step_add_visit(
        &mut self,
        workflow: &mut AddVisitWorkflow,
        input: AddVisitInput,
    ) -> ClinicResult<Option<NewVisit>> {
        self.check(Action::Add)?;
        let (next, effect) = add_visit_transition(workflow.state(), input, self.service.visits())?;
        let added = match effect {
            AddVisitEffect::Persist(draft) => Some(self.service.add_visit(&draft)?),
            AddVisitEffect::None => None,
        };
        workflow.commit(next);
        Ok(added)
    }

    pub fn begin_remove_patient(&self) -> ClinicResult<RemovePatientWorkflow> {
        self.gate(Action::Remove)?;
        Ok(RemovePatientWorkflow::new())
    }

    pub fn step_remove_patient(
        &mut self,
        workflow: &mut RemovePatientWorkflow,
        input: RemovePatientInput,
    ) -> ClinicResult<Option<RemovalSummary>> {
        self.check(Action::Remove)?;
        let (next, effect) =
            remove_patient_transition(workflow.state(), input, self.service.visits())?;
        let removed = match effect {
            RemovePatientEffect::Remove(patient_id) => Some(self.service.remove_patient(&patient_id)?),
            RemovePatientEffect::None => None,
        };
        workflow.commit(next);
        Ok(removed)
    }

    /// Writes the statistics tables into today's `Management Statistics` folder.
    pub fn generate_statistics(&self) -> ClinicResult<Vec<ChartArtifact>> {
        self.gate(Action::Statistics)?;
        let today = Local::now().date_naive();
        let mut sink = ChartArtifacts::create(self.service.config().output_dir(), today)?;
        self.service.generate_statistics(&mut sink)
    }

    /// Today's action log, including the line recording this call.
    pub fn action_log_entries(&self) -> ClinicResult<Vec<ActionRecord>> {
        self.gate(Action::ActionLog)?;
        Ok(self.log.entries()?)
    }

    /// Re-reads the clinic tables from disk.
    pub fn reload(&mut self) -> ClinicResult<()> {
        self.user.as_ref().ok_or(ClinicError::NotLoggedIn)?;
        self.service.reload()
    }

    fn check(&self, action: Action) -> ClinicResult<&LoggedInUser> {
        let user = self.user.as_ref().ok_or(ClinicError::NotLoggedIn)?;
        if !authorize(&user.role, action) {
            tracing::warn!("{} ({}) denied {}", user.username, user.role, action);
            return Err(ClinicError::PermissionDenied {
                role: user.role.to_string(),
                action,
            });
        }
        Ok(user)
    }

    fn gate(&self, action: Action) -> ClinicResult<()> {
        let user = self.check(action)?;
        self.track(&user.username, &user.role.to_string(), action.tracked_label());
        Ok(())
    }

    fn track(&self, username: &str, role: &str, label: &str) {
        if let Err(e) = self.log.track(username, role, label) {
            tracing::warn!("failed to record '{}' for {}: {}", label, username, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{AddVisitState, VisitForm};
    use clinic_ids::IdGenerator;
    use rand::SeedableRng;
    use std::fs;
    use tempfile::TempDir;

    const VISITS_CSV: &str = "\
Patient_ID,Visit_ID,Visit_time,Visit_department,Race,Gender,Ethnicity,Age,Zip_code,Insurance,Chief_complaint,Note_ID,Note_type
1,100001,1/2/2020,ER,White,F,Not Hispanic,34,02139,Aetna,Cough,200001,Progress
2,100002,1/2/2020,ER,Black,M,Hispanic,61,10001,Medicare,Fever,200002,Progress
";

    const CREDENTIALS_CSV: &str = "\
username,password,role
bob,x,nurse
ann,a,admin
mia,m,management
";

    fn setup() -> (TempDir, Session) {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("Patient_data.csv"), VISITS_CSV).unwrap();
        fs::write(data.join("Credentials.csv"), CREDENTIALS_CSV).unwrap();

        let cfg = Arc::new(CoreConfig::new(data, temp.path().join("out")).unwrap());
        let session = Session::open(cfg).unwrap();
        (temp, session)
    }

    /// A session whose id generator has no free Visit_ID left.
    fn exhausted_session(temp: &TempDir) -> Session {
        let data = temp.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("Patient_data.csv"), VISITS_CSV).unwrap();
        fs::write(data.join("Credentials.csv"), CREDENTIALS_CSV).unwrap();
        let cfg = Arc::new(CoreConfig::new(data, temp.path().join("out")).unwrap());

        let ids = IdGenerator::with_range(StdRng::seed_from_u64(3), 100_001, 100_002).unwrap();
        let service = ClinicService::open_with_ids(cfg.clone(), ids).unwrap();
        let credentials = CredentialStore::load(&cfg.credentials_path()).unwrap();
        let log = ActionLog::open(cfg.output_dir(), ymd(2024, 5, 6)).unwrap();
        Session::new(service, credentials, log)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn logged_actions(session: &Session) -> Vec<String> {
        session
            .log
            .entries()
            .unwrap()
            .into_iter()
            .map(|r| format!("{}|{}|{}", r.username, r.role, r.action))
            .collect()
    }

    #[test]
    fn test_login_and_logout_are_tracked() {
        let (_temp, mut session) = setup();
        assert!(matches!(
            session.login("bob", "wrong"),
            Err(ClinicError::AuthenticationFailed)
        ));
        assert_eq!(session.login("bob", "x").unwrap(), Role::Nurse);
        session.logout().unwrap();

        assert_eq!(
            logged_actions(&session),
            vec![
                "bob|Unknown|Failed Login",
                "bob|nurse|Logged In",
                "bob|nurse|Logged Out"
            ]
        );
        assert!(matches!(session.logout(), Err(ClinicError::NotLoggedIn)));
    }

    #[test]
    fn test_operations_require_login() {
        let (_temp, session) = setup();
        assert!(matches!(
            session.count_visits_on(ymd(2020, 1, 2)),
            Err(ClinicError::NotLoggedIn)
        ));
        assert!(session.available_actions().is_empty());
    }

    #[test]
    fn test_admin_can_only_count() {
        let (_temp, mut session) = setup();
        session.login("ann", "a").unwrap();
        assert_eq!(session.available_actions(), &[Action::Count]);
        assert_eq!(session.count_visits_on(ymd(2020, 1, 2)).unwrap(), 2);

        let err = session.retrieve_patient("1").unwrap_err();
        assert!(matches!(
            err,
            ClinicError::PermissionDenied { action: Action::Retrieve, .. }
        ));
        assert_eq!(
            logged_actions(&session),
            vec!["ann|admin|Logged In", "ann|admin|Counted Visits"]
        );
    }

    #[test]
    fn test_denied_removal_leaves_store_untouched() {
        let (temp, mut session) = setup();
        session.login("mia", "m").unwrap();
        assert!(matches!(
            session.begin_remove_patient(),
            Err(ClinicError::PermissionDenied { .. })
        ));
        assert_eq!(
            fs::read_to_string(temp.path().join("data").join("Patient_data.csv")).unwrap(),
            VISITS_CSV
        );
    }

    #[test]
    fn test_nurse_adds_visit_through_workflow() {
        let (_temp, mut session) = setup();
        session.login("bob", "x").unwrap();

        let mut wf = session.begin_add_visit().unwrap();
        assert_eq!(
            session
                .step_add_visit(&mut wf, AddVisitInput::PatientId("2".into()))
                .unwrap(),
            None
        );
        let form = VisitForm {
            department: "ER".into(),
            visit_date: "2024-05-06".into(),
            note_text: "Follow-up.".into(),
            ..wf.prefill().cloned().unwrap()
        };
        session
            .step_add_visit(&mut wf, AddVisitInput::Fields(form))
            .unwrap();
        let added = session
            .step_add_visit(&mut wf, AddVisitInput::Confirm(true))
            .unwrap()
            .unwrap();

        let visits = session.retrieve_patient("2").unwrap();
        assert_eq!(visits.len(), 2);
        assert_eq!(visits[1].visit_id, added.visit_id);
        // Demographics carried over from the earlier visit.
        assert_eq!(visits[1].age, "61");

        let notes = session.notes_on("2", ymd(2024, 5, 6)).unwrap();
        assert_eq!(notes[0].text, "Follow-up.");
    }

    #[test]
    fn test_failed_store_keeps_confirmation_pending() {
        let temp = TempDir::new().unwrap();
        let mut session = exhausted_session(&temp);
        session.login("bob", "x").unwrap();

        let mut wf = session.begin_add_visit().unwrap();
        session
            .step_add_visit(&mut wf, AddVisitInput::PatientId("1".into()))
            .unwrap();
        let form = VisitForm {
            department: "ER".into(),
            visit_date: "2024-05-06".into(),
            ..wf.prefill().cloned().unwrap()
        };
        session
            .step_add_visit(&mut wf, AddVisitInput::Fields(form))
            .unwrap();

        assert!(matches!(
            session.step_add_visit(&mut wf, AddVisitInput::Confirm(true)),
            Err(ClinicError::Ids(_))
        ));
        assert!(!wf.is_finished());
        assert!(matches!(wf.state(), AddVisitState::ConfirmSubmit { .. }));
        assert_eq!(session.service().visits().len(), 2);

        // The user can still back out of the pending visit.
        session
            .step_add_visit(&mut wf, AddVisitInput::Confirm(false))
            .unwrap();
        assert_eq!(wf.state(), &AddVisitState::Cancelled);
    }

    #[test]
    fn test_visit_details_are_scoped_to_patient() {
        let (_temp, mut session) = setup();
        session.login("bob", "x").unwrap();

        let visits = session.retrieve_patient("2").unwrap();
        let visit_id = visits[0].visit_id.clone();
        assert_eq!(
            session
                .visit_details("2", &visit_id, &[VisitField::Gender])
                .unwrap(),
            vec![("Gender", "M".to_string())]
        );
        assert!(matches!(
            session.visit_details("2", "100001", &[VisitField::Gender]),
            Err(ClinicError::VisitNotFound(_))
        ));
    }

    #[test]
    fn test_nurse_removes_patient_through_workflow() {
        let (_temp, mut session) = setup();
        session.login("bob", "x").unwrap();

        let mut wf = session.begin_remove_patient().unwrap();
        session
            .step_remove_patient(&mut wf, RemovePatientInput::PatientId("1".into()))
            .unwrap();
        let summary = session
            .step_remove_patient(&mut wf, RemovePatientInput::Confirm(true))
            .unwrap()
            .unwrap();
        assert_eq!(summary.visits_removed, 1);
        assert_eq!(session.service().visits().len(), 1);
        assert!(logged_actions(&session).contains(&"bob|nurse|Removed Patient".to_string()));
    }

    #[test]
    fn test_management_statistics_and_action_log() {
        let (temp, mut session) = setup();
        session.login("mia", "m").unwrap();

        let artifacts = session.generate_statistics().unwrap();
        assert_eq!(artifacts.len(), 3);
        assert!(artifacts
            .iter()
            .all(|a| a.path.starts_with(temp.path().join("out"))));

        let entries = session.action_log_entries().unwrap();
        let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(
            actions,
            vec!["Logged In", "Generated Graphs", "Viewed User Statistics"]
        );
    }
}
