//! Interactive login and menu loop.

use anyhow::Result;
use clinic_core::dates::parse_user_date;
use clinic_core::{
    Action, AddVisitInput, AddVisitState, AddVisitWorkflow, RemovePatientInput,
    RemovePatientState, Session, VisitField, VisitForm,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

enum Outcome {
    Continue,
    Logout,
    Quit,
}

pub fn run(mut session: Session) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("Clinic visit records. Type 'quit' at the username prompt to exit.");

    loop {
        if session.current_user().is_none() {
            let Some(username) = ask(&mut rl, "Username: ")? else {
                break;
            };
            if username.is_empty() {
                continue;
            }
            if username == "quit" {
                break;
            }
            let Some(password) = ask(&mut rl, "Password: ")? else {
                continue;
            };
            match session.login(&username, &password) {
                Ok(role) => println!("Welcome, {} ({})", username, role),
                Err(e) => eprintln!("Login failed: {}", e),
            }
            continue;
        }

        print_menu(session.available_actions());
        let line = match rl.readline("clinic> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("Ctrl-C received. Type 'quit' to exit.");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Readline error: {:?}", err);
                break;
            }
        };
        let choice = line.trim();
        if choice.is_empty() {
            continue;
        }
        rl.add_history_entry(choice).ok();

        match dispatch(&mut session, &mut rl, choice) {
            Ok(Outcome::Continue) => {}
            Ok(Outcome::Logout) => {
                if let Ok(user) = session.logout() {
                    println!("Goodbye, {}.", user.username);
                }
            }
            Ok(Outcome::Quit) => break,
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    if session.current_user().is_some() {
        session.logout().ok();
    }
    Ok(())
}

fn print_menu(actions: &[Action]) {
    println!();
    for (i, action) in actions.iter().enumerate() {
        println!("  {}. {:<12} {}", i + 1, action.name(), action.description());
    }
    println!("  reload | logout | quit");
}

fn dispatch(session: &mut Session, rl: &mut DefaultEditor, choice: &str) -> Result<Outcome> {
    match choice {
        "quit" | "exit" => return Ok(Outcome::Quit),
        "logout" => return Ok(Outcome::Logout),
        "reload" => {
            session.reload()?;
            println!("Reloaded {} visits.", session.service().visits().len());
            return Ok(Outcome::Continue);
        }
        _ => {}
    }

    let actions = session.available_actions();
    let action = match choice.parse::<usize>() {
        Ok(n) => n
            .checked_sub(1)
            .and_then(|i| actions.get(i).copied())
            .ok_or_else(|| anyhow::anyhow!("no menu entry {}", n))?,
        Err(_) => choice.parse::<Action>()?,
    };

    match action {
        Action::Count => count_visits(session, rl)?,
        Action::Retrieve => retrieve_patient(session, rl)?,
        Action::View => view_notes(session, rl)?,
        Action::Add => add_visit(session, rl)?,
        Action::Remove => remove_patient(session, rl)?,
        Action::Statistics => {
            for a in session.generate_statistics()? {
                println!("{} chart '{}' ({} rows): {}", a.kind, a.title, a.rows, a.path.display());
            }
        }
        Action::ActionLog => {
            let entries = session.action_log_entries()?;
            println!("{:<16} {:<12} {:<24} {}", "Username", "Role", "Action", "Timestamp");
            for r in entries {
                println!("{:<16} {:<12} {:<24} {}", r.username, r.role, r.action, r.timestamp);
            }
        }
    }
    Ok(Outcome::Continue)
}

/// Reads one trimmed line. `None` means the user cancelled with Ctrl-C or Ctrl-D.
fn ask(rl: &mut DefaultEditor, label: &str) -> Result<Option<String>> {
    match rl.readline(label) {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn ask_yes_no(rl: &mut DefaultEditor, question: &str) -> Result<Option<bool>> {
    Ok(ask(rl, &format!("{} [y/N] ", question))?
        .map(|a| matches!(a.to_lowercase().as_str(), "y" | "yes")))
}

/// Asks for a field, keeping `current` when the answer is blank.
fn ask_with_default(rl: &mut DefaultEditor, label: &str, current: &str) -> Result<Option<String>> {
    let prompt = if current.is_empty() {
        format!("{}: ", label)
    } else {
        format!("{} [{}]: ", label, current)
    };
    Ok(ask(rl, &prompt)?.map(|a| if a.is_empty() { current.to_string() } else { a }))
}

fn count_visits(session: &Session, rl: &mut DefaultEditor) -> Result<()> {
    let Some(input) = ask(rl, "Visit date (YYYY-MM-DD): ")? else {
        return Ok(());
    };
    let date = parse_user_date(&input)?;
    let total = session.count_visits_on(date)?;
    println!("Total visits on {}: {}", input, total);
    Ok(())
}

fn retrieve_patient(session: &Session, rl: &mut DefaultEditor) -> Result<()> {
    let Some(patient_id) = ask(rl, "Patient ID: ")? else {
        return Ok(());
    };
    let visits = session.retrieve_patient(&patient_id)?;

    println!("Visits for patient {}:", patient_id);
    for (i, v) in visits.iter().enumerate() {
        println!("  {}. {}", i + 1, v.summary());
    }

    loop {
        let Some(pick) = ask(rl, "Select a visit (blank to finish): ")? else {
            return Ok(());
        };
        if pick.is_empty() {
            return Ok(());
        }
        let Some(visit) = pick
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| visits.get(i))
        else {
            eprintln!("Please select a visit between 1 and {}.", visits.len());
            continue;
        };

        let labels: Vec<&str> = VisitField::ALL.iter().map(|f| f.label()).collect();
        println!("Fields: {}", labels.join(", "));
        let Some(answer) = ask(rl, "Fields to view (comma-separated, blank for all): ")? else {
            return Ok(());
        };
        let fields: Vec<VisitField> = if answer.is_empty() {
            VisitField::ALL.to_vec()
        } else {
            match answer
                .split(',')
                .map(|f| f.parse::<VisitField>())
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(fields) => fields,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    continue;
                }
            }
        };

        for (label, value) in session.visit_details(&patient_id, &visit.visit_id, &fields)? {
            println!("  {}: {}", label, value);
        }
    }
}

fn view_notes(session: &Session, rl: &mut DefaultEditor) -> Result<()> {
    let Some(patient_id) = ask(rl, "Patient ID: ")? else {
        return Ok(());
    };
    let Some(input) = ask(rl, "Visit date (YYYY-MM-DD): ")? else {
        return Ok(());
    };
    let date = parse_user_date(&input)?;

    let notes = session.notes_on(&patient_id, date)?;
    println!("Notes for patient {} on {}:", patient_id, input);
    for (i, note) in notes.iter().enumerate() {
        println!("Note {}:\n{}\n{}", i + 1, note.text, "-".repeat(40));
    }
    Ok(())
}

fn collect_form(rl: &mut DefaultEditor, prefill: &VisitForm) -> Result<Option<VisitForm>> {
    let mut form = prefill.clone();
    let fields: [(&str, &mut String); 11] = [
        ("Department", &mut form.department),
        ("Visit date (YYYY-MM-DD)", &mut form.visit_date),
        ("Race", &mut form.race),
        ("Gender", &mut form.gender),
        ("Ethnicity", &mut form.ethnicity),
        ("Age", &mut form.age),
        ("Zip code", &mut form.zip_code),
        ("Insurance", &mut form.insurance),
        ("Chief complaint", &mut form.chief_complaint),
        ("Note type", &mut form.note_type),
        ("Clinical notes", &mut form.note_text),
    ];
    for (label, slot) in fields {
        match ask_with_default(rl, label, slot.as_str())? {
            Some(value) => *slot = value,
            None => return Ok(None),
        }
    }
    Ok(Some(form))
}

fn add_visit(session: &mut Session, rl: &mut DefaultEditor) -> Result<()> {
    let mut wf: AddVisitWorkflow = session.begin_add_visit()?;

    while !wf.is_finished() {
        let input = match wf.state() {
            AddVisitState::CollectPatientId => ask(rl, "Patient ID: ")?.map(AddVisitInput::PatientId),
            AddVisitState::ConfirmCreate { patient_id } => ask_yes_no(
                rl,
                &format!("Patient ID {} does not exist. Create a new patient with this ID?", patient_id),
            )?
            .map(AddVisitInput::Confirm),
            AddVisitState::CollectFields { prefill, .. } => {
                collect_form(rl, prefill)?.map(AddVisitInput::Fields)
            }
            AddVisitState::ConfirmSubmit { draft } => ask_yes_no(
                rl,
                &format!(
                    "Add a visit for patient {} on {} ({})?",
                    draft.patient_id, draft.visit_time, draft.department
                ),
            )?
            .map(AddVisitInput::Confirm),
            AddVisitState::Done | AddVisitState::Cancelled => break,
        };

        match session.step_add_visit(&mut wf, input.unwrap_or(AddVisitInput::Cancel)) {
            Ok(Some(added)) => println!(
                "Visit added for patient {} (Visit_ID {}, Note_ID {}).",
                added.patient_id, added.visit_id, added.note_id
            ),
            Ok(None) => {}
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    if matches!(wf.state(), AddVisitState::Cancelled) {
        println!("Cancelled; nothing was added.");
    }
    Ok(())
}

fn remove_patient(session: &mut Session, rl: &mut DefaultEditor) -> Result<()> {
    let mut wf = session.begin_remove_patient()?;

    while !wf.is_finished() {
        let input = match wf.state() {
            RemovePatientState::CollectPatientId => {
                ask(rl, "Patient ID to remove: ")?.map(RemovePatientInput::PatientId)
            }
            RemovePatientState::ConfirmRemoval { patient_id } => ask_yes_no(
                rl,
                &format!(
                    "Are you sure you want to delete Patient ID {} and all related records?",
                    patient_id
                ),
            )?
            .map(RemovePatientInput::Confirm),
            RemovePatientState::Done | RemovePatientState::Cancelled => break,
        };

        match session.step_remove_patient(&mut wf, input.unwrap_or(RemovePatientInput::Cancel)) {
            Ok(Some(summary)) => println!(
                "Patient ID {} removed ({} visits, {} notes).",
                summary.patient_id, summary.visits_removed, summary.notes_removed
            ),
            Ok(None) => {}
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(());
            }
        }
    }

    if matches!(wf.state(), RemovePatientState::Cancelled) {
        println!("Deletion cancelled.");
    }
    Ok(())
}
