use clap::{Parser, Subcommand};
use clinic_core::constants::{DATA_DIR_ENV, OUTPUT_DIR_ENV};
use clinic_core::dates::parse_user_date;
use clinic_core::{
    AddVisitInput, AddVisitState, CoreConfig, RemovePatientInput, Session, VisitField, VisitForm,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic visit records CLI")]
struct Cli {
    /// Username from the credentials table
    #[arg(long, global = true, env = "CLINIC_USERNAME")]
    username: Option<String>,
    /// Password for the user
    #[arg(long, global = true, env = "CLINIC_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Count visits on a date
    Count {
        /// Visit date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },
    /// List a patient's visits, or show fields of one visit
    Retrieve {
        /// Patient ID
        patient_id: String,
        /// Visit number from the listing (1-based)
        #[arg(long)]
        visit: Option<usize>,
        /// Fields to show (comma-separated, default all)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Add a visit; demographics left out are copied from the latest visit
    AddVisit {
        /// Patient ID
        patient_id: String,
        /// Visit date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "")]
        department: String,
        #[arg(long)]
        race: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        ethnicity: Option<String>,
        #[arg(long)]
        age: Option<String>,
        #[arg(long, default_value = "")]
        zip_code: String,
        #[arg(long, default_value = "")]
        insurance: String,
        #[arg(long, default_value = "")]
        chief_complaint: String,
        #[arg(long, default_value = "")]
        note_type: String,
        /// Clinical note text
        #[arg(long, default_value = "")]
        note: String,
        /// Store the visit (and create the patient if new) without asking
        #[arg(long)]
        yes: bool,
    },
    /// Remove a patient with all their visits and notes
    RemovePatient {
        /// Patient ID
        patient_id: String,
        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },
    /// Show notes for a patient's visits on a date
    Notes {
        /// Patient ID
        patient_id: String,
        /// Visit date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },
    /// Generate statistics tables
    Stats {
        /// Also print the tables as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show today's user actions
    Actions,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("clinic=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'clinic --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::from_env_values(
        std::env::var(DATA_DIR_ENV).ok(),
        std::env::var(OUTPUT_DIR_ENV).ok(),
    )?;

    let mut session = match Session::open(Arc::new(cfg)) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error opening clinic data: {}", e);
            return Ok(());
        }
    };

    let (Some(username), Some(password)) = (cli.username, cli.password) else {
        eprintln!("Error: --username and --password (or CLINIC_USERNAME / CLINIC_PASSWORD) are required");
        return Ok(());
    };

    if let Err(e) = session.login(&username, &password) {
        eprintln!("Error logging in: {}", e);
        return Ok(());
    }

    run(&mut session, command);

    session.logout().ok();
    Ok(())
}

fn run(session: &mut Session, command: Commands) {
    match command {
        Commands::Count { date } => {
            let date = match parse_user_date(&date) {
                Ok(d) => d,
                Err(e) => return eprintln!("Error counting visits: {}", e),
            };
            match session.count_visits_on(date) {
                Ok(n) => println!("Total visits on {}: {}", date, n),
                Err(e) => eprintln!("Error counting visits: {}", e),
            }
        }
        Commands::Retrieve {
            patient_id,
            visit,
            fields,
            json,
        } => retrieve(session, &patient_id, visit, &fields, json),
        Commands::AddVisit {
            patient_id,
            date,
            department,
            race,
            gender,
            ethnicity,
            age,
            zip_code,
            insurance,
            chief_complaint,
            note_type,
            note,
            yes,
        } => {
            let entered = VisitForm {
                department,
                visit_date: date,
                race: race.unwrap_or_default(),
                gender: gender.unwrap_or_default(),
                ethnicity: ethnicity.unwrap_or_default(),
                age: age.unwrap_or_default(),
                zip_code,
                insurance,
                chief_complaint,
                note_type,
                note_text: note,
            };
            add_visit(session, patient_id, entered, yes);
        }
        Commands::RemovePatient { patient_id, yes } => {
            let mut wf = match session.begin_remove_patient() {
                Ok(wf) => wf,
                Err(e) => return eprintln!("Error removing patient: {}", e),
            };
            let result = session
                .step_remove_patient(&mut wf, RemovePatientInput::PatientId(patient_id.clone()))
                .and_then(|_| session.step_remove_patient(&mut wf, RemovePatientInput::Confirm(yes)));
            match result {
                Ok(Some(summary)) => println!(
                    "Removed patient {}: {} visits, {} notes",
                    summary.patient_id, summary.visits_removed, summary.notes_removed
                ),
                Ok(None) => println!(
                    "Patient {} and all related records would be deleted; re-run with --yes to confirm",
                    patient_id
                ),
                Err(e) => eprintln!("Error removing patient: {}", e),
            }
        }
        Commands::Notes { patient_id, date } => {
            let parsed = match parse_user_date(&date) {
                Ok(d) => d,
                Err(e) => return eprintln!("Error viewing notes: {}", e),
            };
            match session.notes_on(&patient_id, parsed) {
                Ok(notes) => {
                    println!("Notes for patient {} on {}:", patient_id.trim(), date);
                    for (i, note) in notes.iter().enumerate() {
                        println!("Note {}:\n{}\n{}", i + 1, note.text, "-".repeat(40));
                    }
                }
                Err(e) => eprintln!("Error viewing notes: {}", e),
            }
        }
        Commands::Stats { json } => match session.generate_statistics() {
            Ok(artifacts) => {
                for a in artifacts {
                    println!("{} chart '{}' ({} rows): {}", a.kind, a.title, a.rows, a.path.display());
                }
                if json {
                    match serde_json::to_string_pretty(&session.service().statistics()) {
                        Ok(out) => println!("{}", out),
                        Err(e) => eprintln!("Error encoding statistics: {}", e),
                    }
                }
            }
            Err(e) => eprintln!("Error generating statistics: {}", e),
        },
        Commands::Actions => match session.action_log_entries() {
            Ok(entries) => {
                println!("{:<16} {:<12} {:<24} {}", "Username", "Role", "Action", "Timestamp");
                for r in entries {
                    println!("{:<16} {:<12} {:<24} {}", r.username, r.role, r.action, r.timestamp);
                }
            }
            Err(e) => eprintln!("Error reading user actions: {}", e),
        },
    }
}

fn retrieve(session: &Session, patient_id: &str, visit: Option<usize>, fields: &[String], json: bool) {
    let visits = match session.retrieve_patient(patient_id) {
        Ok(v) => v,
        Err(e) => return eprintln!("Error retrieving patient: {}", e),
    };

    let Some(number) = visit else {
        if json {
            match serde_json::to_string_pretty(&visits) {
                Ok(out) => println!("{}", out),
                Err(e) => eprintln!("Error encoding visits: {}", e),
            }
        } else {
            println!("Visits for patient {}:", patient_id.trim());
            for (i, v) in visits.iter().enumerate() {
                println!("{}. {}", i + 1, v.summary());
            }
        }
        return;
    };

    let Some(selected) = number.checked_sub(1).and_then(|i| visits.get(i)) else {
        return eprintln!(
            "Error retrieving patient: visit {} is out of range (1-{})",
            number,
            visits.len()
        );
    };

    let wanted: Vec<VisitField> = if fields.is_empty() {
        VisitField::ALL.to_vec()
    } else {
        match fields.iter().map(|f| f.parse::<VisitField>()).collect::<Result<_, _>>() {
            Ok(parsed) => parsed,
            Err(e) => return eprintln!("Error retrieving patient: {}", e),
        }
    };

    let details = match session.visit_details(patient_id, &selected.visit_id, &wanted) {
        Ok(d) => d,
        Err(e) => return eprintln!("Error retrieving patient: {}", e),
    };

    if json {
        let map: serde_json::Map<String, serde_json::Value> = details
            .into_iter()
            .map(|(label, value)| (label.to_string(), serde_json::Value::String(value)))
            .collect();
        match serde_json::to_string_pretty(&map) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("Error encoding visit details: {}", e),
        }
    } else {
        for (label, value) in details {
            println!("{}: {}", label, value);
        }
    }
}

/// Drives the add-visit workflow non-interactively. Without `--yes` nothing is stored.
fn add_visit(session: &mut Session, patient_id: String, entered: VisitForm, yes: bool) {
    let mut wf = match session.begin_add_visit() {
        Ok(wf) => wf,
        Err(e) => return eprintln!("Error adding visit: {}", e),
    };

    if let Err(e) = session.step_add_visit(&mut wf, AddVisitInput::PatientId(patient_id)) {
        return eprintln!("Error adding visit: {}", e);
    }

    if let AddVisitState::ConfirmCreate { patient_id } = wf.state() {
        let patient_id = patient_id.clone();
        if !yes {
            session.step_add_visit(&mut wf, AddVisitInput::Cancel).ok();
            return println!(
                "Patient ID {} does not exist; re-run with --yes to create a new patient",
                patient_id
            );
        }
        if let Err(e) = session.step_add_visit(&mut wf, AddVisitInput::Confirm(true)) {
            return eprintln!("Error adding visit: {}", e);
        }
    }

    let prefill = wf.prefill().cloned().unwrap_or_default();
    let form = VisitForm {
        race: or_prefill(entered.race, prefill.race),
        gender: or_prefill(entered.gender, prefill.gender),
        ethnicity: or_prefill(entered.ethnicity, prefill.ethnicity),
        age: or_prefill(entered.age, prefill.age),
        ..entered
    };

    if let Err(e) = session.step_add_visit(&mut wf, AddVisitInput::Fields(form)) {
        return eprintln!("Error adding visit: {}", e);
    }

    match session.step_add_visit(&mut wf, AddVisitInput::Confirm(yes)) {
        Ok(Some(added)) => println!(
            "Visit added for patient {}: Visit_ID {}, Note_ID {}",
            added.patient_id, added.visit_id, added.note_id
        ),
        Ok(None) => println!("Visit is valid but was not stored; re-run with --yes to add it"),
        Err(e) => eprintln!("Error adding visit: {}", e),
    }
}

fn or_prefill(entered: String, prefill: String) -> String {
    if entered.trim().is_empty() {
        prefill
    } else {
        entered
    }
}
