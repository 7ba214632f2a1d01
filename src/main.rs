use anyhow::Context;
use clinic_core::constants::{DATA_DIR_ENV, OUTPUT_DIR_ENV};
use clinic_core::{CoreConfig, Session};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod interactive;

/// Main entry point for the interactive clinic session
///
/// Resolves configuration once, opens the clinic data and runs the login/menu loop until
/// the user quits. Operation failures are reported in the loop and never end the session.
///
/// # Environment Variables
/// - `CLINIC_DATA_DIR`: Directory holding `Patient_data.csv`, `Notes.csv` and
///   `Credentials.csv` (default: "data")
/// - `CLINIC_OUTPUT_DIR`: Root for dated statistics and action-log folders (default: ".")
/// - `RUST_LOG`: Log filter (default adds `clinic=info`)
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("clinic=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = CoreConfig::from_env_values(
        std::env::var(DATA_DIR_ENV).ok(),
        std::env::var(OUTPUT_DIR_ENV).ok(),
    )
    .context("Invalid clinic configuration")?;

    tracing::info!(
        "++ Starting clinic session (data: {}, output: {})",
        cfg.data_dir().display(),
        cfg.output_dir().display()
    );

    let session = Session::open(Arc::new(cfg)).context("Failed to open clinic data")?;
    interactive::run(session)
}
