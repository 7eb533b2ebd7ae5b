use anyhow::{Context, Result};
use log::{error, info};
use std::env;
use std::path::PathBuf;
use std::process;

use registration_compare::config::Settings;
use registration_compare::services::compare::write_comparison;

/// `data.tsv` goes next to the executable.
fn report_dir() -> Result<PathBuf> {
    let exe = env::current_exe().context("cannot locate the running executable")?;
    exe.parent()
        .map(|dir| dir.to_path_buf())
        .context("executable has no parent directory")
}

async fn run() -> Result<PathBuf> {
    let settings = Settings::from_env()?;
    let client = settings.client()?;
    info!(
        "Comparing {} events ({:?} on fetch failure)",
        settings.event_ids.len(),
        settings.on_fetch_failure
    );

    write_comparison(&client, &settings.event_ids, settings.on_fetch_failure, &report_dir()?).await
}

#[tokio::main]
async fn main() {
    env_logger::init();
    info!("Logger initialized. Starting registration comparison...");

    match run().await {
        Ok(path) => info!("Report written to {}", path.display()),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}
