//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `cosmo_core` wiring end to end: logging, open, seed, load.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Environment:
//! - `COSMO_DB_PATH`: database file (defaults to a file in the temp dir).
//! - `COSMO_LOG_DIR`: absolute log directory (file logging off when unset).
//! - `COSMO_LOG_LEVEL`: `trace|debug|info|warn|error`.

use cosmo_core::{default_log_level, init_logging, Backend, SqliteStore};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_DB_FILE_NAME: &str = "cosmo.sqlite3";

fn main() -> ExitCode {
    if let Some(log_dir) = env_value("COSMO_LOG_DIR") {
        let level = env_value("COSMO_LOG_LEVEL").unwrap_or_else(|| default_log_level().to_string());
        if let Err(err) = init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let db_path = resolve_db_path();
    match run(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("cosmo_cli failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let backend = Backend::open(db_path)?;
    let store = SqliteStore::bootstrap(backend.connection())?;

    println!("cosmo_core version={}", cosmo_core::core_version());
    println!("db_path={}", db_path.display());
    println!(
        "groups={} galaxies={} planets={}",
        store.groups().len(),
        store.galaxies().count(),
        store.planets().len()
    );
    for galaxy in store.galaxies() {
        let summary = store.galaxy_delete_summary(&galaxy.id)?;
        println!(
            "galaxy name={:?} systems={} links={}",
            galaxy.name, summary.systems, summary.links
        );
    }
    Ok(())
}

fn resolve_db_path() -> PathBuf {
    env_value("COSMO_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}
