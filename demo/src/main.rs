//! Clinic Local Data Layer demo CLI
//!
//! Runs one or all of the scenarios against a freshly seeded store.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- agenda
//!   cargo run -p demo -- patients
//!   cargo run -p demo -- login
//!   cargo run -p demo -- access
//!   cargo run -p demo -- --config clinic.toml run-all

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use clinic_contracts::error::ClinicResult;
use clinic_fixtures::scenarios::{access, agenda, login, patients};
use clinic_policy::ClinicConfig;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Clinic local data layer demo.
///
/// Each subcommand seeds an in-memory store with the clinic fixtures and
/// walks through one area of the application.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Clinic local data layer demo",
    long_about = "Runs scenarios over the seeded clinic store: agenda queries,\n\
                  patient register edits, staff sign-in and role access rules."
)]
struct Cli {
    /// TOML configuration file. Defaults to the bundled clinic rules.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every scenario in sequence.
    RunAll,
    /// Appointment agenda: filters, ordering, paging, booking.
    Agenda,
    /// Patient register: projection, lookups, edits.
    Patients,
    /// Staff sign-in: migration, failures, first access, registration.
    Login,
    /// Role access rules per staff level.
    Access,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for query-level output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = load_config(cli.config).and_then(|config| match cli.command {
        Command::RunAll => run_all(&config),
        Command::Agenda => agenda::run_scenario(&config),
        Command::Patients => patients::run_scenario(&config),
        Command::Login => login::run_scenario(&config),
        Command::Access => access::run_scenario(&config),
    });

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<PathBuf>) -> ClinicResult<ClinicConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            ClinicConfig::from_file(&path)
        }
        None => ClinicConfig::from_toml_str(clinic_fixtures::CLINIC_CONFIG),
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all(config: &ClinicConfig) -> ClinicResult<()> {
    agenda::run_scenario(config)?;
    patients::run_scenario(config)?;
    login::run_scenario(config)?;
    access::run_scenario(config)?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Clinic Local Data Layer");
    println!("Demo over seeded fixtures");
    println!("=========================");
    println!();
    println!("Every query call returns {{ data, error, count }}:");
    println!("  [1] Filters narrow the table (eq, neq, gte, lte, gt, lt, in)");
    println!("  [2] order() sorts, count() reports matches before paging");
    println!("  [3] range(from, to) pages with an inclusive end");
    println!("  [4] Mutations report \"Item não encontrado\" when nothing matches");
    println!();
}
