//! gitflow-license CLI - activate, inspect and gate on the local license

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use gitflow_license::{CheckResult, LicenseConfig, LicenseError, LicenseManager};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gitflow-license")]
#[command(about = "Manage the GitFlow tooling license on this machine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activate a license key on this machine
    Activate {
        /// License key (CGFW-XXXX-XXXX-XXXX); prompted for when omitted
        key: Option<String>,

        /// Remove the current license instead
        #[arg(long)]
        deactivate: bool,
    },

    /// Show license status
    #[command(alias = "s")]
    Status {
        /// Print the check result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Exit 0 if the license is valid, 1 otherwise
    Check,
}

fn main() -> Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let config = LicenseConfig::from_env()?;
    let manager = LicenseManager::new(config)?;

    match cli.command {
        Commands::Activate { deactivate: true, .. } => {
            manager.deactivate()?;
            println!("{} License deactivated.", "✓".green());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Activate { key, .. } => run_activate(&manager, key),
        Commands::Status { json } => run_status(&manager, json),
        Commands::Check => {
            let check = manager.check_license()?;
            print_check(&check);
            Ok(if check.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();
}

fn run_activate(manager: &LicenseManager, key: Option<String>) -> Result<ExitCode> {
    let key = match key {
        Some(k) => k,
        None => prompt_key(manager)?,
    };

    print!("  Validating license... ");
    io::stdout().flush().ok();

    match manager.activate(&key) {
        Ok(activation) => {
            println!("{}", "done".green());
            println!();
            println!("  {}", "License activated successfully!".green().bold());
            println!("  Plan:    {}", activation.license.plan.to_string().cyan());
            println!(
                "  Expires: {}",
                activation.license.expires_at.format("%Y-%m-%d").to_string().cyan()
            );
            if !activation.features.is_empty() {
                println!("  Features: {}", activation.features.join(", "));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(
            e @ (LicenseError::ConfigError(_)
            | LicenseError::StoreIO(_)
            | LicenseError::MachineIdentity(_)),
        ) => Err(e.into()),
        Err(e) => {
            println!("{}", "failed".red());
            print_error(&e.to_string(), e.remediation());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn prompt_key(manager: &LicenseManager) -> Result<String> {
    let stdin = io::stdin();
    let template = manager.key_format().template();
    loop {
        print!("Enter your license key: ");
        io::stdout().flush().ok();

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read license key")?;
        if read == 0 {
            anyhow::bail!("No license key provided");
        }

        let key = line.trim();
        if manager.key_format().validate(key) {
            return Ok(key.to_string());
        }
        eprintln!("  {} Invalid format. Expected: {}", "✗".red(), template);
    }
}

fn run_status(manager: &LicenseManager, json: bool) -> Result<ExitCode> {
    let status = manager.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status.check)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "License".cyan().bold());
    match (&status.license, status.check.valid) {
        (Some(license), true) => {
            let state = if status.check.offline {
                "Active (offline)".yellow()
            } else {
                "Active".green()
            };
            println!("  Status:  {}", state);
            println!("  Plan:    {}", license.plan.to_string().cyan());
            println!("  Expires: {}", license.expires_at.format("%Y-%m-%d"));
            println!("  Machine: {}...", license.short_machine_id());
        }
        _ => {
            println!("  Status:  {}", "Not activated".yellow());
            if let Some(error) = &status.check.error {
                println!("  Reason:  {}", error);
            }
            println!("  Run:     {}", "gitflow-license activate".cyan());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_check(check: &CheckResult) {
    match (check.valid, check.plan) {
        (true, Some(plan)) if check.offline => println!(
            "{} License valid ({}, offline: could not reach license server)",
            "⚠".yellow(),
            plan
        ),
        (true, Some(plan)) => println!("{} License valid ({})", "✓".green(), plan),
        _ => print_error(
            check.error.as_deref().unwrap_or("License validation failed"),
            check.remediation,
        ),
    }
}

fn print_error(message: &str, remediation: Option<&str>) {
    eprintln!("{} {}", "✗".red(), message);
    if let Some(hint) = remediation {
        eprintln!("  {}", hint.dimmed());
    }
}
