//! `employees`: manage employee records from the terminal.

mod config;
mod jpeg;
mod storage;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use employee_core::{
    EmployeeClient, EmployeeStore, EmployeeUpdate, FilePart, ImageChange, NewEmployee, Outcome, ReqwestTransport,
    Severity,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::jpeg::JpegCompressor;
use crate::storage::{FileTokenStore, TOKEN_KEY};

#[derive(Parser)]
#[command(name = "employees", version, about = "Manage employee records")]
struct Cli {
    /// API base URL (overrides the config file)
    #[arg(long, env = "EMPLOYEES_API_URL", global = true)]
    base_url: Option<String>,

    /// Key-value file holding the session token
    #[arg(long, env = "EMPLOYEES_STORAGE", global = true)]
    storage: Option<PathBuf>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save a bearer token for later commands
    Login { token: String },
    /// Forget the saved token
    Logout,
    /// List all employees
    List,
    /// List team leads of a team
    TeamLeads {
        #[arg(long)]
        team: String,
    },
    /// Create an employee
    Create(CreateArgs),
    /// Update an employee
    Update(UpdateArgs),
    /// Delete an employee
    Delete { id: u64 },
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    employee_id: String,
    #[arg(long, default_value = "")]
    password: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    emergency_phone: String,
    /// Team lead id
    #[arg(long)]
    tl: Option<String>,
    /// Role id
    #[arg(long)]
    role: Option<String>,
    /// Raw role value, used when --role is absent
    #[arg(long)]
    roles: Option<String>,
    /// Team id
    #[arg(long)]
    team_id: Option<String>,
    /// Raw team value, used when --team-id is absent
    #[arg(long)]
    team: Option<String>,
    /// Profile picture to upload
    #[arg(long)]
    photo: Option<PathBuf>,
}

#[derive(Args)]
struct UpdateArgs {
    id: u64,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    emergency_phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    team_id: Option<String>,
    #[arg(long)]
    role: Option<String>,
    /// Project manager id
    #[arg(long)]
    pm: Option<String>,
    /// New profile picture, compressed before upload
    #[arg(long, conflicts_with = "clear_photo")]
    photo: Option<PathBuf>,
    /// Remove the current profile picture
    #[arg(long)]
    clear_photo: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the requested operation was accepted.
async fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let base_url = cli.base_url.clone().unwrap_or_else(|| config.base_url.clone());
    let tokens = Arc::new(FileTokenStore::new(match cli.storage {
        Some(path) => path,
        None => Config::storage_path()?,
    }));
    debug!(%base_url, storage = ?tokens.path(), "starting");

    let store = EmployeeStore::new(EmployeeClient::new(&base_url), Arc::new(ReqwestTransport::new()), tokens.clone())
        .with_compressor(Arc::new(JpegCompressor))
        .with_compression_options(config.compression());

    match cli.command {
        Command::Login { token } => {
            tokens.set(TOKEN_KEY, &token)?;
            eprintln!("token saved to {}", tokens.path().display());
            Ok(true)
        }
        Command::Logout => {
            if tokens.remove(TOKEN_KEY)? {
                eprintln!("token removed");
            }
            Ok(true)
        }
        Command::List => {
            let outcome = store.list().await;
            finish(&outcome, &store.employees().await, store.last_error().await)
        }
        Command::TeamLeads { team } => {
            let outcome = store.list_team_leads(&team).await;
            finish(&outcome, &store.team_leads().await, None)
        }
        Command::Create(args) => {
            let input = NewEmployee {
                name: args.name,
                employee_id: args.employee_id,
                email: args.email,
                password: args.password,
                address: args.address,
                phone_num: args.phone,
                emergency_phone_num: args.emergency_phone,
                tl_id: args.tl,
                role_id: args.role,
                roles: args.roles,
                team_id: args.team_id,
                team: args.team,
                profile_pic: args.photo.as_deref().map(read_file).transpose()?,
            };
            let outcome = store.create(&input).await;
            finish(&outcome, &store.employees().await, None)
        }
        Command::Update(args) => {
            let profile_pic = match (&args.photo, args.clear_photo) {
                (Some(path), _) => ImageChange::Replace(read_file(path)?),
                (None, true) => ImageChange::Clear,
                (None, false) => ImageChange::Keep,
            };
            let input = EmployeeUpdate {
                name: args.name,
                email: args.email,
                phone_num: args.phone,
                emergency_phone_num: args.emergency_phone,
                address: args.address,
                team_id: args.team_id,
                role_id: args.role,
                pm_id: args.pm,
                profile_pic,
            };
            let outcome = store.update(args.id, &input).await;
            let updated: Vec<_> = store.employees().await.into_iter().filter(|e| e.id == args.id).collect();
            finish(&outcome, &updated, store.last_error().await)
        }
        Command::Delete { id } => {
            let outcome = store.remove(id).await;
            finish(&outcome, &Vec::<()>::new(), None)
        }
    }
}

fn read_file(path: &Path) -> Result<FilePart> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{:?} has no file name", path))?;
    let content_type = mime_guess::from_path(path).first_or_octet_stream().to_string();
    Ok(FilePart::new(file_name, content_type, bytes))
}

/// Print notices to stderr and `records` as JSON to stdout.
fn finish<T: Serialize>(outcome: &Outcome, records: &[T], last_error: Option<String>) -> Result<bool> {
    for notice in &outcome.notices {
        let tag = match notice.severity {
            Severity::Success => "ok",
            Severity::Error => "error",
        };
        eprintln!("[{tag}] {}: {}", notice.title, notice.message);
    }
    if outcome.notices.is_empty() && !outcome.accepted {
        if let Some(err) = last_error {
            eprintln!("[error] {err}");
        }
    }
    if !records.is_empty() {
        println!("{}", serde_json::to_string_pretty(records).context("Failed to serialize output")?);
    }
    Ok(outcome.accepted)
}
