mod blob;
mod commands;
mod config;
mod notifier;
mod render;
mod store;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use time::Date;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use monalisa_core::model::{LitmasId, TppScheduleId};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "monalisa",
    version,
    about = "MONALISA litmas case workflow"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "monalisa.toml")]
    config: PathBuf,

    /// User id to act as (resolved against the users table)
    #[arg(long, global = true)]
    actor: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log workflow decisions to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Write a default config file and an empty data store
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Manage users and their roles
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage TPP sitting slots
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
    /// Register a new case from a JSON registration file
    Register {
        /// Path to the registration JSON
        file: PathBuf,
    },
    /// Look up clients
    Klien {
        #[command(subcommand)]
        command: KlienCommands,
    },
    /// Upload the signed task document (New Task -> On Progress)
    UploadTask {
        case_id: LitmasId,
        /// Document to upload
        file: PathBuf,
    },
    /// Submit the field report for review (On Progress / Revision -> Review)
    SubmitReport {
        case_id: LitmasId,
        /// Report to upload
        file: PathBuf,
        /// Verifier to assign; required on the first submission
        #[arg(long)]
        verifier: Option<String>,
    },
    /// Approve the report under review (Review -> Approved)
    Approve { case_id: LitmasId },
    /// Return the report for revision (Review -> Revision)
    Revise {
        case_id: LitmasId,
        /// Note for the caseworker
        #[arg(long)]
        note: Option<String>,
    },
    /// Book a TPP sitting slot (Approved -> TPP Scheduled)
    RegisterTpp {
        case_id: LitmasId,
        slot_id: TppScheduleId,
    },
    /// Close the case (TPP Scheduled -> Selesai)
    Complete { case_id: LitmasId },
    /// Hand a case to another caseworker
    Reassign {
        case_id: LitmasId,
        /// User id of the new caseworker
        pk: String,
    },
    /// Show a case with its client, charges, schedule and documents
    Show { case_id: LitmasId },
    /// List the cases on the acting user's worklist
    List,
    /// Show the actions the acting user can take on a case
    Actions { case_id: LitmasId },
    /// Count cases per status
    Summary,
}

#[derive(Subcommand)]
pub(crate) enum UserCommands {
    /// Create or replace a user (admin only; the first user must be an admin)
    Add {
        id: String,
        #[arg(long)]
        nama: String,
        /// Role label (admin, pk, anev, kasie, kasubsie, op_reg_anak, op_reg_dewasa)
        #[arg(long = "role", required = true)]
        roles: Vec<String>,
        #[arg(long)]
        nip: Option<String>,
        /// WhatsApp number for verifier notifications
        #[arg(long)]
        no_hp: Option<String>,
    },
    /// List users holding a role
    List {
        #[arg(long)]
        role: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum ScheduleCommands {
    /// Add a sitting slot (admin only)
    Add {
        /// Sitting date (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        date: Date,
        /// Create the slot closed
        #[arg(long)]
        closed: bool,
        #[arg(long)]
        keterangan: Option<String>,
    },
    /// Open slots from today on
    List,
}

#[derive(Subcommand)]
pub(crate) enum KlienCommands {
    /// Find existing clients by name fragment or exact NIK
    Search {
        #[arg(long)]
        nama: Option<String>,
        #[arg(long)]
        nik: Option<String>,
    },
}

fn parse_date(s: &str) -> Result<Date, String> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(s, &format).map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(
                &format!("failed to create tokio runtime: {}", e),
                cli.output,
                cli.quiet,
            );
            process::exit(1);
        }
    };

    let options = commands::Options {
        config: cli.config,
        actor: cli.actor,
    };
    match rt.block_on(commands::run(options, cli.command)) {
        Ok(rendered) => {
            if !cli.quiet {
                match cli.output {
                    OutputFormat::Text => println!("{}", rendered.text),
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::to_string_pretty(&rendered.json)
                            .unwrap_or_else(|e| format!("serialization error: {}", e))
                    ),
                }
            }
        }
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error: {}", msg);
            }
        }
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
