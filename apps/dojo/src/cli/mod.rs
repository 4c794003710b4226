//! # Dojo CLI Module
//!
//! This module implements the CLI interface for the dojo roster.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show roster and ledger counts
//! - `init` - Initialize a new database
//! - `members` - List members
//! - `add-member` - Add a member
//! - `deactivate` - Deactivate a member
//! - `attend` - Record attendance for a day
//! - `evaluate` - Exam readiness for one or all members
//! - `stickers` - Sticker position for one member, or every award due
//! - `award` - Award the next due sticker
//! - `promote` - Move a member to the next grade after an exam
//! - `import` - Import the legacy roster CSV
//! - `export` - Write a snapshot or attendance CSV backup
//! - `restore` - Replace all data with a snapshot backup

mod commands;

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dojo_core::DojoError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Dojo - roster, attendance and grading for a martial-arts school
#[derive(Parser, Debug)]
#[command(name = "dojo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress the startup line
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Path to the database (overrides database.path)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides server.host)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show roster and ledger counts
    Status,

    /// Initialize a new empty database
    Init {
        /// Overwrite an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// List members
    Members {
        /// Include deactivated members
        #[arg(short, long)]
        all: bool,
    },

    /// Add a member
    AddMember {
        #[arg(long)]
        given_name: String,

        #[arg(long)]
        family_name: String,

        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: NaiveDate,

        /// Starting grade (default: first grade of the table)
        #[arg(long)]
        grade: Option<String>,

        /// Training group
        #[arg(long)]
        group: Option<String>,

        /// Units attended before the ledger began
        #[arg(long, default_value = "0")]
        legacy_total: u32,
    },

    /// Deactivate a member (members are never deleted)
    Deactivate {
        /// Member id
        member: u64,
    },

    /// Record attendance for a day
    Attend {
        /// Day of the session (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Record into the exam list
        #[arg(short, long)]
        exam: bool,

        /// Member ids present
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Exam readiness for one member, or for all active members
    Evaluate {
        /// Member id (default: all active members)
        #[arg(short, long)]
        member: Option<u64>,

        /// Evaluate as of this date (default: today)
        #[arg(short, long)]
        today: Option<NaiveDate>,
    },

    /// Sticker position for one member, or every award due
    Stickers {
        /// Member id (default: every member with an award due)
        #[arg(short, long)]
        member: Option<u64>,
    },

    /// Award the next due sticker
    Award {
        /// Member id
        #[arg(short, long)]
        member: u64,

        /// Member id of the trainer
        #[arg(short, long)]
        trainer: u64,

        /// Day of the award (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Move a member to the next grade after an exam
    Promote {
        /// Member id
        #[arg(short, long)]
        member: u64,

        /// Day of the exam (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Import the legacy roster CSV
    Import {
        /// Roster file (semicolon-delimited)
        #[arg(short, long)]
        file: PathBuf,

        /// Show the plan without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a backup
    Export {
        /// Output file (default: a dated file under export.path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Backup format (snapshot, attendance-csv)
        #[arg(short = 't', long, default_value = "snapshot")]
        format: String,
    },

    /// Replace all data with a snapshot backup
    Restore {
        /// Snapshot file
        #[arg(short, long)]
        input: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), DojoError> {
    let config = Config::load(&cli.config)?;
    let ctx = Context::new(config, cli.database, cli.json_mode);

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&ctx, host, port).await,
        Some(Commands::Status) | None => cmd_status(&ctx),
        Some(Commands::Init { force }) => cmd_init(&ctx, force),
        Some(Commands::Members { all }) => cmd_members(&ctx, all),
        Some(Commands::AddMember {
            given_name,
            family_name,
            birth_date,
            grade,
            group,
            legacy_total,
        }) => cmd_add_member(
            &ctx,
            given_name,
            family_name,
            birth_date,
            grade,
            group,
            legacy_total,
        ),
        Some(Commands::Deactivate { member }) => cmd_deactivate(&ctx, member),
        Some(Commands::Attend { date, exam, ids }) => cmd_attend(&ctx, date, exam, &ids),
        Some(Commands::Evaluate { member, today }) => cmd_evaluate(&ctx, member, today),
        Some(Commands::Stickers { member }) => cmd_stickers(&ctx, member),
        Some(Commands::Award {
            member,
            trainer,
            date,
        }) => cmd_award(&ctx, member, trainer, date),
        Some(Commands::Promote { member, date }) => cmd_promote(&ctx, member, date),
        Some(Commands::Import { file, dry_run }) => cmd_import(&ctx, &file, dry_run),
        Some(Commands::Export { output, format }) => cmd_export(&ctx, output, &format),
        Some(Commands::Restore { input }) => cmd_restore(&ctx, &input),
    }
}
