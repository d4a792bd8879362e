//! # EduPlan CLI Module
//!
//! This module implements the CLI interface for EduPlan.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `catalogs` - List known catalogs
//! - `plan` - Show a user's curriculum view for one course
//! - `profile` - Show a user's profile
//! - `profile-set` - Save a user's profile and selected course
//! - `set-status` - Mark a subject
//! - `clear-status` - Clear a subject's mark
//! - `schedule` - Show a user's weekly schedule
//! - `schedule-set` - Write one schedule cell
//! - `init` - Initialize a new database
//! - `remote-plan` - Log in to the remote service and show a plan from it
//! - `remote-register` - Create an account on the remote service
//!
//! Commands that take `--course` fall back to the course selected in the
//! user's profile when it is omitted.

mod commands;

use crate::config::{Backend, Config};
use crate::remote::RegisterRequest;
use clap::{Parser, Subcommand};
use eduplan_core::{PlannerError, StatusChange};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// EduPlan - curriculum availability planner
///
/// Tracks which subjects a student has completed, is taking or plans to
/// take, and which ones are open given their prerequisites.
#[derive(Parser, Debug)]
#[command(name = "eduplan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the progress database (overrides config)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend (overrides config)
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// JSON file of catalog documents (overrides config)
    #[arg(long, global = true)]
    pub catalogs: Option<PathBuf>,

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
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List known catalogs
    Catalogs,

    /// Show the curriculum view of a course for a user
    Plan {
        #[arg(short, long)]
        user: String,

        #[arg(short = 'k', long)]
        course: Option<u64>,
    },

    /// Show a user's profile
    Profile {
        #[arg(short, long)]
        user: String,
    },

    /// Save a user's profile
    ProfileSet {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        email: String,

        /// Course whose catalog becomes the user's default
        #[arg(short = 'k', long)]
        course: Option<u64>,
    },

    /// Mark a subject as completed, in_progress or planned
    SetStatus {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        subject: String,

        /// completed, in_progress, planned
        #[arg(short = 't', long)]
        status: String,

        #[arg(short = 'k', long)]
        course: Option<u64>,
    },

    /// Clear a subject's status
    ClearStatus {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        subject: String,

        #[arg(short = 'k', long)]
        course: Option<u64>,
    },

    /// Show a user's weekly schedule
    Schedule {
        #[arg(short, long)]
        user: String,
    },

    /// Write one schedule cell; an empty label clears it
    ScheduleSet {
        #[arg(short, long)]
        user: String,

        /// monday .. friday
        #[arg(short, long)]
        day: String,

        /// HH:00 between 07:00 and 22:00
        #[arg(short, long)]
        time: String,

        #[arg(short, long, default_value = "")]
        label: String,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show a plan built from the remote service
    RemotePlan {
        #[arg(short, long)]
        username: String,

        #[arg(long, env = "EDUPLAN_REMOTE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Defaults to the account's course
        #[arg(short = 'k', long)]
        course: Option<u64>,

        /// Subject to update before showing the plan
        #[arg(long)]
        mark: Option<String>,

        /// Status for --mark: completed, in_progress, planned or remove
        #[arg(short = 't', long, default_value = "completed")]
        status: String,
    },

    /// Create an account on the remote service
    RemoteRegister {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(long, env = "EDUPLAN_REMOTE_PASSWORD", hide_env_values = true)]
        password: String,

        /// University id on the remote service
        #[arg(long)]
        university: u64,

        #[arg(long, default_value = "")]
        city: String,

        /// Course id on the remote service
        #[arg(short = 'k', long)]
        course: u64,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration: file and environment, then CLI flags on top.
pub fn resolve_config(cli: &Cli) -> Result<Config, PlannerError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = &cli.database {
        config.storage.database.clone_from(database);
    }
    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }
    if let Some(catalogs) = &cli.catalogs {
        config.planner.catalogs = Some(catalogs.clone());
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), PlannerError> {
    let config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    if cli.verbose {
        tracing::info!(
            backend = config.storage.backend.as_str(),
            database = %config.storage.database.display(),
            enforce_prerequisites = config.planner.enforce_prerequisites,
            "configuration resolved"
        );
    }

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(config, host, port).await,
        Some(Commands::Catalogs) | None => cmd_catalogs(&config, json_mode),
        Some(Commands::Plan { user, course }) => cmd_plan(&config, json_mode, &user, course),
        Some(Commands::Profile { user }) => cmd_profile(&config, json_mode, &user),
        Some(Commands::ProfileSet {
            user,
            name,
            email,
            course,
        }) => cmd_profile_set(&config, json_mode, &user, name, email, course),
        Some(Commands::SetStatus {
            user,
            subject,
            status,
            course,
        }) => cmd_set_status(&config, json_mode, &user, &subject, &status, course),
        Some(Commands::ClearStatus {
            user,
            subject,
            course,
        }) => cmd_clear_status(&config, json_mode, &user, &subject, course),
        Some(Commands::Schedule { user }) => cmd_schedule(&config, json_mode, &user),
        Some(Commands::ScheduleSet {
            user,
            day,
            time,
            label,
        }) => cmd_schedule_set(&config, json_mode, &user, &day, &time, &label),
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::RemotePlan {
            username,
            password,
            course,
            mark,
            status,
        }) => {
            let mark = match mark {
                Some(subject) => Some((subject, status.parse::<StatusChange>()?)),
                None => None,
            };
            cmd_remote_plan(&config, json_mode, &username, &password, course, mark).await
        }
        Some(Commands::RemoteRegister {
            name,
            email,
            password,
            university,
            city,
            course,
        }) => {
            let request = RegisterRequest {
                name,
                email,
                confirm_password: password.clone(),
                password,
                university,
                city,
                course,
            };
            cmd_remote_register(&config, json_mode, &request).await
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
