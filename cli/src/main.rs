mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::commands::{
    cmd_activity_add, cmd_activity_delete, cmd_activity_list, cmd_activity_update, cmd_convert,
    cmd_group_create, cmd_group_delete, cmd_group_list, cmd_group_rename, cmd_log,
    cmd_log_delete, cmd_log_update, cmd_logs, cmd_progress, cmd_unit_add, cmd_unit_delete,
    cmd_unit_list, cmd_unit_update,
};
use crate::config::Config;
use tally_core::db::Database;
use tally_core::service::TallyService;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Track activities in any unit and see how close you are to your goals"
)]
struct Cli {
    /// Database file (default: per-user data directory)
    #[arg(long, global = true, env = "TALLY_DB")]
    db: Option<PathBuf>,
    /// Log debug output to stderr (`TALLY_LOG` takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage unit groups (distance, time, ...)
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Manage units within a group
    Unit {
        #[command(subcommand)]
        command: UnitCommands,
    },
    /// Convert a quantity between two units of one group
    Convert {
        /// Quantity to convert
        #[arg(allow_negative_numbers = true)]
        quantity: f64,
        /// Unit the quantity is in
        from: String,
        /// Unit to convert to
        to: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage activity types and their goals
    Activity {
        #[command(subcommand)]
        command: ActivityCommands,
    },
    /// Log an activity
    Log {
        /// Activity name or ID
        activity: String,
        /// Quantity, optionally with a unit (e.g. "45", "5km", "1.5 hours")
        #[arg(allow_hyphen_values = true)]
        quantity: String,
        /// Unit of the quantity (default: the group's canonical unit)
        #[arg(short, long)]
        unit: Option<String>,
        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the logs of an activity
    Logs {
        /// Activity name or ID
        activity: String,
        /// Show quantities in this unit (default: canonical)
        #[arg(short, long)]
        unit: Option<String>,
        /// Only the last N days, today included
        #[arg(short, long)]
        days: Option<u32>,
        /// Only logs from this date on (YYYY-MM-DD, today, yesterday)
        #[arg(long)]
        since: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the quantity or note of a log
    LogUpdate {
        /// Log ID
        id: i64,
        /// New quantity, optionally with a unit
        #[arg(allow_hyphen_values = true)]
        quantity: Option<String>,
        /// Unit of the new quantity (default: canonical)
        #[arg(short, long)]
        unit: Option<String>,
        /// New note
        #[arg(short, long)]
        note: Option<String>,
        /// Remove the note
        #[arg(long)]
        clear_note: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a log
    LogDelete {
        /// Log ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show progress towards goals
    Progress {
        /// Activity name or ID (default: all activities)
        activity: Option<String>,
        /// Only the last N days, today included
        #[arg(short, long)]
        days: Option<u32>,
        /// Only logs from this date on (YYYY-MM-DD, today, yesterday)
        #[arg(long)]
        since: Option<String>,
        /// Show figures in this unit (needs an activity)
        #[arg(short, long)]
        unit: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GroupCommands {
    /// Create a group together with its canonical unit
    Create {
        /// Group name (e.g. "distance")
        name: String,
        /// Canonical unit name (e.g. "meters")
        canonical_unit: String,
        #[arg(long)]
        json: bool,
    },
    /// List groups with their canonical units
    List {
        #[arg(long)]
        json: bool,
    },
    /// Rename a group
    Rename {
        /// Group name or ID
        group: String,
        new_name: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete a group with its units, activities and logs
    Delete {
        /// Group name or ID
        group: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum UnitCommands {
    /// Add a unit: canonical = quantity * factor + offset
    Add {
        /// Group name or ID
        group: String,
        /// Unit name (e.g. "kilometers")
        name: String,
        /// Canonical units per one of this unit
        #[arg(short, long, allow_negative_numbers = true)]
        factor: f64,
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        offset: f64,
        #[arg(long)]
        json: bool,
    },
    /// List units
    List {
        /// Only units of this group
        #[arg(short, long)]
        group: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Change a unit (the canonical unit is fixed)
    Update {
        /// Unit name or ID
        unit: String,
        #[arg(long)]
        name: Option<String>,
        /// Move to another group
        #[arg(short, long)]
        group: Option<String>,
        #[arg(short, long, allow_negative_numbers = true)]
        factor: Option<f64>,
        #[arg(short, long, allow_negative_numbers = true)]
        offset: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Delete a unit (the canonical unit is fixed)
    Delete {
        /// Unit name or ID
        unit: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ActivityCommands {
    /// Add an activity type
    Add {
        /// Activity name (e.g. "yoga")
        name: String,
        /// Group name or ID the activity is measured in
        group: String,
        /// Goal quantity, optionally with a unit (e.g. "60", "20km")
        #[arg(short, long)]
        goal: Option<String>,
        /// Unit of the goal (default: canonical)
        #[arg(long)]
        goal_unit: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List activity types
    List {
        #[arg(long)]
        json: bool,
    },
    /// Rename, regroup, or change the goal of an activity type
    Update {
        /// Activity name or ID
        activity: String,
        #[arg(long)]
        name: Option<String>,
        /// Move to another group (only while it has no logs)
        #[arg(long)]
        group: Option<String>,
        #[arg(short, long)]
        goal: Option<String>,
        #[arg(long)]
        goal_unit: Option<String>,
        /// Remove the goal
        #[arg(long)]
        clear_goal: bool,
        #[arg(long)]
        json: bool,
    },
    /// Delete an activity type and its logs
    Delete {
        /// Activity name or ID
        activity: String,
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    tracing::debug!(path = %config.db_path.display(), "using database");
    let db = Database::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    let service = TallyService::from_database(db);

    match cli.command {
        Commands::Group { command } => match command {
            GroupCommands::Create {
                name,
                canonical_unit,
                json,
            } => cmd_group_create(&service, &name, &canonical_unit, json),
            GroupCommands::List { json } => cmd_group_list(&service, json),
            GroupCommands::Rename {
                group,
                new_name,
                json,
            } => cmd_group_rename(&service, &group, &new_name, json),
            GroupCommands::Delete { group, json } => cmd_group_delete(&service, &group, json),
        },
        Commands::Unit { command } => match command {
            UnitCommands::Add {
                group,
                name,
                factor,
                offset,
                json,
            } => cmd_unit_add(&service, &group, &name, factor, offset, json),
            UnitCommands::List { group, json } => cmd_unit_list(&service, group.as_deref(), json),
            UnitCommands::Update {
                unit,
                name,
                group,
                factor,
                offset,
                json,
            } => cmd_unit_update(&service, &unit, name, group.as_deref(), factor, offset, json),
            UnitCommands::Delete { unit, json } => cmd_unit_delete(&service, &unit, json),
        },
        Commands::Convert {
            quantity,
            from,
            to,
            json,
        } => cmd_convert(&service, quantity, &from, &to, json),
        Commands::Activity { command } => match command {
            ActivityCommands::Add {
                name,
                group,
                goal,
                goal_unit,
                json,
            } => cmd_activity_add(&service, &name, &group, goal.as_deref(), goal_unit, json),
            ActivityCommands::List { json } => cmd_activity_list(&service, json),
            ActivityCommands::Update {
                activity,
                name,
                group,
                goal,
                goal_unit,
                clear_goal,
                json,
            } => cmd_activity_update(
                &service,
                &activity,
                name,
                group.as_deref(),
                goal.as_deref(),
                goal_unit,
                clear_goal,
                json,
            ),
            ActivityCommands::Delete { activity, json } => {
                cmd_activity_delete(&service, &activity, json)
            }
        },
        Commands::Log {
            activity,
            quantity,
            unit,
            note,
            json,
        } => cmd_log(&service, &activity, &quantity, unit, note, json),
        Commands::Logs {
            activity,
            unit,
            days,
            since,
            json,
        } => cmd_logs(
            &service,
            &activity,
            unit.as_deref(),
            days,
            since.as_deref(),
            json,
        ),
        Commands::LogUpdate {
            id,
            quantity,
            unit,
            note,
            clear_note,
            json,
        } => cmd_log_update(
            &service,
            id,
            quantity.as_deref(),
            unit,
            note,
            clear_note,
            json,
        ),
        Commands::LogDelete { id, json } => cmd_log_delete(&service, id, json),
        Commands::Progress {
            activity,
            days,
            since,
            unit,
            json,
        } => cmd_progress(
            &service,
            activity.as_deref(),
            days,
            since.as_deref(),
            unit.as_deref(),
            json,
        ),
    }
}
