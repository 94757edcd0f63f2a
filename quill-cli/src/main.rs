//! Quill CLI - a personal journal in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use quill_core::services::LogEvent;

mod commands;
mod output;

use commands::{
    backup, calendar, config, delete, edit, get_logger, list, log_event, logs, new, search, show,
    status,
};

/// Quill - a personal journal in your terminal
#[derive(Parser)]
#[command(name = "ql", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a new entry
    New {
        /// Entry title
        title: String,
        /// Entry date: YYYY-MM-DD, today or yesterday
        #[arg(long, short, default_value = "today")]
        date: String,
        /// Entry text (read from stdin when piped and not given)
        #[arg(long, short)]
        body: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List entries, newest first
    List {
        /// Earliest date to include
        #[arg(long)]
        from: Option<String>,
        /// Latest date to include
        #[arg(long)]
        to: Option<String>,
        /// Page number, starting at 1
        #[arg(long, short, default_value = "1", allow_negative_numbers = true)]
        page: i64,
        /// Entries per page (defaults to settings)
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,
        /// Oldest entries first
        #[arg(long)]
        oldest_first: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one entry
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change an entry
    Edit {
        id: i64,
        /// New title
        #[arg(long, short)]
        title: Option<String>,
        /// New date
        #[arg(long, short)]
        date: Option<String>,
        /// New text (read from stdin when piped and not given)
        #[arg(long, short)]
        body: Option<String>,
    },

    /// Delete an entry
    Delete {
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Search titles and text
    Search {
        /// Text to look for (case-insensitive)
        query: Option<String>,
        /// Earliest date to include
        #[arg(long)]
        from: Option<String>,
        /// Latest date to include
        #[arg(long)]
        to: Option<String>,
        /// Page number, starting at 1
        #[arg(long, short, default_value = "1", allow_negative_numbers = true)]
        page: i64,
        /// Entries per page (defaults to settings)
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Entries per day for a month
    Calendar {
        /// Year (defaults to the current one)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (defaults to the current one)
        #[arg(long)]
        month: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show journal status and summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export, archive and restore entries
    Backup {
        #[command(subcommand)]
        command: backup::BackupCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

impl Commands {
    /// Name recorded in the event log
    fn name(&self) -> &'static str {
        match self {
            Commands::New { .. } => "new",
            Commands::List { .. } => "list",
            Commands::Show { .. } => "show",
            Commands::Edit { .. } => "edit",
            Commands::Delete { .. } => "delete",
            Commands::Search { .. } => "search",
            Commands::Calendar { .. } => "calendar",
            Commands::Status { .. } => "status",
            Commands::Backup { .. } => "backup",
            Commands::Logs { .. } => "logs",
            Commands::Config { .. } => "config",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let command_name = cli.command.name();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_event(
                &get_logger(),
                LogEvent::new("command_failed")
                    .with_command(command_name)
                    .with_error(e.to_string()),
            );
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::New {
            title,
            date,
            body,
            json,
        } => new::run(&title, &date, body, json).await,
        Commands::List {
            from,
            to,
            page,
            page_size,
            oldest_first,
            json,
        } => {
            list::run(list::ListArgs {
                from,
                to,
                page,
                page_size,
                oldest_first,
                json,
            })
            .await
        }
        Commands::Show { id, json } => show::run(id, json).await,
        Commands::Edit {
            id,
            title,
            date,
            body,
        } => edit::run(id, title, date, body).await,
        Commands::Delete { id, force } => delete::run(id, force).await,
        Commands::Search {
            query,
            from,
            to,
            page,
            page_size,
            json,
        } => {
            search::run(search::SearchArgs {
                query,
                from,
                to,
                page,
                page_size,
                json,
            })
            .await
        }
        Commands::Calendar { year, month, json } => calendar::run(year, month, json).await,
        Commands::Status { json } => status::run(json).await,
        Commands::Backup { command } => backup::run(command).await,
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
    }
}
