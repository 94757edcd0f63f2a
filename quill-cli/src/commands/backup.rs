//! Backup command - export, archive and restore entries

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use quill_core::services::LogEvent;
use quill_core::{RestoreMode, RestoreReport};

use super::{get_logger, get_signed_in_context, log_event};
use crate::output;

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Write all entries to a JSON file
    Export {
        /// Destination file
        path: PathBuf,
    },
    /// Create a new backup archive
    Create {
        /// Maximum number of backups to keep (defaults to settings)
        #[arg(long, short = 'm')]
        max_backups: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available backup archives
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Restore from a backup archive or a JSON export file
    Restore {
        /// Archive name from `backup list`
        name: Option<String>,
        /// Restore from a JSON export file instead of an archive
        #[arg(long, conflicts_with = "name")]
        file: Option<PathBuf>,
        /// merge (default) or replace-all
        #[arg(long, default_value = "merge")]
        mode: String,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all backup archives
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

enum RestoreSource {
    Archive(String),
    File(PathBuf),
}

impl RestoreSource {
    fn label(&self) -> String {
        match self {
            RestoreSource::Archive(name) => name.clone(),
            RestoreSource::File(path) => path.display().to_string(),
        }
    }
}

pub async fn run(command: BackupCommands) -> Result<()> {
    let ctx = get_signed_in_context()?;
    let backup_service = &ctx.backup_service;

    match command {
        BackupCommands::Export { path } => {
            let count = backup_service.export_to_file(&path).await?;
            output::success(&format!("Exported {} entries to {}", count, path.display()));
        }
        BackupCommands::Create { max_backups, json } => {
            let max = max_backups.unwrap_or(ctx.config.max_backups);
            let result = backup_service.create(Some(max)).await?;
            log_event(&get_logger(), LogEvent::new("backup_created").with_command("backup create"));

            if json {
                return output::print_json(&result);
            }
            println!("{}", "Backup created".green());
            println!("  Name: {}", result.name);
            println!("  Size: {}", result.size_display());
        }
        BackupCommands::List { json } => {
            let backups = backup_service.list().await?;

            if json {
                return output::print_json(&backups);
            }
            if backups.is_empty() {
                println!("No backups found.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Name", "Created", "Size"]);
            for backup in &backups {
                table.add_row(vec![
                    backup.name.clone(),
                    backup.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    backup.size_display(),
                ]);
            }
            println!("{}", table);
        }
        BackupCommands::Restore {
            name,
            file,
            mode,
            force,
            json,
        } => {
            let mode: RestoreMode = mode.parse()?;
            let source = match (name, file) {
                (Some(name), None) => RestoreSource::Archive(name),
                (None, Some(path)) => RestoreSource::File(path),
                _ => bail!("Give a backup name or --file <path>"),
            };

            if !force && !json {
                let prompt = match mode {
                    RestoreMode::Merge => format!("Merge entries from '{}'?", source.label()),
                    RestoreMode::ReplaceAll => format!(
                        "Replace ALL of your entries with those in '{}'?",
                        source.label()
                    ),
                };
                if !Confirm::new().with_prompt(prompt).default(false).interact()? {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let logger = get_logger();
            log_event(&logger, LogEvent::new("restore_started").with_command("backup restore"));

            let result = match &source {
                RestoreSource::Archive(name) => backup_service.restore_archive(name, mode).await,
                RestoreSource::File(path) => backup_service.restore_file(path, mode).await,
            };
            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    log_event(
                        &logger,
                        LogEvent::new("restore_failed")
                            .with_command("backup restore")
                            .with_error(e.to_string()),
                    );
                    return Err(e.into());
                }
            };
            log_event(&logger, LogEvent::new("restore_completed").with_command("backup restore"));

            if json {
                return output::print_json(&report);
            }
            print_report(&report);
        }
        BackupCommands::Clear { force, json } => {
            if !force
                && !json
                && !Confirm::new()
                    .with_prompt("Delete all backups?")
                    .default(false)
                    .interact()?
            {
                println!("Cancelled.");
                return Ok(());
            }

            let result = backup_service.clear().await?;
            if json {
                return output::print_json(&result);
            }
            println!("Deleted {} backup(s)", result.deleted);
        }
    }

    Ok(())
}

fn print_report(report: &RestoreReport) {
    output::success("Restore complete");
    println!("  Added:   {}", report.added);
    println!("  Updated: {}", report.updated);
    println!("  Skipped: {}", report.skipped);
    if report.deleted > 0 {
        println!("  Deleted: {}", report.deleted);
    }
    if !report.errors.is_empty() {
        output::warning(&format!("{} entries could not be restored:", report.errors.len()));
        for error in &report.errors {
            println!("  - {}", error);
        }
    }
}
