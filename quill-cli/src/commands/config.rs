//! Config command - show or change settings.json

use anyhow::Result;
use clap::Subcommand;
use quill_core::config::Config;

use super::get_journal_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the resolved configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a setting: user, page-size or max-backups
    Set { key: String, value: String },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let journal_dir = get_journal_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&journal_dir)?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "journal_dir": journal_dir.to_string_lossy(),
                        "user": config.user,
                        "page_size": config.page_size,
                        "max_backups": config.max_backups,
                    })
                );
                return Ok(());
            }

            let mut table = output::create_table();
            table.add_row(vec!["Journal directory".to_string(), journal_dir.display().to_string()]);
            table.add_row(vec![
                "User".to_string(),
                config.user.unwrap_or_else(|| "(none)".to_string()),
            ]);
            table.add_row(vec!["Page size".to_string(), config.page_size.to_string()]);
            table.add_row(vec!["Max backups".to_string(), config.max_backups.to_string()]);
            println!("{}", table);
        }
        ConfigCommands::Set { key, value } => {
            std::fs::create_dir_all(&journal_dir)?;
            let mut config = Config::load_file(&journal_dir)?;
            config.set(&key, &value)?;
            config.save(&journal_dir)?;
            output::success(&format!("Set {} = {}", key, value));
            if key == "user" && std::env::var("QUILL_USER").is_ok() {
                output::warning("QUILL_USER is set and overrides this value.");
            }
        }
    }

    Ok(())
}
