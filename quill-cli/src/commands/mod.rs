//! CLI command implementations

pub mod backup;
pub mod calendar;
pub mod config;
pub mod delete;
pub mod edit;
pub mod list;
pub mod logs;
pub mod new;
pub mod search;
pub mod show;
pub mod status;

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use quill_core::services::{EntryPoint, LogEvent, LoggingService};
use quill_core::QuillContext;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let journal_dir = get_journal_dir().ok()?;
    std::fs::create_dir_all(&journal_dir).ok()?;
    LoggingService::new(&journal_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        if let Err(e) = l.log(event) {
            log::debug!("Event log write failed: {}", e);
        }
    }
}

/// Journal directory from `QUILL_DIR`, or `~/.quill`
pub fn get_journal_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("QUILL_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".quill"))
        .context("Could not find home directory; set QUILL_DIR")
}

/// Open the journal as the configured user
pub fn get_context() -> Result<QuillContext> {
    let journal_dir = get_journal_dir()?;
    std::fs::create_dir_all(&journal_dir)
        .with_context(|| format!("Failed to create journal directory: {:?}", journal_dir))?;

    QuillContext::new(&journal_dir).context("Failed to open journal")
}

/// Open the journal and fail early when nobody is signed in
pub fn get_signed_in_context() -> Result<QuillContext> {
    let ctx = get_context()?;
    if ctx.config.user.is_none() {
        bail!("No user configured. Run 'ql config set user <name>' or set QUILL_USER.");
    }
    Ok(ctx)
}

/// Parse a day given as `YYYY-MM-DD`, `today` or `yesterday`
pub fn parse_day(raw: &str) -> Result<NaiveDate> {
    let today = Local::now().date_naive();
    parse_day_relative(raw, today)
}

fn parse_day_relative(raw: &str, today: NaiveDate) -> Result<NaiveDate> {
    match raw.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => Ok(today - Duration::days(1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw)),
    }
}

/// Parse an optional day argument
pub fn parse_optional_day(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(parse_day).transpose()
}

/// Body from the flag, or from stdin when input is piped
pub fn read_body(body: Option<String>) -> Result<Option<String>> {
    if body.is_some() {
        return Ok(body);
    }
    if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(Some(buffer));
    }
    Ok(None)
}

/// First line of a body, shortened for table cells
pub fn preview(body: &str, max_chars: usize) -> String {
    let line = body.lines().next().unwrap_or("").trim();
    if line.chars().count() > max_chars {
        let cut: String = line.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", cut)
    } else {
        line.to_string()
    }
}
