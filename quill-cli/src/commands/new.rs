//! New command - write a journal entry

use anyhow::Result;
use colored::Colorize;
use quill_core::services::LogEvent;

use super::{get_logger, get_signed_in_context, log_event, parse_day, read_body};
use crate::output;

pub async fn run(title: &str, date: &str, body: Option<String>, json: bool) -> Result<()> {
    let ctx = get_signed_in_context()?;
    let date = parse_day(date)?;
    let body = read_body(body)?.unwrap_or_default();

    let entry = ctx.journal_service.create(title, date, &body).await?;
    log_event(&get_logger(), LogEvent::new("entry_created").with_command("new"));

    if json {
        return output::print_json(&entry);
    }

    output::success("Entry saved");
    println!("  {} {}", "ID:".bold(), entry.id);
    println!("  {} {}", "Date:".bold(), entry.date);
    println!("  {} {}", "Title:".bold(), entry.title);
    Ok(())
}
