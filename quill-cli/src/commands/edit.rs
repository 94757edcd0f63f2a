//! Edit command - change an entry's title, date or body

use anyhow::{bail, Result};
use quill_core::services::LogEvent;

use super::{get_context, get_logger, log_event, parse_day, read_body};
use crate::output;

pub async fn run(
    id: i64,
    title: Option<String>,
    date: Option<String>,
    body: Option<String>,
) -> Result<()> {
    let ctx = get_context()?;
    let Some(entry) = ctx.journal_service.get(id).await? else {
        bail!("Entry {} not found", id);
    };

    let title = title.unwrap_or(entry.title);
    let date = match date {
        Some(raw) => parse_day(&raw)?,
        None => entry.date,
    };
    let body = read_body(body)?.unwrap_or(entry.body);

    ctx.journal_service.update(id, &title, date, &body).await?;
    log_event(&get_logger(), LogEvent::new("entry_updated").with_command("edit"));

    output::success(&format!("Entry {} updated", id));
    Ok(())
}
