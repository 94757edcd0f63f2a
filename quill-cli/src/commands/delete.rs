//! Delete command - remove an entry

use anyhow::{bail, Result};
use dialoguer::Confirm;
use quill_core::services::LogEvent;

use super::{get_context, get_logger, log_event};
use crate::output;

pub async fn run(id: i64, force: bool) -> Result<()> {
    let ctx = get_context()?;
    let Some(entry) = ctx.journal_service.get(id).await? else {
        bail!("Entry {} not found", id);
    };

    if !force
        && !Confirm::new()
            .with_prompt(format!("Delete '{}' ({})?", entry.title, entry.date))
            .default(false)
            .interact()?
    {
        println!("Cancelled.");
        return Ok(());
    }

    ctx.journal_service.delete(id).await?;
    log_event(&get_logger(), LogEvent::new("entry_deleted").with_command("delete"));

    output::success(&format!("Entry {} deleted", id));
    Ok(())
}
