//! Show command - print one entry

use anyhow::{bail, Result};
use colored::Colorize;

use super::get_context;
use crate::output;

pub async fn run(id: i64, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let Some(entry) = ctx.journal_service.get(id).await? else {
        bail!("Entry {} not found", id);
    };

    if json {
        return output::print_json(&entry);
    }

    println!("{}", entry.title.bold());
    println!(
        "{}",
        format!(
            "{} · #{} · updated {}",
            entry.date,
            entry.id,
            entry.updated_at.format("%Y-%m-%d %H:%M")
        )
        .dimmed()
    );
    if !entry.body.is_empty() {
        println!();
        println!("{}", entry.body);
    }
    Ok(())
}
