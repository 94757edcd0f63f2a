//! Status command - journal summary

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status().await?;

    if json {
        return output::print_json(&status);
    }

    println!("{}", "Journal Status".bold());
    println!();

    let Some(user) = &status.user else {
        output::warning("Not signed in. Run 'ql config set user <name>' or set QUILL_USER.");
        return Ok(());
    };

    let mut table = output::create_table();
    table.add_row(vec!["User", user.as_str()]);
    table.add_row(vec!["Entries", &status.total_entries.to_string()]);
    table.add_row(vec!["This month", &status.this_month.to_string()]);
    println!("{}", table);

    if let (Some(earliest), Some(latest)) = (&status.date_range.earliest, &status.date_range.latest) {
        println!();
        println!("Date range: {} to {}", earliest, latest);
    }

    println!();
    println!(
        "Database: {} ({})",
        ctx.repository.db_path().display(),
        output::format_size(ctx.repository.get_db_size()?)
    );
    Ok(())
}
