//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use quill_core::Entry;
use serde::Serialize;

pub fn success(msg: &str) {
    println!("{}", msg.green());
}

pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Entries as a table: id, date, title and the first line of the body
pub fn entry_table(entries: &[Entry]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["ID", "Date", "Title", "Preview"]);
    for entry in entries {
        table.add_row(vec![
            entry.id.to_string(),
            entry.date.to_string(),
            entry.title.clone(),
            crate::commands::preview(&entry.body, 48),
        ]);
    }
    table
}

/// "Page 2 of 5 (93 entries)"
pub fn page_footer(page: i64, page_size: i64, total: i64) -> String {
    let pages = if total == 0 {
        1
    } else {
        (total + page_size - 1) / page_size
    };
    let noun = if total == 1 { "entry" } else { "entries" };
    format!("Page {} of {} ({} {})", page, pages, total, noun)
}
