//! List command - page through entries

use anyhow::Result;
use quill_core::domain::PageRequest;

use super::{get_context, parse_optional_day};
use crate::output;

pub struct ListArgs {
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: i64,
    pub page_size: Option<i64>,
    pub oldest_first: bool,
    pub json: bool,
}

pub async fn run(args: ListArgs) -> Result<()> {
    let ctx = get_context()?;
    let from = parse_optional_day(args.from.as_deref())?;
    let to = parse_optional_day(args.to.as_deref())?;
    let request = PageRequest::new(args.page, args.page_size.unwrap_or(ctx.config.page_size));

    let page = ctx
        .journal_service
        .list_page(request.page(), request.size(), !args.oldest_first, from, to)
        .await?;

    if args.json {
        return output::print_json(&page);
    }

    if page.items.is_empty() {
        println!("No entries found.");
        return Ok(());
    }

    println!("{}", output::entry_table(&page.items));
    output::info(&output::page_footer(request.page(), request.size(), page.total));
    Ok(())
}
