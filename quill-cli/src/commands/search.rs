//! Search command - find entries by text

use anyhow::Result;
use quill_core::domain::PageRequest;

use super::{get_context, parse_optional_day};
use crate::output;

pub struct SearchArgs {
    pub query: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: i64,
    pub page_size: Option<i64>,
    pub json: bool,
}

pub async fn run(args: SearchArgs) -> Result<()> {
    let ctx = get_context()?;
    let from = parse_optional_day(args.from.as_deref())?;
    let to = parse_optional_day(args.to.as_deref())?;
    let request = PageRequest::new(args.page, args.page_size.unwrap_or(ctx.config.page_size));

    let page = ctx
        .journal_service
        .search(args.query.as_deref(), from, to, request.page(), request.size())
        .await?;

    if args.json {
        return output::print_json(&page);
    }

    if page.items.is_empty() {
        println!("No matching entries.");
        return Ok(());
    }

    println!("{}", output::entry_table(&page.items));
    output::info(&output::page_footer(request.page(), request.size(), page.total));
    Ok(())
}
