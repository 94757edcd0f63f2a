//! Calendar command - entries per day for one month

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use colored::Colorize;

use super::get_context;
use crate::output;

pub async fn run(year: Option<i32>, month: Option<u32>, json: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let year = year.unwrap_or(today.year());
    let month = month.unwrap_or(today.month());

    let ctx = get_context()?;
    let counts = ctx.journal_service.counts_by_day(year, month).await?;

    if json {
        return output::print_json(&counts);
    }

    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Ok(());
    };
    println!("{}", first.format("%B %Y").to_string().bold());
    for line in month_grid(first, &counts) {
        println!("{}", line);
    }
    let total: i64 = counts.values().sum();
    println!();
    println!("{} entries on {} days", total, counts.len());
    Ok(())
}

/// Monday-first grid; days with entries are marked with `*`
fn month_grid(first: NaiveDate, counts: &BTreeMap<NaiveDate, i64>) -> Vec<String> {
    let mut lines = vec![" Mo  Tu  We  Th  Fr  Sa  Su".to_string()];
    let mut line = "    ".repeat(first.weekday().num_days_from_monday() as usize);

    let mut day = first;
    while day.month() == first.month() {
        let marker = if counts.contains_key(&day) { '*' } else { ' ' };
        line.push_str(&format!("{:>3}{}", day.day(), marker));

        if day.weekday().num_days_from_monday() == 6 {
            lines.push(line.trim_end().to_string());
            line = String::new();
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    if !line.trim().is_empty() {
        lines.push(line.trim_end().to_string());
    }
    lines
}
