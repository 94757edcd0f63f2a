//! Status service - journal summary for the current user

use std::sync::Arc;

use chrono::{Datelike, Local, Months, NaiveDate};
use serde::Serialize;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::Result;
use crate::domain::EntryQuery;
use crate::ports::CurrentUser;

pub struct StatusService {
    repository: Arc<DuckDbRepository>,
    user: Arc<dyn CurrentUser>,
}

impl StatusService {
    pub fn new(repository: Arc<DuckDbRepository>, user: Arc<dyn CurrentUser>) -> Self {
        Self { repository, user }
    }

    /// Summary for today's month in local time
    pub async fn get_status(&self) -> Result<StatusSummary> {
        self.get_status_at(Local::now().date_naive()).await
    }

    /// Summary with `this_month` counted for the month containing `today`
    pub async fn get_status_at(&self, today: NaiveDate) -> Result<StatusSummary> {
        let Some(owner) = self.user.user_id().await else {
            return Ok(StatusSummary::default());
        };

        let month_start = today.with_day(1).unwrap_or(today);
        let month_end = month_start
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(today);

        self.repository.scoped(&owner, |entries| {
            let (earliest, latest) = entries.date_range()?;
            let this_month = entries.count(
                &EntryQuery::new().between(Some(month_start), Some(month_end)),
            )?;

            Ok(StatusSummary {
                user: Some(owner.clone()),
                total_entries: entries.count(&EntryQuery::new())?,
                this_month,
                date_range: DateRange {
                    earliest: earliest.map(|d| d.to_string()),
                    latest: latest.map(|d| d.to_string()),
                },
            })
        })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct StatusSummary {
    /// `None` when nobody is signed in
    pub user: Option<String>,
    pub total_entries: i64,
    pub this_month: i64,
    pub date_range: DateRange,
}

#[derive(Debug, Default, Serialize)]
pub struct DateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}
