//! Journal service - entry CRUD, listing, search and calendar counts
//!
//! Every operation resolves the current user once and works only on that
//! user's entries. Without a user, reads come back empty and writes other
//! than `create` do nothing.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Months, NaiveDate};

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{
    check_day, normalize_title, timestamp_now, CalendarDay, Entry, EntryQuery, NewEntry, Page,
    PageRequest,
};
use crate::ports::CurrentUser;

pub struct JournalService {
    repository: Arc<DuckDbRepository>,
    user: Arc<dyn CurrentUser>,
}

impl JournalService {
    pub fn new(repository: Arc<DuckDbRepository>, user: Arc<dyn CurrentUser>) -> Self {
        Self { repository, user }
    }

    /// All entries in `from..=to`, newest date first, then most recently updated
    pub async fn list(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Vec<Entry>> {
        let Some(owner) = self.user.user_id().await else {
            return Ok(Vec::new());
        };
        let query = EntryQuery::new().between(from, to);
        self.repository.scoped(&owner, |entries| entries.list(&query))
    }

    /// One page of entries in `from..=to`.
    ///
    /// Non-positive `page` is treated as 1 and non-positive `page_size` as
    /// the default page size.
    pub async fn list_page(
        &self,
        page: i64,
        page_size: i64,
        newest_first: bool,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Page<Entry>> {
        let query = EntryQuery::new().between(from, to).ordered(newest_first);
        self.page(&query, PageRequest::new(page, page_size)).await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Entry>> {
        let Some(owner) = self.user.user_id().await else {
            return Ok(None);
        };
        self.repository.scoped(&owner, |entries| entries.get(id))
    }

    /// Store a new entry for the current user
    pub async fn create(&self, title: &str, date: impl CalendarDay, body: &str) -> Result<Entry> {
        let owner = self.user.user_id().await.ok_or(Error::Unauthenticated)?;
        let new = NewEntry::new(title, date, body)?;
        let entry = self.repository.scoped(&owner, |entries| entries.insert(&new))?;
        log::debug!("Created entry {}", entry.id);
        Ok(entry)
    }

    /// Overwrite an entry's fields and refresh `updated_at`.
    ///
    /// Does nothing when there is no user or the id is not one of theirs.
    pub async fn update(&self, id: i64, title: &str, date: impl CalendarDay, body: &str) -> Result<()> {
        let Some(owner) = self.user.user_id().await else {
            return Ok(());
        };
        let date = date.calendar_day();

        self.repository.scoped(&owner, |entries| {
            let Some(mut entry) = entries.get(id)? else {
                return Ok(());
            };

            let title = normalize_title(title)?;
            if title.is_empty() {
                return Err(Error::validation("title is required"));
            }
            entry.title = title;
            entry.date = check_day(date)?;
            entry.body = body.trim().to_string();
            entry.updated_at = timestamp_now();

            entries.update(&entry)?;
            Ok(())
        })
    }

    /// Remove an entry; does nothing when it is missing or not owned
    pub async fn delete(&self, id: i64) -> Result<()> {
        let Some(owner) = self.user.user_id().await else {
            return Ok(());
        };
        let deleted = self.repository.scoped(&owner, |entries| entries.delete(id))?;
        if deleted {
            log::debug!("Deleted entry {}", id);
        }
        Ok(())
    }

    /// Case-insensitive search over title and body, newest first.
    ///
    /// A blank query matches every entry in the date range.
    pub async fn search(
        &self,
        text: Option<&str>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: i64,
        page_size: i64,
    ) -> Result<Page<Entry>> {
        let query = EntryQuery::new().between(from, to).matching(text);
        self.page(&query, PageRequest::new(page, page_size)).await
    }

    /// Number of entries per day of the given month; days without entries are absent
    pub async fn counts_by_day(&self, year: i32, month: u32) -> Result<BTreeMap<NaiveDate, i64>> {
        let (first, last) = month_bounds(year, month)?;
        let Some(owner) = self.user.user_id().await else {
            return Ok(BTreeMap::new());
        };
        self.repository
            .scoped(&owner, |entries| entries.counts_by_day(first, last))
    }

    async fn page(&self, query: &EntryQuery, page: PageRequest) -> Result<Page<Entry>> {
        let Some(owner) = self.user.user_id().await else {
            return Ok(Page::empty());
        };
        self.repository.scoped(&owner, |entries| entries.page(query, page))
    }
}

/// First and last day of a month
fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::validation(format!("invalid month {}-{}", year, month)))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| Error::validation(format!("month {}-{} is out of range", year, month)))?;
    Ok((first, last))
}
