//! DuckDB repository implementation
//!
//! Entries are only reachable through [`OwnedEntries`], a handle bound to one
//! owner. Every statement it issues binds `owner_id` as its first parameter,
//! so no code path can read or write another user's rows.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use duckdb::types::Type;
use duckdb::{params, Connection, Row, ToSql};

use crate::domain::result::{Error, Result};
use crate::domain::{Entry, EntryQuery, NewEntry, Page, PageRequest};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const ENTRY_COLUMNS: &str =
    "id, owner_id, title, entry_date::VARCHAR, body, created_at::VARCHAR, updated_at::VARCHAR";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock on file")
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) the journal database.
    ///
    /// Retries with exponential backoff when the file is locked by another
    /// process, e.g. a second CLI invocation still finishing a write.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        log::warn!(
                            "Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; nothing here needs extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        Ok(conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        let result = self.run_migrations()?;
        if !result.applied.is_empty() {
            log::info!("Applied migrations: {}", result.applied.join(", "));
        }
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn get_db_size(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.db_path)?.len())
    }

    /// Run `f` against `owner`'s entries, each statement auto-committing
    pub fn scoped<T, F>(&self, owner: &str, f: F) -> Result<T>
    where
        F: FnOnce(&OwnedEntries<'_>) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&OwnedEntries { conn: &conn, owner })
    }

    /// Run `f` against `owner`'s entries inside one transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`. The
    /// connection lock is held throughout, so nothing else interleaves.
    pub fn transaction<T, F>(&self, owner: &str, f: F) -> Result<T>
    where
        F: FnOnce(&OwnedEntries<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        match f(&OwnedEntries { conn: &tx, owner }) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    log::warn!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// Entry access bound to a single owner
pub struct OwnedEntries<'a> {
    conn: &'a Connection,
    owner: &'a str,
}

impl<'a> OwnedEntries<'a> {
    pub fn owner(&self) -> &str {
        self.owner
    }

    /// All entries matching `query`, in the query's order
    pub fn list(&self, query: &EntryQuery) -> Result<Vec<Entry>> {
        let (where_sql, params) = self.filter(query);
        let sql = format!(
            "SELECT {} FROM entries WHERE {} {}",
            ENTRY_COLUMNS,
            where_sql,
            order_by(query)
        );
        self.fetch(&sql, &params)
    }

    /// One page of entries matching `query`, plus the unpaged total
    pub fn page(&self, query: &EntryQuery, page: PageRequest) -> Result<Page<Entry>> {
        let total = self.count(query)?;

        let (where_sql, mut params) = self.filter(query);
        let sql = format!(
            "SELECT {} FROM entries WHERE {} {} LIMIT ? OFFSET ?",
            ENTRY_COLUMNS,
            where_sql,
            order_by(query)
        );
        params.push(Box::new(page.size()));
        params.push(Box::new(page.offset()));

        Ok(Page {
            items: self.fetch(&sql, &params)?,
            total,
        })
    }

    pub fn count(&self, query: &EntryQuery) -> Result<i64> {
        let (where_sql, params) = self.filter(query);
        let sql = format!("SELECT COUNT(*) FROM entries WHERE {}", where_sql);
        let refs = param_refs(&params);
        let count: i64 = self
            .conn
            .query_row(&sql, refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    pub fn get(&self, id: i64) -> Result<Option<Entry>> {
        let sql = format!(
            "SELECT {} FROM entries WHERE owner_id = ? AND id = ?",
            ENTRY_COLUMNS
        );
        let params: Vec<Box<dyn ToSql>> = vec![Box::new(self.owner.to_string()), Box::new(id)];
        Ok(self.fetch(&sql, &params)?.into_iter().next())
    }

    /// Find an entry by date and exact (already trimmed) title.
    ///
    /// Natural keys are not unique; the most recently updated match wins.
    pub fn find_by_natural_key(&self, date: NaiveDate, title: &str) -> Result<Option<Entry>> {
        let sql = format!(
            "SELECT {} FROM entries
             WHERE owner_id = ? AND entry_date = CAST(? AS DATE) AND title = ?
             ORDER BY updated_at DESC, id DESC
             LIMIT 1",
            ENTRY_COLUMNS
        );
        let params: Vec<Box<dyn ToSql>> = vec![
            Box::new(self.owner.to_string()),
            Box::new(date.to_string()),
            Box::new(title.to_string()),
        ];
        Ok(self.fetch(&sql, &params)?.into_iter().next())
    }

    pub fn insert(&self, new: &NewEntry) -> Result<Entry> {
        let id: i64 = self
            .conn
            .query_row("SELECT nextval('entries_id_seq')", [], |row| row.get(0))?;

        self.conn.execute(
            "INSERT INTO entries (id, owner_id, title, entry_date, body, created_at, updated_at)
             VALUES (?, ?, ?, CAST(? AS DATE), ?, CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP))",
            params![
                id,
                self.owner,
                new.title,
                new.date.to_string(),
                new.body,
                format_timestamp(&new.created_at),
                format_timestamp(&new.updated_at),
            ],
        )?;

        Ok(Entry {
            id,
            owner_id: self.owner.to_string(),
            title: new.title.clone(),
            date: new.date,
            body: new.body.clone(),
            created_at: new.created_at,
            updated_at: new.updated_at,
        })
    }

    /// Overwrite title, date, body and `updated_at`. Returns false if no row matched.
    pub fn update(&self, entry: &Entry) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE entries
             SET title = ?, entry_date = CAST(? AS DATE), body = ?,
                 updated_at = CAST(? AS TIMESTAMP)
             WHERE owner_id = ? AND id = ?",
            params![
                entry.title,
                entry.date.to_string(),
                entry.body,
                format_timestamp(&entry.updated_at),
                self.owner,
                entry.id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM entries WHERE owner_id = ? AND id = ?",
            params![self.owner, id],
        )?;
        Ok(deleted > 0)
    }

    /// Delete every entry of the owner, returning how many went
    pub fn delete_all(&self) -> Result<i64> {
        let deleted = self
            .conn
            .execute("DELETE FROM entries WHERE owner_id = ?", params![self.owner])?;
        Ok(deleted as i64)
    }

    /// Entry counts per day within `from..=to`
    pub fn counts_by_day(&self, from: NaiveDate, to: NaiveDate) -> Result<BTreeMap<NaiveDate, i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT entry_date::VARCHAR, COUNT(*)
             FROM entries
             WHERE owner_id = ? AND entry_date >= CAST(? AS DATE) AND entry_date <= CAST(? AS DATE)
             GROUP BY entry_date
             ORDER BY entry_date",
        )?;

        let rows = stmt.query_map(
            params![self.owner, from.to_string(), to.to_string()],
            |row| {
                let day: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((parse_date(&day, 0)?, count))
            },
        )?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (day, count) = row?;
            counts.insert(day, count);
        }
        Ok(counts)
    }

    /// Earliest and latest entry dates
    pub fn date_range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        let (min, max): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(entry_date)::VARCHAR, MAX(entry_date)::VARCHAR
             FROM entries WHERE owner_id = ?",
            params![self.owner],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let earliest = min.map(|s| parse_date(&s, 0)).transpose()?;
        let latest = max.map(|s| parse_date(&s, 1)).transpose()?;
        Ok((earliest, latest))
    }

    /// WHERE clause and parameters for `query`, owner first
    fn filter(&self, query: &EntryQuery) -> (String, Vec<Box<dyn ToSql>>) {
        let mut clauses = vec!["owner_id = ?".to_string()];
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(self.owner.to_string())];

        if let Some(from) = query.from() {
            clauses.push("entry_date >= CAST(? AS DATE)".to_string());
            params.push(Box::new(from.to_string()));
        }
        if let Some(to) = query.to() {
            clauses.push("entry_date <= CAST(? AS DATE)".to_string());
            params.push(Box::new(to.to_string()));
        }
        if let Some(text) = query.text() {
            clauses.push(
                "(contains(lower(title), lower(?)) OR contains(lower(body), lower(?)))"
                    .to_string(),
            );
            params.push(Box::new(text.to_string()));
            params.push(Box::new(text.to_string()));
        }

        (clauses.join(" AND "), params)
    }

    fn fetch(&self, sql: &str, params: &[Box<dyn ToSql>]) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let refs = param_refs(params);
        let rows = stmt.query_map(refs.as_slice(), row_to_entry)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }
}

fn order_by(query: &EntryQuery) -> &'static str {
    if query.newest_first() {
        "ORDER BY entry_date DESC, updated_at DESC, id DESC"
    } else {
        "ORDER BY entry_date ASC, updated_at ASC, id ASC"
    }
}

fn param_refs(params: &[Box<dyn ToSql>]) -> Vec<&dyn ToSql> {
    params.iter().map(|b| b.as_ref()).collect()
}

fn row_to_entry(row: &Row<'_>) -> duckdb::Result<Entry> {
    // Column order follows ENTRY_COLUMNS
    let date: String = row.get(3)?;
    let created: String = row.get(5)?;
    let updated: String = row.get(6)?;

    Ok(Entry {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        date: parse_date(&date, 3)?,
        body: row.get(4)?,
        created_at: parse_timestamp(&created, 5)?,
        updated_at: parse_timestamp(&updated, 6)?,
    })
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> duckdb::Error {
    duckdb::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn parse_date(s: &str, column: usize) -> duckdb::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| conversion_error(column, e))
}

/// Parse DuckDB's TIMESTAMP text form ("2024-01-01 10:00:00[.123456]") as UTC
fn parse_timestamp(s: &str, column: usize) -> duckdb::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|dt| dt.and_utc())
        .map_err(|e| conversion_error(column, e))
}

/// Naive UTC text DuckDB casts losslessly to TIMESTAMP
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timestamp_now;
    use tempfile::TempDir;

    fn open(temp: &TempDir) -> DuckDbRepository {
        let repo = DuckDbRepository::new(&temp.path().join("test.duckdb")).unwrap();
        repo.ensure_schema().unwrap();
        repo
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_timestamp_text_round_trip() {
        let now = timestamp_now();
        let text = format_timestamp(&now);
        assert_eq!(parse_timestamp(&text, 0).unwrap(), now);
        // DuckDB drops the fraction when it is zero
        assert!(parse_timestamp("2024-01-01 10:00:00", 0).is_ok());
    }

    #[test]
    fn test_insert_and_get_preserves_fields() {
        let temp = TempDir::new().unwrap();
        let repo = open(&temp);

        let new = NewEntry::new("Title", day(2024, 1, 2), "Body").unwrap();
        let stored = repo.scoped("alice", |e| e.insert(&new)).unwrap();
        let fetched = repo.scoped("alice", |e| e.get(stored.id)).unwrap().unwrap();

        assert_eq!(fetched, stored);
    }

    #[test]
    fn test_other_owner_cannot_see_or_touch_rows() {
        let temp = TempDir::new().unwrap();
        let repo = open(&temp);

        let new = NewEntry::new("Private", day(2024, 1, 2), "secret").unwrap();
        let stored = repo.scoped("alice", |e| e.insert(&new)).unwrap();

        repo.scoped("mallory", |e| {
            assert!(e.get(stored.id)?.is_none());
            assert!(!e.delete(stored.id)?);
            assert!(!e.update(&stored)?);
            assert_eq!(e.delete_all()?, 0);
            assert_eq!(e.count(&EntryQuery::new())?, 0);
            Ok(())
        })
        .unwrap();

        assert!(repo.scoped("alice", |e| e.get(stored.id)).unwrap().is_some());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let temp = TempDir::new().unwrap();
        let repo = open(&temp);

        let new = NewEntry::new("Doomed", day(2024, 1, 2), "").unwrap();
        let result: Result<()> = repo.transaction("alice", |e| {
            e.insert(&new)?;
            Err(Error::Other("boom".to_string()))
        });
        assert!(result.is_err());

        let count = repo.scoped("alice", |e| e.count(&EntryQuery::new())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_update_changes_indexed_date_inside_transaction() {
        let temp = TempDir::new().unwrap();
        let repo = open(&temp);

        let new = NewEntry::new("Moved", day(2024, 1, 2), "").unwrap();
        let stored = repo.scoped("alice", |e| e.insert(&new)).unwrap();

        repo.transaction("alice", |e| {
            let mut entry = stored.clone();
            entry.date = day(2024, 2, 3);
            assert!(e.update(&entry)?);
            entry.title = "Moved twice".to_string();
            assert!(e.update(&entry)?);
            Ok(())
        })
        .unwrap();

        let fetched = repo.scoped("alice", |e| e.get(stored.id)).unwrap().unwrap();
        assert_eq!(fetched.date, day(2024, 2, 3));
        assert_eq!(fetched.title, "Moved twice");
    }

    #[test]
    fn test_ids_are_unique_across_owners() {
        let temp = TempDir::new().unwrap();
        let repo = open(&temp);

        let new = NewEntry::new("Same", day(2024, 1, 2), "").unwrap();
        let a = repo.scoped("alice", |e| e.insert(&new)).unwrap();
        let b = repo.scoped("bob", |e| e.insert(&new)).unwrap();
        assert_ne!(a.id, b.id);
    }
}
