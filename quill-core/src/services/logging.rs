//! Logging service - structured event logging to DuckDB
//!
//! Events go to `logs.duckdb`, next to the journal database. Entry titles
//! and bodies are never logged: only event names, command names and error
//! messages.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use duckdb::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::log_migrations::LOG_MIGRATIONS;
use crate::services::MigrationService;

/// Disambiguates ids generated within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Millisecond timestamp in the upper bits, counter in the lower 16
fn generate_id() -> u64 {
    let millis = now_ms().max(0) as u64;
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    (millis << 16) | counter
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn detect_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// Which front end produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    /// Another program linking the core library
    Embedded,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Embedded => "embedded",
        }
    }
}

/// A log event to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            command: None,
            error_message: None,
            error_details: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// A log entry as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    /// Unix milliseconds
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub command: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

const LOG_COLUMNS: &str = "id, timestamp, entry_point, app_version, platform, \
                           event, command, error_message, error_details";

fn row_to_log_entry(row: &Row<'_>) -> duckdb::Result<LogEntry> {
    Ok(LogEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        entry_point: row.get(2)?,
        app_version: row.get(3)?,
        platform: row.get(4)?,
        event: row.get(5)?,
        command: row.get(6)?,
        error_message: row.get(7)?,
        error_details: row.get(8)?,
    })
}

/// Service for structured event logging
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl LoggingService {
    /// Open or create `logs.duckdb` in `journal_dir` and migrate it
    pub fn new(
        journal_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        let db_path = journal_dir.join("logs.duckdb");
        let conn = Connection::open(&db_path)?;
        MigrationService::with_migrations(&conn, LOG_MIGRATIONS).run_pending()?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            entry_point,
            app_version: app_version.into(),
            platform: detect_platform(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Record an event, stamped with entry point, version and platform
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO sys_logs (
                id, timestamp, entry_point, app_version, platform,
                event, command, error_message, error_details
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            duckdb::params![
                generate_id(),
                now_ms(),
                self.entry_point.as_str(),
                &self.app_version,
                self.platform,
                &event.event,
                &event.command,
                &event.error_message,
                &event.error_details,
            ],
        )?;

        Ok(())
    }

    pub fn log_event(&self, event: &str) -> Result<()> {
        self.log(LogEvent::new(event))
    }

    pub fn log_command(&self, command: &str) -> Result<()> {
        self.log(LogEvent::new("command_executed").with_command(command))
    }

    pub fn log_error(&self, event: &str, message: &str, details: Option<&str>) -> Result<()> {
        let mut log_event = LogEvent::new(event).with_error(message);
        if let Some(d) = details {
            log_event = log_event.with_error_details(d);
        }
        self.log(log_event)
    }

    /// Most recent entries first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.select("1 = 1", limit)
    }

    /// Most recent entries carrying an error message
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.select("error_message IS NOT NULL", limit)
    }

    fn select(&self, condition: &str, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM sys_logs WHERE {} ORDER BY timestamp DESC, id DESC LIMIT ?",
            LOG_COLUMNS, condition
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([limit as i64], row_to_log_entry)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete logs older than `timestamp_ms` (unix ms)
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM sys_logs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    /// Copy the log database to `output_path` for troubleshooting
    pub fn export(&self, output_path: &Path) -> Result<PathBuf> {
        let conn = self.lock()?;
        conn.execute_batch("CHECKPOINT")?;
        std::fs::copy(&self.db_path, output_path)?;
        Ok(output_path.to_path_buf())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_logging_service_creation() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
        assert!(service.db_path().exists());
    }

    #[test]
    fn test_reopen_keeps_events() {
        let dir = tempdir().unwrap();
        {
            let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
            service.log_event("first_run").unwrap();
        }
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
        assert_eq!(service.count().unwrap(), 1);
    }

    #[test]
    fn test_log_command() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Embedded, "2.0.0").unwrap();

        service.log_command("backup create").unwrap();

        let entries = service.get_recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, "command_executed");
        assert_eq!(entries[0].command.as_deref(), Some("backup create"));
        assert_eq!(entries[0].entry_point, "embedded");
        assert_eq!(entries[0].app_version, "2.0.0");
    }

    #[test]
    fn test_log_error() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        service.log_event("restore_started").unwrap();
        service
            .log_error("restore_failed", "Invalid backup payload", Some("missing entries"))
            .unwrap();

        let errors = service.get_errors(10).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].event, "restore_failed");
        assert_eq!(errors[0].error_details.as_deref(), Some("missing entries"));
    }

    #[test]
    fn test_count_and_delete() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        service.log_event("event1").unwrap();
        service.log_event("event2").unwrap();
        assert_eq!(service.count().unwrap(), 2);

        let deleted = service.delete_before(now_ms() + 1000).unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(service.count().unwrap(), 0);
    }

    #[test]
    fn test_export() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
        service.log_event("test_event").unwrap();

        let export_path = dir.path().join("export.duckdb");
        service.export(&export_path).unwrap();
        assert!(export_path.exists());
    }
}
