//! Backup service - export, restore and backup archives
//!
//! Exports are JSON documents (`BackupPayload`). Archives wrap one export
//! as `entries.json` in a ZIP under `backups/<owner>/`, so each user only
//! sees and restores their own archives.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::adapters::duckdb::{DuckDbRepository, OwnedEntries};
use crate::domain::result::{Error, Result};
use crate::domain::{
    timestamp_now, BackupMetadata, BackupPayload, EntryQuery, NewEntry, RestoreMode,
    RestoreReport,
};
use crate::ports::CurrentUser;

/// Name of the export inside every archive
const ARCHIVE_ENTRY: &str = "entries.json";

const ARCHIVE_PREFIX: &str = "quill-";

pub struct BackupService {
    repository: Arc<DuckDbRepository>,
    user: Arc<dyn CurrentUser>,
    journal_dir: PathBuf,
}

impl BackupService {
    pub fn new(
        repository: Arc<DuckDbRepository>,
        user: Arc<dyn CurrentUser>,
        journal_dir: PathBuf,
    ) -> Self {
        Self {
            repository,
            user,
            journal_dir,
        }
    }

    async fn owner(&self) -> Result<String> {
        self.user.user_id().await.ok_or(Error::Unauthenticated)
    }

    fn backups_dir(&self, owner: &str) -> PathBuf {
        self.journal_dir.join("backups").join(owner_dir_name(owner))
    }

    /// Export all of the current user's entries, oldest first
    pub async fn export(&self) -> Result<BackupPayload> {
        let owner = self.owner().await?;
        let query = EntryQuery::new().oldest_first();
        let entries = self.repository.scoped(&owner, |entries| entries.list(&query))?;
        Ok(BackupPayload::from_entries(&entries, timestamp_now()))
    }

    /// Merge or replace the current user's entries from an export document.
    ///
    /// The payload shape is checked before anything is touched. The restore
    /// runs in one transaction: records with bad fields are reported in
    /// `errors` and skipped, while a store failure rolls back everything.
    pub async fn restore(&self, payload: &Value, mode: RestoreMode) -> Result<RestoreReport> {
        let payload = BackupPayload::from_value(payload)?;
        let owner = self.owner().await?;

        let report = self
            .repository
            .transaction(&owner, |entries| reconcile(entries, &payload, mode))?;

        log::info!(
            "Restore ({}): {} added, {} updated, {} skipped, {} deleted, {} errors",
            mode,
            report.added,
            report.updated,
            report.skipped,
            report.deleted,
            report.errors.len()
        );
        Ok(report)
    }

    /// Write the current export as a new archive, then keep only the newest
    /// `max_backups` archives
    pub async fn create(&self, max_backups: Option<usize>) -> Result<BackupMetadata> {
        let owner = self.owner().await?;
        let payload = self.export().await?;

        let backups_dir = self.backups_dir(&owner);
        fs::create_dir_all(&backups_dir)?;

        let now = Utc::now();
        let name = format!(
            "{}{}-{:06}.zip",
            ARCHIVE_PREFIX,
            now.format("%Y-%m-%dT%H-%M-%S"),
            now.timestamp_subsec_micros()
        );
        let path = backups_dir.join(&name);

        let file = File::create(&path)?;
        let mut zip = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        zip.start_file(ARCHIVE_ENTRY, options)?;
        zip.write_all(&serde_json::to_vec_pretty(&payload)?)?;
        zip.finish()?;

        let size_bytes = fs::metadata(&path)?.len();
        log::info!("Created backup {} ({} entries)", name, payload.entries.len());

        if let Some(max) = max_backups {
            self.apply_retention(&owner, max)?;
        }

        Ok(BackupMetadata::new(name, now, size_bytes))
    }

    /// The current user's archives, newest first
    pub async fn list(&self) -> Result<Vec<BackupMetadata>> {
        let owner = self.owner().await?;
        self.list_for(&owner)
    }

    fn list_for(&self, owner: &str) -> Result<Vec<BackupMetadata>> {
        let backups_dir = self.backups_dir(owner);
        if !backups_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for dir_entry in fs::read_dir(&backups_dir)? {
            let path = dir_entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(created_at) = parse_archive_time(name) else {
                continue;
            };
            let size_bytes = fs::metadata(&path)?.len();
            backups.push(BackupMetadata::new(name, created_at, size_bytes));
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// The export document stored in an archive
    pub async fn read(&self, name: &str) -> Result<Value> {
        let owner = self.owner().await?;
        let path = self.archive_path(&owner, name)?;

        let mut archive = ZipArchive::new(File::open(&path)?)?;
        let mut file = archive.by_name(ARCHIVE_ENTRY)?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Restore from one of the current user's archives
    pub async fn restore_archive(&self, name: &str, mode: RestoreMode) -> Result<RestoreReport> {
        let payload = self.read(name).await?;
        self.restore(&payload, mode).await
    }

    /// Write the current export as pretty JSON to `path`
    pub async fn export_to_file(&self, path: &Path) -> Result<usize> {
        let payload = self.export().await?;
        fs::write(path, serde_json::to_string_pretty(&payload)?)?;
        Ok(payload.entries.len())
    }

    /// Restore from a plain JSON export file
    pub async fn restore_file(&self, path: &Path, mode: RestoreMode) -> Result<RestoreReport> {
        let content = fs::read_to_string(path)?;
        let payload: Value = serde_json::from_str(&content)?;
        self.restore(&payload, mode).await
    }

    /// Delete all of the current user's archives
    pub async fn clear(&self) -> Result<ClearResult> {
        let owner = self.owner().await?;
        let backups = self.list_for(&owner)?;
        for backup in &backups {
            fs::remove_file(self.backups_dir(&owner).join(&backup.name))?;
        }
        Ok(ClearResult {
            deleted: backups.len() as i64,
        })
    }

    fn archive_path(&self, owner: &str, name: &str) -> Result<PathBuf> {
        // Names come from `list`; anything path-like is not one of ours
        if parse_archive_time(name).is_none() || name.contains('/') || name.contains('\\') {
            return Err(Error::not_found(format!("Backup not found: {}", name)));
        }
        let path = self.backups_dir(owner).join(name);
        if !path.exists() {
            return Err(Error::not_found(format!("Backup not found: {}", name)));
        }
        Ok(path)
    }

    fn apply_retention(&self, owner: &str, max_backups: usize) -> Result<()> {
        let mut backups = self.list_for(owner)?;
        while backups.len() > max_backups {
            if let Some(oldest) = backups.pop() {
                log::debug!("Removing old backup {}", oldest.name);
                fs::remove_file(self.backups_dir(owner).join(&oldest.name))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ClearResult {
    pub deleted: i64,
}

/// Apply a validated payload to one owner's entries.
///
/// Any `Err` returned here aborts the surrounding transaction; per-record
/// problems are collected in the report instead.
fn reconcile(
    entries: &OwnedEntries<'_>,
    payload: &BackupPayload,
    mode: RestoreMode,
) -> Result<RestoreReport> {
    let mut report = RestoreReport::default();

    if mode == RestoreMode::ReplaceAll {
        report.deleted = entries.delete_all()?;
    }

    for (index, record) in payload.entries.iter().enumerate() {
        let incoming = match record.parse() {
            Ok(incoming) => incoming,
            Err(e) => {
                report.errors.push(format!("entry {}: {}", index + 1, e));
                continue;
            }
        };

        let by_id = match incoming.id {
            Some(id) => entries.get(id)?,
            None => None,
        };
        let existing = match by_id {
            Some(entry) => Some(entry),
            None => entries.find_by_natural_key(incoming.date, &incoming.title)?,
        };

        match existing {
            None => {
                let now = timestamp_now();
                entries.insert(&NewEntry {
                    title: incoming.title,
                    date: incoming.date,
                    body: incoming.body,
                    created_at: incoming.created_at.unwrap_or(now),
                    updated_at: incoming.updated_at.unwrap_or(now),
                })?;
                report.added += 1;
            }
            Some(mut entry) if entry.differs_from(&incoming.title, incoming.date, &incoming.body) => {
                entry.title = incoming.title;
                entry.date = incoming.date;
                entry.body = incoming.body;
                entry.updated_at = timestamp_now();
                entries.update(&entry)?;
                report.updated += 1;
            }
            Some(_) => report.skipped += 1,
        }
    }

    Ok(report)
}

/// Creation time encoded in an archive name, `None` if it is not an archive
fn parse_archive_time(name: &str) -> Option<DateTime<Utc>> {
    let ts = name.strip_prefix(ARCHIVE_PREFIX)?.strip_suffix(".zip")?;
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H-%M-%S-%6f")
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H-%M-%S"))
        .ok()
        .map(|dt| dt.and_utc())
}

/// Filesystem-safe directory name for an owner id
fn owner_dir_name(owner: &str) -> String {
    let mut out = String::with_capacity(owner.len());
    for c in owner.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}
