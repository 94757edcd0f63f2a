//! Backup domain model
//!
//! A backup is a JSON document listing a user's entries. Incoming documents
//! come from outside (older exports, hand edits, other tools), so they are
//! validated in two layers: the payload shape is checked up front and
//! rejected as a whole, while each record's fields are checked one at a time
//! during restore so one bad record cannot sink the rest.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entry::{check_day, normalize_title, Entry};
use super::result::{Error, Result};

/// Tag written into every export
pub const APP_TAG: &str = "QuillJournal";

/// Current export format version
pub const BACKUP_VERSION: u32 = 1;

/// Metadata for a backup archive on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Archive filename (e.g., "quill-2025-01-15T10-30-00-000123.zip")
    pub name: String,
    /// When the archive was created
    pub created_at: DateTime<Utc>,
    /// File size in bytes
    pub size_bytes: u64,
}

impl BackupMetadata {
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            created_at,
            size_bytes,
        }
    }

    /// Format size for human display
    pub fn size_display(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;

        if self.size_bytes >= MB {
            format!("{:.1} MB", self.size_bytes as f64 / MB as f64)
        } else if self.size_bytes >= KB {
            format!("{:.1} KB", self.size_bytes as f64 / KB as f64)
        } else {
            format!("{} bytes", self.size_bytes)
        }
    }
}

/// A full export document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    pub app_tag: String,
    pub version: u32,
    pub exported_at: Option<DateTime<Utc>>,
    pub entries: Vec<BackupRecord>,
}

impl BackupPayload {
    /// Build an export document from stored entries
    pub fn from_entries(entries: &[Entry], exported_at: DateTime<Utc>) -> Self {
        Self {
            app_tag: APP_TAG.to_string(),
            version: BACKUP_VERSION,
            exported_at: Some(exported_at),
            entries: entries.iter().map(BackupRecord::from_entry).collect(),
        }
    }

    /// Validate an untyped document against the payload shape.
    ///
    /// Field names match case-insensitively. The top level must be an object
    /// with an `entries` array whose items are all objects; `appTag` (or
    /// `app`), `version` and `exportedAt` are optional but must have the
    /// right type when present. Anything else is rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| Error::invalid_payload("expected a JSON object"))?;

        let app_tag = match field(root, &["appTag", "app"]) {
            None => APP_TAG.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(Error::invalid_payload("appTag must be a string")),
        };

        let version = match field(root, &["version"]) {
            None => BACKUP_VERSION,
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| Error::invalid_payload("version must be a positive integer"))?,
        };

        let exported_at = match field(root, &["exportedAt", "exportedAtUtc"]) {
            None => None,
            Some(Value::String(s)) => Some(
                parse_timestamp(s)
                    .ok_or_else(|| Error::invalid_payload(format!("bad exportedAt: {}", s)))?,
            ),
            Some(_) => return Err(Error::invalid_payload("exportedAt must be a string")),
        };

        let items = match field(root, &["entries"]) {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(Error::invalid_payload("entries must be an array")),
            None => return Err(Error::invalid_payload("missing entries")),
        };

        let entries = items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(BackupRecord(map.clone())),
                _ => Err(Error::invalid_payload(format!(
                    "entry {} is not an object",
                    i + 1
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            app_tag,
            version,
            exported_at,
            entries,
        })
    }
}

/// One entry of a payload, fields not yet validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackupRecord(pub Map<String, Value>);

impl BackupRecord {
    pub fn from_entry(entry: &Entry) -> Self {
        let mut map = Map::new();
        map.insert("id".into(), Value::from(entry.id));
        map.insert("title".into(), Value::from(entry.title.clone()));
        map.insert("date".into(), Value::from(entry.date.to_string()));
        map.insert("body".into(), Value::from(entry.body.clone()));
        map.insert("createdAt".into(), Value::from(format_timestamp(&entry.created_at)));
        map.insert("updatedAt".into(), Value::from(format_timestamp(&entry.updated_at)));
        Self(map)
    }

    /// Validate the record's fields
    pub fn parse(&self) -> Result<BackupEntry> {
        let id = match field(&self.0, &["id"]) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(
                n.as_i64()
                    .ok_or_else(|| Error::validation(format!("id {} is not an integer", n)))?,
            ),
            Some(Value::String(s)) => Some(
                s.trim()
                    .parse::<i64>()
                    .map_err(|_| Error::validation(format!("id '{}' is not an integer", s)))?,
            ),
            Some(_) => return Err(Error::validation("id must be an integer")),
        };

        let title = match optional_string(&self.0, &["title"], "title")? {
            Some(raw) => normalize_title(raw)?,
            None => String::new(),
        };

        let body = optional_string(&self.0, &["body", "text"], "body")?
            .unwrap_or_default()
            .to_string();

        let date = match field(&self.0, &["date"]) {
            None | Some(Value::Null) => return Err(Error::validation("date is missing")),
            Some(Value::String(s)) => check_day(
                parse_day(s).ok_or_else(|| Error::validation(format!("invalid date '{}'", s)))?,
            )?,
            Some(_) => return Err(Error::validation("date must be a string")),
        };

        let created_at = optional_timestamp(&self.0, &["createdAt", "createdAtUtc"], "createdAt")?;
        let updated_at = optional_timestamp(&self.0, &["updatedAt", "updatedAtUtc"], "updatedAt")?;

        Ok(BackupEntry {
            id,
            title,
            date,
            body,
            created_at,
            updated_at,
        })
    }
}

/// A validated backup record, ready to reconcile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub id: Option<i64>,
    /// Trimmed; empty when the record had none
    pub title: String,
    pub date: NaiveDate,
    /// Kept as given; empty when the record had none
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// How a restore treats the entries already in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestoreMode {
    /// Keep existing entries; insert or update from the payload
    #[default]
    Merge,
    /// Delete all of the user's entries before applying the payload
    ReplaceAll,
}

impl FromStr for RestoreMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "merge" => Ok(RestoreMode::Merge),
            "replace-all" | "replaceall" | "replace" => Ok(RestoreMode::ReplaceAll),
            other => Err(Error::validation(format!("unknown restore mode '{}'", other))),
        }
    }
}

impl fmt::Display for RestoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreMode::Merge => write!(f, "merge"),
            RestoreMode::ReplaceAll => write!(f, "replace-all"),
        }
    }
}

/// Outcome of a restore
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub added: i64,
    pub updated: i64,
    pub skipped: i64,
    pub deleted: i64,
    /// One message per record that could not be applied
    pub errors: Vec<String>,
}

/// Look up a key case-insensitively, trying each alias in order
fn field<'a>(map: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

fn optional_string<'a>(
    map: &'a Map<String, Value>,
    names: &[&str],
    label: &str,
) -> Result<Option<&'a str>> {
    match field(map, names) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(Error::validation(format!("{} must be a string", label))),
    }
}

fn optional_timestamp(
    map: &Map<String, Value>,
    names: &[&str],
    label: &str,
) -> Result<Option<DateTime<Utc>>> {
    match optional_string(map, names, label)? {
        None => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| Error::validation(format!("invalid {} '{}'", label, s))),
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a calendar day from a date or date-time string.
///
/// Offsets are honoured as written: "2024-01-01T23:30:00-05:00" is the 1st.
fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

/// Parse an instant; values without an offset are taken as UTC
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let parsed = DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.and_utc())
        })?;
    Some(parsed.trunc_subsecs(6))
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
