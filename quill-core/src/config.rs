//! Configuration management
//!
//! Settings live in `settings.json` in the journal directory:
//! ```json
//! {
//!   "app": { "user": "alice", "pageSize": 20 },
//!   "backups": { "maxBackups": 10 }
//! }
//! ```
//! Keys this crate does not know about are kept when saving.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::DEFAULT_PAGE_SIZE;

/// Archives kept by `backup create` unless configured otherwise
pub const DEFAULT_MAX_BACKUPS: usize = 10;

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    backups: BackupSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_size: Option<i64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackupSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_backups: Option<usize>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Quill configuration (resolved view of settings and environment)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Identity entries are scoped to; `None` means signed out
    pub user: Option<String>,
    pub page_size: i64,
    pub max_backups: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            page_size: DEFAULT_PAGE_SIZE,
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }
}

impl Config {
    /// Load config from the journal directory.
    ///
    /// `QUILL_USER` and `QUILL_PAGE_SIZE` override the file. A missing or
    /// unreadable settings file yields defaults.
    pub fn load(journal_dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(journal_dir)?;

        if let Ok(user) = std::env::var("QUILL_USER") {
            config.user = clean_user(&user);
        }
        if let Ok(value) = std::env::var("QUILL_PAGE_SIZE") {
            match value.trim().parse::<i64>() {
                Ok(size) if size > 0 => config.page_size = size,
                _ => log::warn!("Ignoring QUILL_PAGE_SIZE={:?}: not a positive number", value),
            }
        }

        Ok(config)
    }

    /// Load settings.json alone, without environment overrides
    pub fn load_file(journal_dir: &Path) -> Result<Self> {
        let raw = read_settings(journal_dir)?;
        Ok(Self {
            user: raw.app.user.as_deref().and_then(clean_user),
            page_size: raw
                .app
                .page_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            max_backups: raw.backups.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS),
        })
    }

    /// Save config to the journal directory, preserving settings we don't manage
    pub fn save(&self, journal_dir: &Path) -> Result<()> {
        let mut settings = read_settings(journal_dir)?;

        settings.app.user = self.user.clone();
        settings.app.page_size = Some(self.page_size);
        settings.backups.max_backups = Some(self.max_backups);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(journal_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    /// Set a value by its CLI name (`user`, `page-size`, `max-backups`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "user" => self.user = clean_user(value),
            "page-size" => {
                self.page_size = value
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| Error::Config(format!("invalid page size '{}'", value)))?;
            }
            "max-backups" => {
                self.max_backups = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| Error::Config(format!("invalid max backups '{}'", value)))?;
            }
            other => return Err(Error::Config(format!("unknown setting '{}'", other))),
        }
        Ok(())
    }
}

fn clean_user(raw: &str) -> Option<String> {
    let user = raw.trim();
    (!user.is_empty()).then(|| user.to_string())
}

fn read_settings(journal_dir: &Path) -> Result<SettingsFile> {
    let settings_path = journal_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }

    let content = std::fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed {}: {}", settings_path.display(), e);
        SettingsFile::default()
    }))
}
