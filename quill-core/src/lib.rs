//! Quill Core - Business logic for a personal journal
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Entry, BackupPayload, etc.)
//! - **ports**: Trait definitions for external dependencies (CurrentUser)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, static user)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adapters::duckdb::DuckDbRepository;
use adapters::user::StaticUser;
use config::Config;
use ports::CurrentUser;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{BackupMetadata, BackupPayload, Entry, Page, RestoreMode, RestoreReport};

/// Journal database file inside the journal directory
pub const DB_FILENAME: &str = "quill.duckdb";

/// Main context for Quill operations
///
/// Holds the database, configuration and every service, all bound to the
/// same current user.
pub struct QuillContext {
    pub config: Config,
    pub journal_dir: PathBuf,
    pub repository: Arc<DuckDbRepository>,
    pub journal_service: JournalService,
    pub backup_service: BackupService,
    pub status_service: StatusService,
}

impl QuillContext {
    /// Open the journal in `journal_dir` as the configured user
    pub fn new(journal_dir: &Path) -> Result<Self> {
        let config = Config::load(journal_dir)?;
        let user = Arc::new(StaticUser::from_option(config.user.clone()));
        Self::with_user(journal_dir, config, user)
    }

    /// Open the journal with an explicit identity resolver
    pub fn with_user(
        journal_dir: &Path,
        config: Config,
        user: Arc<dyn CurrentUser>,
    ) -> Result<Self> {
        std::fs::create_dir_all(journal_dir)?;

        let repository = Arc::new(DuckDbRepository::new(&journal_dir.join(DB_FILENAME))?);
        repository.ensure_schema()?;

        let journal_service = JournalService::new(Arc::clone(&repository), Arc::clone(&user));
        let backup_service = BackupService::new(
            Arc::clone(&repository),
            Arc::clone(&user),
            journal_dir.to_path_buf(),
        );
        let status_service = StatusService::new(Arc::clone(&repository), user);

        Ok(Self {
            config,
            journal_dir: journal_dir.to_path_buf(),
            repository,
            journal_service,
            backup_service,
            status_service,
        })
    }
}
