//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod backup;
mod entry;
pub mod page;
mod query;
pub mod result;

pub use backup::{
    BackupEntry, BackupMetadata, BackupPayload, BackupRecord, RestoreMode, RestoreReport,
    APP_TAG, BACKUP_VERSION,
};
pub use entry::{
    check_day, normalize_title, timestamp_now, CalendarDay, Entry, NewEntry, MAX_TITLE_LEN,
    YEAR_RANGE,
};
pub use page::{Page, PageRequest, DEFAULT_PAGE_SIZE};
pub use query::EntryQuery;
