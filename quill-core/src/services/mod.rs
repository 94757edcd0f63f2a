//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod backup;
mod debounce;
mod journal;
pub mod logging;
pub mod migration;
mod status;

pub use backup::{BackupService, ClearResult};
pub use debounce::{SaveDebouncer, DEFAULT_SAVE_DELAY};
pub use journal::JournalService;
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use status::{DateRange, StatusService, StatusSummary};
