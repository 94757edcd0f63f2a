//! Journal database migrations
//!
//! SQL files are embedded with `include_str!` as `(name, sql)` pairs and
//! applied in name order by `MigrationService`. New migrations get the next
//! `NNN_` prefix and an entry at the end of the list.

pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_entries.sql", include_str!("001_entries.sql")),
];
