//! Event log migrations, applied to `logs.duckdb`
//!
//! Same layout as the journal migrations: embedded `(name, sql)` pairs in
//! name order, with `000_migrations.sql` first.

pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
