//! Migration service - manages database schema migrations
//!
//! Migrations are SQL files embedded at compile time. Each applied migration
//! is recorded in the database's `sys_migrations` table, so running the set
//! again is a no-op. The journal and the event log each carry their own set.

use duckdb::Connection;

use crate::domain::result::Result;
use crate::migrations::MIGRATIONS;

/// Name of the migration that creates `sys_migrations` itself
const BOOTSTRAP: &str = "000_migrations.sql";

/// Result of running migrations
#[derive(Debug)]
pub struct MigrationResult {
    /// Names of newly applied migrations
    pub applied: Vec<String>,
    /// Count of migrations that were already applied
    pub already_applied: usize,
}

/// Service for managing database migrations
pub struct MigrationService<'a> {
    conn: &'a Connection,
    migrations: &'static [(&'static str, &'static str)],
}

impl<'a> MigrationService<'a> {
    /// Migration service for the journal database
    pub fn new(conn: &'a Connection) -> Self {
        Self::with_migrations(conn, MIGRATIONS)
    }

    /// Migration service for an arbitrary embedded set.
    ///
    /// The set must start with a `000_migrations.sql` that creates
    /// `sys_migrations`.
    pub fn with_migrations(
        conn: &'a Connection,
        migrations: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { conn, migrations }
    }

    /// Run all pending migrations in name order.
    ///
    /// Bootstraps `sys_migrations` on a fresh database first.
    pub fn run_pending(&self) -> Result<MigrationResult> {
        let mut applied = Vec::new();

        let bootstrapped = if self.migrations_table_exists()? {
            false
        } else {
            match self.migrations.iter().find(|(name, _)| *name == BOOTSTRAP) {
                Some((name, sql)) => {
                    self.apply(name, sql)?;
                    applied.push(name.to_string());
                    true
                }
                None => false,
            }
        };

        let applied_before = self.get_applied()?;
        let already_applied = if bootstrapped {
            applied_before.len().saturating_sub(1)
        } else {
            applied_before.len()
        };

        for (name, sql) in self.migrations.iter().filter(|(n, _)| *n != BOOTSTRAP) {
            if !applied_before.iter().any(|a| a == name) {
                log::debug!("Applying migration {}", name);
                self.apply(name, sql)?;
                applied.push(name.to_string());
            }
        }

        Ok(MigrationResult {
            applied,
            already_applied,
        })
    }

    fn migrations_table_exists(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'sys_migrations'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Names of applied migrations, sorted
    pub fn get_applied(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT migration_name FROM sys_migrations ORDER BY migration_name")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        names
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Names of migrations not yet applied
    pub fn get_pending(&self) -> Result<Vec<String>> {
        let applied = self.get_applied()?;
        Ok(self
            .migrations
            .iter()
            .filter(|(name, _)| !applied.iter().any(|a| a == name))
            .map(|(name, _)| name.to_string())
            .collect())
    }

    fn apply(&self, name: &str, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        self.conn.execute(
            "INSERT INTO sys_migrations (migration_name) VALUES (?)",
            [name],
        )?;
        Ok(())
    }
}
