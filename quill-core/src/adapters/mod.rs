//! Adapter implementations
//!
//! Adapters implement the ports with concrete technologies:
//! - DuckDB for the owner-scoped entry store
//! - A fixed identity for the CurrentUser port

pub mod duckdb;
pub mod user;
