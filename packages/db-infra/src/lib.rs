//! Shared database configuration and migration infrastructure.
//! Used by the server and the migration CLI.

pub mod config;
pub mod error;
pub mod infra;

pub use config::db;
pub use config::db::{format_duration, parse_duration, DbConfig, PoolSettings};
pub use error::DbInfraError;
pub use infra::db::core::{
    build_admin_pool, build_app_pool, migration_status, orchestrate_migration,
    orchestrate_migration_internal, sanitize_db_url,
};
