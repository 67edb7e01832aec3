//! Throwaway SQLite databases for migration and bootstrap tests.
//!
//! SQLite runs DDL inside transactions, so rollback behavior observed here
//! matches what PostgreSQL does for the same statements.

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

/// Fresh in-memory SQLite database.
///
/// Pinned to a single pooled connection: every new `:memory:` connection
/// would otherwise see its own empty database.
pub async fn sqlite_memory() -> DatabaseConnection {
    crate::logging::init();

    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.min_connections(1)
        .max_connections(1)
        .sqlx_logging(false);

    Database::connect(opt)
        .await
        .expect("connect to in-memory sqlite")
}

/// Run raw SQL, panicking on failure.
pub async fn exec(db: &DatabaseConnection, sql: &str) {
    db.execute_unprepared(sql)
        .await
        .unwrap_or_else(|e| panic!("exec failed for `{sql}`: {e}"));
}

/// All values stored in the version table, in storage order.
pub async fn version_rows(db: &DatabaseConnection, table: &str) -> Vec<i32> {
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT version FROM {table}"),
        ))
        .await
        .expect("read version table");

    rows.iter()
        .map(|row| row.try_get::<i32>("", "version").expect("version column"))
        .collect()
}

pub async fn table_exists(db: &DatabaseConnection, name: &str) -> bool {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT COUNT(*) AS cnt FROM sqlite_master WHERE type = 'table' AND name = '{name}'"),
        ))
        .await
        .expect("query sqlite_master");

    match row {
        Some(row) => row.try_get::<i64>("", "cnt").unwrap_or(0) > 0,
        None => false,
    }
}

pub async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT COUNT(*) AS cnt FROM {table}"),
        ))
        .await
        .expect("count rows")
        .expect("count returns a row");
    row.try_get::<i64>("", "cnt").expect("cnt column")
}
