use sea_orm::DatabaseConnection;
use tracing::{info, warn};

/// Application state containing shared resources
#[derive(Debug)]
pub struct AppState {
    /// Serving pool (absent in tests that never touch the database)
    pub db: Option<DatabaseConnection>,
}

impl AppState {
    /// Create a new AppState with the given serving pool
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db: Some(db) }
    }

    /// Create a new AppState without a database connection
    pub fn without_db() -> Self {
        Self { db: None }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }

    /// Close the serving pool once the HTTP server has stopped.
    pub async fn close_db(self) {
        if let Some(db) = self.db {
            match db.close().await {
                Ok(()) => info!("database pool closed"),
                Err(e) => warn!(error = %e, "failed to close database pool"),
            }
        }
    }
}
