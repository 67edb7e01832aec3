use db_infra::{build_app_pool, orchestrate_migration, DbConfig};
use tracing::info;

use crate::error::AppError;
use crate::state::app_state::AppState;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    db_config: Option<DbConfig>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self { db_config: None }
    }

    pub fn with_db(mut self, config: DbConfig) -> Self {
        self.db_config = Some(config);
        self
    }

    /// Migrate (if configured) and open the serving pool.
    ///
    /// Migration runs on its own single-connection pool and must succeed
    /// before the serving pool is created.
    pub async fn build(self) -> Result<AppState, AppError> {
        let Some(config) = self.db_config else {
            return Ok(AppState::without_db());
        };

        let outcome = orchestrate_migration(&config).await?;
        info!(version = outcome.version(), "db migration success");

        let pool = build_app_pool(&config).await?;
        info!(
            max_connections = config.pool.max_connections,
            "connect to database success"
        );
        Ok(AppState::new(pool))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_succeeds_without_db_option() {
        let state = build_state().build().await.unwrap();
        assert!(state.db().is_none());
    }
}
