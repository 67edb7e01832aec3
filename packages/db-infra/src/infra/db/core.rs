use std::future::Future;
use std::time::{Duration, Instant};

use migration::{MigrationOutcome, MigrationStatus, Migrator};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::{error, info, warn};

use crate::config::db::{DbConfig, PoolPurpose};
use crate::error::DbInfraError;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_INTERVAL_MS: u64 = 500;

pub(crate) async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, DbInfraError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbInfraError>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match connect_fn().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        "connection_retry=success attempts={} interval_ms={}",
                        attempt, interval_ms
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < max_attempts {
                    warn!(
                        "connection_retry=failed attempt={} max_attempts={} interval_ms={}",
                        attempt, max_attempts, interval_ms
                    );
                    tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        DbInfraError::connect("no connection attempt was made (max_attempts is 0)")
    }))
}

fn connect_options(config: &DbConfig, purpose: PoolPurpose) -> ConnectOptions {
    let mut opt = ConnectOptions::new(config.database_url());
    match purpose {
        PoolPurpose::Migration => {
            opt.min_connections(1)
                .max_connections(1)
                .acquire_timeout(Duration::from_secs(2));
        }
        PoolPurpose::App => {
            opt.max_connections(config.pool.max_connections)
                .max_lifetime(config.pool.max_lifetime);
        }
    }
    opt.sqlx_logging(false);
    opt
}

async fn connect(config: &DbConfig, purpose: PoolPurpose) -> Result<DatabaseConnection, DbInfraError> {
    let max_conns = match purpose {
        PoolPurpose::Migration => 1,
        PoolPurpose::App => config.pool.max_connections,
    };
    info!(
        pool = %purpose,
        url = %sanitize_db_url(&config.database_url()),
        "connecting to database: {}",
        config.redacted_connection_info(max_conns, config.pool.max_lifetime)
    );

    let opt = connect_options(config, purpose);
    retry_connection(
        || {
            let opt = opt.clone();
            async move {
                Database::connect(opt).await.map_err(|e| {
                    DbInfraError::connect(format!(
                        "failed to connect to Postgres ({purpose} pool): {e}"
                    ))
                })
            }
        },
        CONNECT_ATTEMPTS,
        CONNECT_INTERVAL_MS,
    )
    .await
}

/// Single-connection pool used only for migrations.
pub async fn build_admin_pool(config: &DbConfig) -> Result<DatabaseConnection, DbInfraError> {
    connect(config, PoolPurpose::Migration).await
}

/// Serving pool sized by the configured connection cap and lifetime.
pub async fn build_app_pool(config: &DbConfig) -> Result<DatabaseConnection, DbInfraError> {
    connect(config, PoolPurpose::App).await
}

/// Sanitize database URL by masking password in connection strings.
/// Used for logging.
pub fn sanitize_db_url(url: &str) -> String {
    let Some((auth_part, host_part)) = url.rsplit_once('@') else {
        return url.to_string();
    };
    let Some((scheme, userinfo)) = auth_part.split_once("://") else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _password)) => format!("{scheme}://{user}:***@{host_part}"),
        None => url.to_string(),
    }
}

/// Connect with the admin pool, migrate, and close the pool again.
pub async fn orchestrate_migration(config: &DbConfig) -> Result<MigrationOutcome, DbInfraError> {
    let admin_pool = build_admin_pool(config).await?;

    let result =
        orchestrate_migration_internal(&admin_pool, &Migrator::embedded(), config.migrate_timeout)
            .await;

    if let Err(e) = admin_pool.close().await {
        warn!(error = %e, "failed to close migration pool");
    }
    result
}

/// Run `migrator` against `pool`, bounded by `timeout` as a whole.
///
/// Expiry drops the in-flight migration; an open transaction is rolled
/// back by the driver when it is dropped.
pub async fn orchestrate_migration_internal(
    pool: &DatabaseConnection,
    migrator: &Migrator,
    timeout: Duration,
) -> Result<MigrationOutcome, DbInfraError> {
    let start = Instant::now();
    info!(
        target_version = migrator.target_version(),
        table = migrator.table(),
        backend = ?pool.get_database_backend(),
        timeout_ms = timeout.as_millis() as u64,
        "migrate=start"
    );

    let outcome = match tokio::time::timeout(timeout, migrator.migrate(pool)).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            error!(error = %e, elapsed_ms = start.elapsed().as_millis() as u64, "migrate=failed");
            return Err(e.into());
        }
        Err(_) => {
            error!(elapsed_ms = start.elapsed().as_millis() as u64, "migrate=timeout");
            return Err(DbInfraError::Timeout { after: timeout });
        }
    };

    info!(
        version = outcome.version(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "migrate=done"
    );
    Ok(outcome)
}

/// Current and target schema versions of the configured database.
pub async fn migration_status(config: &DbConfig) -> Result<MigrationStatus, DbInfraError> {
    let admin_pool = build_admin_pool(config).await?;
    let result = Migrator::embedded().status(&admin_pool).await;

    if let Err(e) = admin_pool.close().await {
        warn!(error = %e, "failed to close migration pool");
    }
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn sanitize_masks_password() {
        assert_eq!(
            sanitize_db_url("postgresql://svc:s3cret@db:5432/app?sslmode=disable"),
            "postgresql://svc:***@db:5432/app?sslmode=disable"
        );
        assert_eq!(
            sanitize_db_url("postgresql://svc@db:5432/app"),
            "postgresql://svc@db:5432/app"
        );
        assert_eq!(sanitize_db_url("sqlite::memory:"), "sqlite::memory:");
    }

    #[tokio::test]
    async fn retry_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = retry_connection(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(DbInfraError::connect(format!("attempt {n} refused")))
                    } else {
                        Ok(n)
                    }
                }
            },
            5,
            1,
        )
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_with_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_connection(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(DbInfraError::connect(format!("attempt {n} refused"))) }
            },
            3,
            1,
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("attempt 3 refused"), "{err}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn app_pool_options_follow_config() {
        let cfg = DbConfig::from_json(
            r#"{"host": "h", "user": "u", "name": "n", "max_connections": 7, "max_conn_lifetime": "90s"}"#,
        )
        .unwrap();

        let opt = connect_options(&cfg, PoolPurpose::App);
        assert_eq!(opt.get_max_connections(), Some(7));
        assert_eq!(opt.get_max_lifetime(), Some(Duration::from_secs(90)));

        let admin = connect_options(&cfg, PoolPurpose::Migration);
        assert_eq!(admin.get_max_connections(), Some(1));
    }
}
