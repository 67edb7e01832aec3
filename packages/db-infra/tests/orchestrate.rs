use std::time::Duration;

use db_infra::{orchestrate_migration_internal, DbConfig, DbInfraError};
use migration::{MigrationError, MigrationOutcome, Migrator, Step, SCHEMA_VERSION, VERSION_TABLE};
use server_test_support::config_file::write_config;
use server_test_support::db::{sqlite_memory, version_rows};

#[tokio::test]
async fn migrates_then_reports_up_to_date() {
    let db = sqlite_memory().await;
    let migrator = Migrator::embedded();

    let first = orchestrate_migration_internal(&db, &migrator, Duration::from_secs(30))
        .await
        .unwrap();
    assert_eq!(
        first,
        MigrationOutcome::Migrated {
            from: 0,
            to: SCHEMA_VERSION
        }
    );

    let second = orchestrate_migration_internal(&db, &migrator, Duration::from_secs(30))
        .await
        .unwrap();
    assert_eq!(
        second,
        MigrationOutcome::UpToDate {
            version: SCHEMA_VERSION
        }
    );
    assert_eq!(
        version_rows(&db, VERSION_TABLE).await,
        vec![SCHEMA_VERSION as i32]
    );
}

#[tokio::test]
async fn step_failure_surfaces_as_migration_error() {
    let db = sqlite_memory().await;
    let migrator = Migrator::new(vec![Step::new(1, "CREATE TABLE broken (")]).unwrap();

    let err = orchestrate_migration_internal(&db, &migrator, Duration::from_secs(30))
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            DbInfraError::Migration(MigrationError::Step { step: 1, .. })
        ),
        "{err}"
    );
    assert_eq!(version_rows(&db, VERSION_TABLE).await, vec![0]);
}

#[test]
fn loads_config_from_file() {
    let file = write_config(
        r#"{"host": "localhost", "port": "5432", "user": "app", "name": "app_db"}"#,
    );

    let cfg = DbConfig::load(file.path()).unwrap();
    assert_eq!(cfg.host, "localhost");
    assert_eq!(cfg.password, None);
    assert_eq!(
        cfg.database_url(),
        "postgresql://app@localhost:5432/app_db?sslmode=disable"
    );
}

#[test]
fn malformed_file_is_a_config_error() {
    let file = write_config("{ not json");

    let err = DbConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, DbInfraError::Config { .. }), "{err}");
    assert!(err.to_string().contains("malformed config"), "{err}");
}
