//! Versioned schema migrations.
//!
//! A single-row table records how many bundled steps have been applied;
//! [`Migrator::migrate`] applies whatever is missing in one transaction.

pub use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

mod error;
mod migrator;
mod step;

pub use error::MigrationError;
pub use migrator::{MigrationOutcome, MigrationStatus, Migrator, VERSION_TABLE};
pub use step::{embedded_steps, Step, SCHEMA_VERSION};

/// Run the bundled migrations against `db`.
pub async fn migrate(db: &DatabaseConnection) -> Result<MigrationOutcome, MigrationError> {
    Migrator::embedded().migrate(db).await
}
