use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseTransaction, Statement, TransactionTrait,
};
use tracing::{debug, error, info, warn};

use crate::error::MigrationError;
use crate::step::{embedded_steps, validate_steps, Step};

/// Default name of the single-row version table.
pub const VERSION_TABLE: &str = "schema_version";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Nothing to do; no statements beyond the version read were executed.
    UpToDate { version: u32 },
    Migrated { from: u32, to: u32 },
}

impl MigrationOutcome {
    pub fn version(&self) -> u32 {
        match self {
            MigrationOutcome::UpToDate { version } => *version,
            MigrationOutcome::Migrated { to, .. } => *to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub current: u32,
    pub target: u32,
}

impl MigrationStatus {
    pub fn pending(&self) -> Vec<u32> {
        (self.current + 1..=self.target).collect()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.current == self.target
    }
}

/// Brings a store's schema version up to the target, one transaction per run.
///
/// The target version is the number of steps. Steps are applied in
/// sequence order inside a single transaction together with the version
/// bump, so a failed run leaves both schema and version untouched.
#[derive(Debug, Clone)]
pub struct Migrator {
    table: String,
    steps: Vec<Step>,
}

impl Migrator {
    /// Migrator over the steps bundled into the binary.
    pub fn embedded() -> Self {
        Self {
            table: VERSION_TABLE.to_string(),
            steps: embedded_steps(),
        }
    }

    pub fn new(steps: Vec<Step>) -> Result<Self, MigrationError> {
        validate_steps(&steps)?;
        Ok(Self {
            table: VERSION_TABLE.to_string(),
            steps,
        })
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Result<Self, MigrationError> {
        let table = table.into();
        if !is_valid_identifier(&table) {
            return Err(MigrationError::InvalidTable(table));
        }
        self.table = table;
        Ok(self)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn target_version(&self) -> u32 {
        self.steps.len() as u32
    }

    /// Create the version table and seed it with version 0 if needed.
    pub async fn ensure_version_table<C>(&self, db: &C) -> Result<(), MigrationError>
    where
        C: ConnectionTrait,
    {
        let table = &self.table;
        db.execute_unprepared(&format!(
            "CREATE TABLE IF NOT EXISTS {table}(version INT NOT NULL)"
        ))
        .await
        .map_err(MigrationError::Storage)?;
        db.execute_unprepared(&format!(
            "INSERT INTO {table}(version) SELECT 0 WHERE NOT EXISTS (SELECT * FROM {table})"
        ))
        .await
        .map_err(MigrationError::Storage)?;
        Ok(())
    }

    /// Read the persisted version. Exactly one non-negative row is required.
    pub async fn current_version<C>(&self, db: &C) -> Result<u32, MigrationError>
    where
        C: ConnectionTrait,
    {
        let stmt = Statement::from_string(
            db.get_database_backend(),
            format!("SELECT version FROM {}", self.table),
        );
        let rows = db.query_all(stmt).await.map_err(MigrationError::Storage)?;

        let row = match rows.as_slice() {
            [] => return Err(MigrationError::schema("cannot find schema version")),
            [row] => row,
            _ => {
                return Err(MigrationError::schema(format!(
                    "expected exactly one row in {}, found {}",
                    self.table,
                    rows.len()
                )))
            }
        };

        let version: i32 = row
            .try_get("", "version")
            .map_err(MigrationError::Storage)?;
        u32::try_from(version)
            .map_err(|_| MigrationError::schema(format!("invalid schema version {version}")))
    }

    /// Whether the version table has been created yet.
    pub async fn version_table_exists<C>(&self, db: &C) -> Result<bool, MigrationError>
    where
        C: ConnectionTrait,
    {
        let table = &self.table;
        let sql = match db.get_database_backend() {
            DatabaseBackend::Postgres => format!(
                "SELECT COUNT(*) AS cnt FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = '{table}'"
            ),
            DatabaseBackend::MySql => format!(
                "SELECT COUNT(*) AS cnt FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_name = '{table}'"
            ),
            DatabaseBackend::Sqlite => format!(
                "SELECT COUNT(*) AS cnt FROM sqlite_master WHERE type = 'table' AND name = '{table}'"
            ),
        };
        let row = db
            .query_one(Statement::from_string(db.get_database_backend(), sql))
            .await
            .map_err(MigrationError::Storage)?;

        match row {
            Some(row) => {
                let cnt: i64 = row.try_get("", "cnt").map_err(MigrationError::Storage)?;
                Ok(cnt > 0)
            }
            None => Ok(false),
        }
    }

    /// Current and target versions, without creating anything.
    ///
    /// A store that was never migrated reports version 0.
    pub async fn status<C>(&self, db: &C) -> Result<MigrationStatus, MigrationError>
    where
        C: ConnectionTrait,
    {
        let current = if self.version_table_exists(db).await? {
            self.current_version(db).await?
        } else {
            0
        };
        Ok(MigrationStatus {
            current,
            target: self.target_version(),
        })
    }

    pub async fn migrate<C>(&self, db: &C) -> Result<MigrationOutcome, MigrationError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        self.ensure_version_table(db).await?;

        let current = self.current_version(db).await?;
        let target = self.target_version();

        if current == target {
            info!(version = current, "migrate=skipped up_to_date=true");
            return Ok(MigrationOutcome::UpToDate { version: current });
        }
        if current > target {
            return Err(MigrationError::schema(format!(
                "database schema version {current} is ahead of target version {target}"
            )));
        }

        info!(from = current, to = target, table = %self.table, "migrate=start");

        let txn = db.begin().await.map_err(MigrationError::Storage)?;

        if let Err(e) = self.apply_pending(&txn, current, target).await {
            error!(from = current, to = target, error = %e, "migrate=failed rolling back");
            // Best-effort rollback; keep the step error
            if let Err(rollback_err) = txn.rollback().await {
                warn!(error = %rollback_err, "rollback after failed migration also failed");
            }
            return Err(e);
        }

        txn.commit().await.map_err(|source| MigrationError::Commit {
            version: target,
            source,
        })?;

        info!(from = current, to = target, "migrate=done");
        Ok(MigrationOutcome::Migrated {
            from: current,
            to: target,
        })
    }

    async fn apply_pending(
        &self,
        txn: &DatabaseTransaction,
        current: u32,
        target: u32,
    ) -> Result<(), MigrationError> {
        // steps[i] has seq i + 1, so everything past `current` is pending
        for step in &self.steps[current as usize..] {
            debug!(step = step.seq(), file = %step.file_name(), "migrate=step");
            txn.execute_unprepared(step.sql())
                .await
                .map_err(|source| MigrationError::Step {
                    step: step.seq(),
                    source,
                })?;
        }

        let res = txn
            .execute_unprepared(&format!("UPDATE {} SET version = {target}", self.table))
            .await
            .map_err(MigrationError::Storage)?;

        if res.rows_affected() != 1 {
            return Err(MigrationError::schema(format!(
                "version update touched {} rows in {}, expected 1",
                res.rows_affected(),
                self.table
            )));
        }
        Ok(())
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::embedded()
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::SCHEMA_VERSION;

    #[test]
    fn embedded_targets_schema_version() {
        let m = Migrator::embedded();
        assert_eq!(m.target_version(), SCHEMA_VERSION);
        assert_eq!(m.table(), VERSION_TABLE);
    }

    #[test]
    fn table_names_are_restricted() {
        assert!(Migrator::embedded().with_table("app_schema_v2").is_ok());
        assert!(Migrator::embedded().with_table("_private").is_ok());

        for bad in ["", "1table", "schema-version", "v; DROP TABLE x", "naïve"] {
            let err = Migrator::embedded().with_table(bad).unwrap_err();
            assert!(matches!(err, MigrationError::InvalidTable(_)), "{bad}");
        }
    }

    #[test]
    fn new_rejects_gapped_steps() {
        let err = Migrator::new(vec![Step::new(2, "SELECT 1")]).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidSteps(_)));
    }

    #[test]
    fn status_pending_lists_remaining_steps() {
        let status = MigrationStatus {
            current: 2,
            target: 5,
        };
        assert_eq!(status.pending(), vec![3, 4, 5]);
        assert!(!status.is_up_to_date());

        let done = MigrationStatus {
            current: 5,
            target: 5,
        };
        assert!(done.pending().is_empty());
        assert!(done.is_up_to_date());
    }

    #[test]
    fn outcome_reports_resulting_version() {
        assert_eq!(MigrationOutcome::UpToDate { version: 4 }.version(), 4);
        assert_eq!(MigrationOutcome::Migrated { from: 1, to: 3 }.version(), 3);
    }
}
