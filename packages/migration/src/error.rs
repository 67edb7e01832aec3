use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    /// The store was unreachable or rejected a bookkeeping statement.
    #[error("storage error: {0}")]
    Storage(#[source] DbErr),

    /// The version table exists but does not hold exactly one sane row.
    #[error("schema error: {0}")]
    Schema(String),

    #[error("migration step {step} failed: {source}")]
    Step {
        step: u32,
        #[source]
        source: DbErr,
    },

    #[error("failed to commit migration to version {version}: {source}")]
    Commit {
        version: u32,
        #[source]
        source: DbErr,
    },

    #[error("invalid migration steps: {0}")]
    InvalidSteps(String),

    #[error("invalid version table name: '{0}'")]
    InvalidTable(String),
}

impl MigrationError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Sequence number of the failing step, if a step failed.
    pub fn failed_step(&self) -> Option<u32> {
        match self {
            MigrationError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_step_and_cause() {
        let e = MigrationError::Step {
            step: 3,
            source: DbErr::Custom("no such table: widgets".into()),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("migration step 3 failed"));
        assert!(msg.contains("no such table: widgets"));
        assert_eq!(e.failed_step(), Some(3));
    }

    #[test]
    fn schema_error_message() {
        let e = MigrationError::schema("cannot find schema version");
        assert_eq!(e.to_string(), "schema error: cannot find schema version");
        assert_eq!(e.failed_step(), None);
    }
}
