use std::time::Duration;

use migration::MigrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbInfraError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Connection error: {message}")]
    Connect { message: String },

    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    #[error("Migration timed out after {after:?}")]
    Timeout { after: Duration },
}

impl DbInfraError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }
}
