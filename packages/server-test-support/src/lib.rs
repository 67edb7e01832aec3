//! Shared test support for the server workspace
//!
//! Logging initialization, throwaway SQLite databases, temporary config
//! files and problem-details assertions.

pub mod config_file;
pub mod db;
pub mod logging;
pub mod problem_details;
