#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod cli;
pub mod error;
pub mod infra;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

// Re-exports for public API
pub use error::AppError;
pub use infra::state::build_state;
pub use middleware::StructuredLogger;
pub use server::build_app;
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    server_test_support::logging::init();
}
