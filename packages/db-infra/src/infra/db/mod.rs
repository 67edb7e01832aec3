pub mod core;

pub use self::core::{
    build_admin_pool, build_app_pool, migration_status, orchestrate_migration,
    orchestrate_migration_internal, sanitize_db_url,
};
