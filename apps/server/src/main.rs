use clap::Parser;
use db_infra::DbConfig;
use server::cli::Args;
use server::{build_state, server as http, telemetry};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();

    let db_config = match DbConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "cannot load config file");
            std::process::exit(1);
        }
    };
    info!(host = %db_config.host, port = db_config.port, "config loaded");

    // Migrates before the serving pool exists; nothing listens until this succeeds
    let app_state = match build_state().with_db(db_config).build().await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to prepare database");
            std::process::exit(1);
        }
    };

    http::run(app_state, &args.bind).await
}
