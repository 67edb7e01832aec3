use std::sync::Arc;
use std::time::Duration;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
use tracing::{error, info, warn};

use crate::middleware::StructuredLogger;
use crate::routes;
use crate::state::app_state::AppState;

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Time allowed for a client to send the request head.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
/// Idle keep-alive window between requests.
pub const KEEP_ALIVE: Duration = Duration::from_secs(60);
/// Time allowed to flush a response and close the connection.
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(60);
/// Graceful shutdown deadline, in seconds.
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 60;

/// Build the application with routes, middleware and shared state.
pub fn build_app(
    data: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(data)
        .wrap(StructuredLogger)
        .configure(routes::configure)
        .default_service(web::to(routes::not_found))
}

/// Serve until SIGINT or SIGTERM, then drain connections and close the pool.
pub async fn run(state: AppState, bind: &str) -> std::io::Result<()> {
    let data = web::Data::new(state);
    let app_data = data.clone();

    let server = HttpServer::new(move || build_app(app_data.clone()))
        .client_request_timeout(REQUEST_TIMEOUT)
        .keep_alive(KEEP_ALIVE)
        .client_disconnect_timeout(DISCONNECT_TIMEOUT)
        .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
        // SIGINT must drain too, so signals are handled below
        .disable_signals()
        .bind(bind)?
        .run();

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        shutdown_signal().await;
        info!(
            timeout_secs = SHUTDOWN_TIMEOUT_SECS,
            "shutdown requested, draining connections"
        );
        handle.stop(true).await;
    });

    info!(bind = %bind, "starting server");
    server.await?;
    info!("HTTP server stopped");

    close_state(data).await;
    Ok(())
}

/// Close the serving pool if no worker still holds the state.
pub async fn close_state(data: web::Data<AppState>) {
    match Arc::try_unwrap(data.into_inner()) {
        Ok(state) => state.close_db().await,
        // the pool closes when the last handle drops
        Err(_) => warn!("app state still shared after shutdown, skipping explicit pool close"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "signal received"),
        _ = terminate => info!(signal = "SIGTERM", "signal received"),
    }
}
