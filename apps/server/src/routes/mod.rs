use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::AppError;

pub mod root;

/// Register the service's routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::route().to(root::not_implemented));
}

/// Fallback for every path without a route.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::not_found(format!("no route for {}", req.path())))
}
