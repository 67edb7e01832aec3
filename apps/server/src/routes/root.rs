use actix_web::HttpResponse;

use crate::error::AppError;

/// Placeholder for the service's first endpoint.
pub async fn not_implemented() -> Result<HttpResponse, AppError> {
    Err(AppError::NotImplemented)
}
