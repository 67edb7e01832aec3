use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use db_infra::DbInfraError;
use serde::Serialize;
use thiserror::Error;

#[derive(Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not implemented")]
    NotImplemented,
    #[error("Not found: {detail}")]
    NotFound { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
    #[error("Database error: {detail}")]
    Db { detail: String },
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::NotImplemented => "NOT_IMPLEMENTED",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Config { .. } => "CONFIG_ERROR",
            AppError::Db { .. } => "DB_ERROR",
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::NotImplemented => "This endpoint is not implemented yet".to_string(),
            AppError::NotFound { detail } => detail.clone(),
            AppError::Config { detail } => detail.clone(),
            AppError::Db { detail } => detail.clone(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Db { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(detail: String) -> Self {
        Self::NotFound { detail }
    }

    pub fn config(detail: String) -> Self {
        Self::Config { detail }
    }

    pub fn db(detail: String) -> Self {
        Self::Db { detail }
    }

    fn humanize_code(code: &str) -> String {
        code.split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => {
                        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                    }
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<DbInfraError> for AppError {
    fn from(e: DbInfraError) -> Self {
        match e {
            DbInfraError::Config { message } => AppError::config(message),
            other => AppError::db(other.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let code = self.code();

        let problem_details = ProblemDetails {
            type_: format!("urn:problem-type:{code}"),
            title: Self::humanize_code(code),
            status: status.as_u16(),
            detail: self.detail(),
            code: code.to_string(),
        };

        HttpResponse::build(status)
            .content_type("application/problem+json")
            .json(problem_details)
    }
}

#[cfg(test)]
mod tests {
    use migration::MigrationError;

    use super::*;

    #[test]
    fn humanizes_codes() {
        assert_eq!(AppError::humanize_code("NOT_IMPLEMENTED"), "Not Implemented");
        assert_eq!(AppError::humanize_code("DB_ERROR"), "Db Error");
    }

    #[test]
    fn infra_errors_map_by_kind() {
        let e: AppError = DbInfraError::config("bad json").into();
        assert!(matches!(e, AppError::Config { .. }));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let e: AppError =
            DbInfraError::Migration(MigrationError::schema("cannot find schema version")).into();
        match e {
            AppError::Db { detail } => assert!(detail.contains("cannot find schema version")),
            other => panic!("expected Db, got {other:?}"),
        }
    }

    #[test]
    fn status_codes() {
        assert_eq!(AppError::NotImplemented.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            AppError::not_found("x".into()).status(),
            StatusCode::NOT_FOUND
        );
    }
}
