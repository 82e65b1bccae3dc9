use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tera::escape_html;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Missing users, missing posts and posts hidden from the viewer all map here,
    /// so the variant carries no detail.
    #[error("not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    /// The author already has a post with this slug.
    #[error("slug already taken")]
    SlugTaken,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tera::Error> for DomainError {
    fn from(err: tera::Error) -> Self {
        DomainError::Internal(format!("template error: {err}"))
    }
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::NotFound => StatusCode::NOT_FOUND,
            DomainError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::Conflict(_) | DomainError::SlugTaken => StatusCode::CONFLICT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if let DomainError::Internal(message) = self {
            tracing::error!(error = %message, "request failed");
        }
        let reason = status.canonical_reason().unwrap_or("Error");
        let detail = match self {
            DomainError::Validation(message) | DomainError::Conflict(message) => {
                format!("<p>{}</p>", escape_html(message))
            }
            _ => String::new(),
        };
        let body = format!(
            "<!doctype html><html><head><title>{code} {reason}</title></head>\
             <body><h1>{code} {reason}</h1>{detail}</body></html>",
            code = status.as_u16(),
        );
        HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body)
    }
}
