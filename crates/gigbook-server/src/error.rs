//! Error pages and the error types handlers return.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use std::any::Any;
use thiserror::Error;

use crate::forms::FormError;

/// Errors that end a request with an error page.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Database(e) = &self {
            tracing::error!(error = %e, "unhandled server error");
        }
        error_page(self.status())
    }
}

/// Why a create or edit submission was not stored. Never shown to the user
/// verbatim; handlers turn it into a failure flash.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("invalid form: {0}")]
    Invalid(#[from] FormError),

    #[error("{0} {1} does not exist")]
    MissingReference(&'static str, i32),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, Serialize)]
pub struct ErrorPage {
    pub code: u16,
    pub error: &'static str,
}

pub fn error_page(status: StatusCode) -> Response {
    let page = ErrorPage {
        code: status.as_u16(),
        error: status.canonical_reason().unwrap_or("Error"),
    };
    (status, Json(page)).into_response()
}

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    error_page(StatusCode::NOT_FOUND)
}

pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(%detail, "handler panicked");
    error_page(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Path ids arrive as strings so a non-numeric id is a missing record, not a
/// rejected request.
pub fn parse_id(raw: &str, what: &'static str) -> Result<i32, AppError> {
    raw.trim().parse().map_err(|_| AppError::NotFound(what))
}
