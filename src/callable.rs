//! Wire envelope for callable functions.
//!
//! Callers send `{"data": ...}` and get back either `{"result": ...}` or
//! `{"error": {"status", "message", "details"}}`.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Unauthenticated,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    pub fn http_status(self) -> StatusCode {
        match self {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A classified failure as seen by the caller of a callable function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", .kind.status())]
pub struct CallableError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl IntoResponse for CallableError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error: ErrorBody {
                status: self.kind.status(),
                message: &self.message,
                details: self.details.as_deref(),
            },
        };
        (self.kind.http_status(), Json(body)).into_response()
    }
}

/// Successful callable result, wrapped as `{"result": T}`.
pub struct Callable<T>(pub T);

#[derive(Serialize)]
struct ResultBody<T> {
    result: T,
}

impl<T: Serialize> IntoResponse for Callable<T> {
    fn into_response(self) -> Response {
        Json(ResultBody { result: self.0 }).into_response()
    }
}
