//! Problem responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sectio_core::SectioError;
use serde::Serialize;

const ERROR_TYPE_BASE: &str = "https://mediawiki.org/wiki/HyperSwitch/errors/";

/// JSON problem body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub detail: String,
}

/// An error surfaced to HTTP clients.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    title: &'static str,
    detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, kind: "bad_request", title: "Bad request.", detail: detail.into() }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal_error",
            title: "Internal error.",
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<SectioError> for ApiError {
    fn from(err: SectioError) -> Self {
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        let (kind, title) = match status {
            StatusCode::NOT_FOUND => ("not_found", "Not found."),
            StatusCode::GATEWAY_TIMEOUT => ("timeout", "Upstream timed out."),
            _ if status.is_server_error() => ("upstream_error", "Upstream error."),
            _ => ("request_error", "Request failed."),
        };
        Self { status, kind, title, detail: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, detail = %self.detail, "request failed");
        } else {
            tracing::debug!(status = %self.status, detail = %self.detail, "request rejected");
        }

        let body = ErrorBody {
            kind: format!("{ERROR_TYPE_BASE}{}", self.kind),
            title: self.title.to_string(),
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}
