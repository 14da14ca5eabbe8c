//! Route table and handlers.
//!
//! Every page endpoint lives under `/{domain}/v1/page/{endpoint}/{title}`
//! with optional `/{revision}` and `/{revision}/{tid}` suffixes.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_TYPE, ETAG};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, get};
use axum::{Json, Router};
use sectio_core::{Mode, PageRequest, Pipeline, Versioned};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::error::ApiError;

/// Content type of every page response.
pub const MOBILE_SECTIONS_CONTENT_TYPE: &str =
    "application/json; charset=utf-8; profile=\"https://www.mediawiki.org/wiki/Specs/mobile-sections/0.12.4\"";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    domain: String,
    title: String,
    revision: Option<String>,
    tid: Option<String>,
}

impl PageParams {
    fn into_request(self) -> Result<PageRequest, ApiError> {
        let mut request = PageRequest::new(self.domain, self.title);
        if let Some(revision) = self.revision {
            let revision = revision
                .parse::<u64>()
                .map_err(|_| ApiError::bad_request(format!("Invalid revision: {revision}")))?;
            request = request.with_revision(revision);
        }
        if let Some(tid) = self.tid {
            request = request.with_tid(tid);
        }
        Ok(request)
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok".to_string() }))
}

fn page_response<T: Serialize>(versioned: Versioned<T>) -> Result<Response, ApiError> {
    let body = serde_json::to_vec(&versioned.body).map_err(|e| ApiError::internal(e.to_string()))?;
    let mut response = (StatusCode::OK, body).into_response();

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(MOBILE_SECTIONS_CONTENT_TYPE));
    if let Some(etag) = versioned.etag().and_then(|etag| HeaderValue::from_str(&etag).ok()) {
        headers.insert(ETAG, etag);
    }
    Ok(response)
}

#[tracing::instrument(skip(state))]
async fn mobile_sections(State(state): State<AppState>, Path(params): Path<PageParams>) -> Result<Response, ApiError> {
    let request = params.into_request()?;
    page_response(state.pipeline.mobile_sections(&request, Mode::Legacy).await?)
}

#[tracing::instrument(skip(state))]
async fn mobile_sections_lead(
    State(state): State<AppState>, Path(params): Path<PageParams>,
) -> Result<Response, ApiError> {
    let request = params.into_request()?;
    page_response(state.pipeline.lead(&request, Mode::Legacy).await?)
}

#[tracing::instrument(skip(state))]
async fn mobile_sections_remaining(
    State(state): State<AppState>, Path(params): Path<PageParams>,
) -> Result<Response, ApiError> {
    let request = params.into_request()?;
    page_response(state.pipeline.remaining(&request).await?)
}

#[tracing::instrument(skip(state))]
async fn mobile_sections_references(
    State(state): State<AppState>, Path(params): Path<PageParams>,
) -> Result<Response, ApiError> {
    let request = params.into_request()?;
    page_response(state.pipeline.references(&request).await?)
}

#[tracing::instrument(skip(state))]
async fn formatted(State(state): State<AppState>, Path(params): Path<PageParams>) -> Result<Response, ApiError> {
    let request = params.into_request()?;
    page_response(state.pipeline.mobile_sections(&request, Mode::Formatted).await?)
}

#[tracing::instrument(skip(state))]
async fn formatted_lead(State(state): State<AppState>, Path(params): Path<PageParams>) -> Result<Response, ApiError> {
    let request = params.into_request()?;
    page_response(state.pipeline.lead(&request, Mode::Formatted).await?)
}

/// Mounts one handler on the title, title/revision and title/revision/tid paths.
fn page_routes(router: Router<AppState>, endpoint: &str, handler: MethodRouter<AppState>) -> Router<AppState> {
    let base = format!("/{{domain}}/v1/page/{endpoint}/{{title}}");
    router
        .route(&base, handler.clone())
        .route(&format!("{base}/{{revision}}"), handler.clone())
        .route(&format!("{base}/{{revision}}/{{tid}}"), handler)
}

pub fn create_router(pipeline: Pipeline, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let mut router = Router::new().route("/_health", get(health_handler));
    router = page_routes(router, "mobile-sections", get(mobile_sections));
    router = page_routes(router, "mobile-sections-lead", get(mobile_sections_lead));
    router = page_routes(router, "mobile-sections-remaining", get(mobile_sections_remaining));
    router = page_routes(router, "mobile-sections-references", get(mobile_sections_references));
    router = page_routes(router, "formatted", get(formatted));
    router = page_routes(router, "formatted-lead", get(formatted_lead));

    router
        .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, request_timeout))
        .layer(CompressionLayer::new())
        .layer(trace_layer)
        .layer(cors)
        .with_state(AppState { pipeline })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(revision: Option<&str>, tid: Option<&str>) -> PageParams {
        PageParams {
            domain: "en.wikipedia.org".to_string(),
            title: "Foobar".to_string(),
            revision: revision.map(str::to_string),
            tid: tid.map(str::to_string),
        }
    }

    #[test]
    fn test_params_into_request() {
        let request = params(Some("123"), Some("abc")).into_request().unwrap();
        assert_eq!(request.revision, Some(123));
        assert_eq!(request.tid.as_deref(), Some("abc"));
        assert_eq!(request.title, "Foobar");
    }

    #[test]
    fn test_params_reject_bad_revision() {
        let err = params(Some("latest"), None).into_request().unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
