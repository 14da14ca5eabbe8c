//! HTTP surface of the mobile-sections pipeline.

pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorBody};
pub use routes::{AppState, MOBILE_SECTIONS_CONTENT_TYPE, create_router};
pub use telemetry::init_tracing;
