//! HomeCare Platform HTTP server
//!
//! Single deployable binary exposing the service catalog, patient intake,
//! visit scheduling, vital signs monitoring, notifications, and medication
//! tracking over a REST API.

pub mod cache;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use error::*;
pub use server::HomeCareServer;

use axum::{middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: HomeCareServer) -> Router {
    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer())
                .layer(from_fn(middleware::request_timing_middleware))
                .layer(from_fn(middleware::audit_logging_middleware)),
        )
        .with_state(server)
}
