//! Route definitions for the gateway API.

use axum::{
    extract::Request,
    middleware,
    routing::{get, post},
    Router,
};
use uuid::Uuid;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{extractors::REQUEST_ID_HEADER, handlers, state::AppState};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        // Metrics endpoint
        .route("/metrics", get(handlers::metrics_endpoint))
        // Chat
        .route("/chat", post(handlers::chat))
        // Provider management
        .route("/provider-status", get(handlers::provider_status))
        .route(
            "/reset-providers",
            get(handlers::reset_providers).post(handlers::reset_providers),
        )
        .route(
            "/simulate-provider-failure",
            post(handlers::simulate_provider_failure),
        )
        .layer(
            ServiceBuilder::new()
                .layer(middleware::map_request(drop_invalid_request_id))
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Remove an `x-request-id` that is not a UUID so a fresh one is generated
/// and the id in the logs matches the one returned to the caller
async fn drop_invalid_request_id(mut request: Request) -> Request {
    let valid = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .map(|v| v.to_str().is_ok_and(|v| Uuid::parse_str(v.trim()).is_ok()));
    if valid == Some(false) {
        request.headers_mut().remove(REQUEST_ID_HEADER);
    }
    request
}
