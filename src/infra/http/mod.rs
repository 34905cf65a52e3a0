pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
pub use middleware::RequestContext;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::error::ErrorReport;
use crate::application::repos::{RepoError, StoreHealth};

pub const METRIC_HTTP_REQUEST_MS: &str = "popit_http_request_ms";

/// Full application router: content API, health probe and the shared middleware stack.
pub fn build_router(state: ApiState) -> Router {
    let health = Router::new()
        .route("/health", get(health_check))
        .route("/health/", get(health_check))
        .with_state(state.store.clone());

    build_api_router(state)
        .merge(health)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::cors))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

async fn health_check(State(store): State<Arc<dyn StoreHealth>>) -> Response {
    db_health_response(store.ping().await)
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
