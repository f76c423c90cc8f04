pub mod cart;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum::extract::State;
use common::types::{ErrorBody, Health};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use crate::observability;
use crate::openapi::ApiDoc;
use crate::state::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// 200 when the cart store answers a ping, 503 otherwise.
#[utoipa::path(get, path = "/ready", tag = "health", responses((status = 200, description = "Store reachable"), (status = 503, description = "Store unreachable", body = crate::openapi::ErrorDoc)))]
pub async fn ready(State(state): State<ServerState>) -> Result<Json<Health>, (StatusCode, Json<ErrorBody>)> {
    match state.cart.ready().await {
        Ok(()) => Ok(Json(Health { status: "ok" })),
        Err(e) => Err((StatusCode::SERVICE_UNAVAILABLE, Json(ErrorBody::new(e.kind(), e.to_string())))),
    }
}

async fn metrics() -> (StatusCode, String) {
    observability::encode_metrics()
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: cart endpoints plus health, metrics and docs.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let cart_routes = Router::new()
        .route("/add-to-cart", post(cart::add_to_cart))
        .route("/add-to-cart/:user_id", post(cart::add_to_owner_cart))
        .route("/view-cart/:user_id", get(cart::view_cart));

    let ops_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        .route("/openapi.json", get(openapi_json));

    cart_routes
        .merge(ops_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // status code and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
