use std::time::Duration;

use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, Request, Response, StatusCode, Uri, header},
    routing::get,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod admin;
pub mod blog;
pub mod categories;
pub mod contacts;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;
pub mod users;
pub mod versions;

const REQUEST_ID: &str = "x-request-id";
const NO_CACHE: &str = "no-cache, no-store, must-revalidate, max-age=0";
const MAX_BODY_BYTES: usize = 1024 * 1024;
const MAX_IN_FLIGHT: usize = 100;

// Build the application router without binding state; it will be provided at the top level.
pub fn create_app_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(products::router())
        .nest("/categories", categories::router())
        .nest("/contacts", contacts::router())
        .nest("/blog", blog::router())
        .nest("/versions", versions::router())
        .nest("/users", users::router())
        .nest("/admin", admin::router())
}

/// The served application: routes, API docs and the middleware stack.
pub fn build_app(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID);
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
            tracing::info!(
                status = %response.status(),
                ms = %latency.as_millis(),
                "request finished"
            );
        });

    create_app_router()
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE),
        ))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT))
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
