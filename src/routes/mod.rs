pub mod health;
pub mod profiles;
pub mod share;
pub mod validation;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    routing::{get, post, put},
    Router,
};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::AppState;

pub use health::health_check;
pub use profiles::{create_profile, delete_my_profile, get_my_profile, update_my_measurements};
pub use share::{get_public_profile, unlock_profile, update_shared_measurements};
pub use validation::{edit_session_cookie, owner_from_headers, presented_credential};

/// Build the API router (without CORS or tracing layers)
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/profiles", post(create_profile))
        .route("/api/profiles/:token", get(get_public_profile))
        .route("/api/profiles/:token/unlock", post(unlock_profile))
        .route(
            "/api/profiles/:token/measurements",
            put(update_shared_measurements),
        )
        .route("/api/me", get(get_my_profile).delete(delete_my_profile))
        .route("/api/me/measurements", put(update_my_measurements))
        .with_state(state)
}

/// HTTP trace layer whose spans carry the route template, never the raw URI
pub type HttpTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, fn(&Request<Body>) -> Span>;

/// Request tracing for the API router
///
/// Paths embed share tokens, so spans record the matched route
/// (`/api/profiles/:token/unlock`) instead of the request URI.
pub fn trace_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http().make_span_with(make_span as fn(&Request<Body>) -> Span)
}

fn make_span(request: &Request<Body>) -> Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or("unmatched", MatchedPath::as_str);

    tracing::info_span!("request", method = %request.method(), route)
}
