//! API route definitions

use super::auth_handlers;
use super::calorie_handlers;
use super::handlers::{self, TrackerState};
use crate::auth::middleware::require_auth;
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request span with method and path only. The query string is left out
/// because the OAuth callback carries `code` and `state` there.
fn request_span(req: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
    )
}

/// Create the API router
pub fn create_router(state: TrackerState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .max_age(Duration::from_secs(12 * 60 * 60));

    // Routes that require a Bearer token
    let protected = Router::new()
        .route("/calories/add", post(calorie_handlers::add_entry))
        .route("/calories/view", get(calorie_handlers::list_entries))
        .route("/calories/update/{id}", put(calorie_handlers::update_entry))
        .route("/calories/delete/{id}", delete(calorie_handlers::delete_entry))
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login))
        .route("/auth/google/login", get(auth_handlers::google_login))
        .route("/auth/google/callback", get(auth_handlers::google_callback))
        .merge(protected)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(cors)
        .with_state(state)
}
