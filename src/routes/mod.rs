use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, with_security_headers, CsrfLayer, STATIC_URL};
use crate::handlers::{auth_providers, health_check, not_found};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let settings = state.settings.clone();
    let policy = Arc::new(settings.origin.clone());

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/1/auth/providers", get(auth_providers))
        .nest_service(
            STATIC_URL.trim_end_matches('/'),
            ServeDir::new(settings.static_dir()),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(CsrfLayer::new(policy));

    with_security_headers(router)
        .layer(create_cors_layer(&settings.origin))
        .layer(TraceLayer::new_for_http())
}
