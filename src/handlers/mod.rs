use axum::{extract::State, http::Uri, response::IntoResponse, response::Response};
use serde::Serialize;

use crate::config::ProviderKind;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::Envelope;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    database: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = match &state.db {
        None => "disabled",
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "ok",
            Err(e) => {
                tracing::warn!(error = %e, "Health: database unavailable");
                "unavailable"
            }
        },
    };

    let payload = HealthPayload {
        status: "ok",
        service: "tabby-api",
        database,
    };

    Envelope::new(payload, "Health check successful").into_response()
}

#[derive(Serialize)]
struct ProviderPayload {
    name: ProviderKind,
    display_name: &'static str,
}

#[derive(Serialize)]
struct ProvidersPayload {
    providers: Vec<ProviderPayload>,
    login_redirect_url: String,
}

pub async fn auth_providers(State(state): State<AppState>) -> Response {
    let settings = &state.settings;
    let payload = ProvidersPayload {
        providers: settings
            .social_auth
            .providers
            .iter()
            .map(|provider| ProviderPayload {
                name: provider.kind,
                display_name: provider.kind.display_name(),
            })
            .collect(),
        login_redirect_url: settings.origin.login_redirect_url.clone(),
    };

    Envelope::new(payload, "Login providers").into_response()
}

pub async fn not_found(uri: Uri) -> Response {
    AppError::NotFound(format!("No route for '{}'", uri.path())).into_response()
}
