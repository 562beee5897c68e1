use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use tabby_server::config::Settings;
use tabby_server::routes::create_routes;
use tabby_server::state::AppState;

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(settings.debug);

    if settings.uses_default_secret_key() && !settings.debug {
        tracing::warn!("DJANGO_SECRET_KEY is not set, using the insecure default");
    }
    if settings.gateway_auth.is_configured() {
        tracing::info!("Connection gateway mTLS material configured");
    }
    tracing::info!(
        "Origin policy: {} CORS origin(s), {} CSRF trusted origin(s), secure cookies: {}",
        settings.origin.allowed_cors_origins.len(),
        settings.origin.csrf_trusted_origins.len(),
        settings.origin.cookie_secure
    );

    let addr = settings.bind_address;
    let app = create_routes(AppState::connect(settings));

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Server running at http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server failed: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
