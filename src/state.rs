use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::config::{DatabaseEngine, DatabaseSettings, Settings};

const DB_MAX_CONNECTIONS: u32 = 5;
const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: Option<PgPool>,
}

impl AppState {
    /// State without a database pool, regardless of `DATABASE_URL`.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            db: None,
        }
    }

    /// Opens the database pool lazily; no connection is made until first use.
    pub fn connect(settings: Settings) -> Self {
        let db = settings.database.as_ref().and_then(database_pool);
        Self {
            settings: Arc::new(settings),
            db,
        }
    }
}

fn database_pool(database: &DatabaseSettings) -> Option<PgPool> {
    if database.engine != DatabaseEngine::Postgres {
        tracing::warn!(
            "Database: {} is not supported, running without a database",
            database.engine.as_str()
        );
        return None;
    }

    let mut options = PgConnectOptions::new()
        .host(database.host.as_deref().unwrap_or("localhost"))
        .database(&database.name);
    if let Some(port) = database.port {
        options = options.port(port);
    }
    if let Some(user) = &database.user {
        options = options.username(user);
    }
    if let Some(password) = &database.password {
        options = options.password(password);
    }

    tracing::info!(
        "Database: using {}:{}/{}",
        database.host.as_deref().unwrap_or("localhost"),
        database.port.unwrap_or(5432),
        database.name
    );

    Some(
        PgPoolOptions::new()
            .max_connections(DB_MAX_CONNECTIONS)
            .acquire_timeout(DB_ACQUIRE_TIMEOUT)
            .max_lifetime(database.conn_max_age)
            .connect_lazy_with(options),
    )
}
