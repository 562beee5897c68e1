use std::time::Duration;

use url::Url;

use super::env::keys;
use super::error::ConfigError;

/// Connections older than this are closed and reopened.
pub const CONN_MAX_AGE: Duration = Duration::from_secs(600);

const SQLITE_IN_MEMORY: &str = "sqlite://:memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    Postgres,
    MySql,
    Sqlite,
}

impl DatabaseEngine {
    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "postgres" | "postgresql" | "pgsql" | "postgis" => Some(Self::Postgres),
            "mysql" | "mysql2" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgres => "postgres",
            DatabaseEngine::MySql => "mysql",
            DatabaseEngine::Sqlite => "sqlite",
        }
    }
}

/// Connection settings parsed out of `DATABASE_URL`.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub engine: DatabaseEngine,
    pub name: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub conn_max_age: Duration,
    url: String,
}

impl DatabaseSettings {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        // Not a valid URL authority, so handled before parsing.
        if value == SQLITE_IN_MEMORY {
            return Ok(Self {
                engine: DatabaseEngine::Sqlite,
                name: ":memory:".to_string(),
                user: None,
                password: None,
                host: None,
                port: None,
                conn_max_age: CONN_MAX_AGE,
                url: value.to_string(),
            });
        }

        let url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
            var: keys::DATABASE_URL,
            value: value.to_string(),
            source,
        })?;

        let engine = DatabaseEngine::from_scheme(url.scheme())
            .ok_or_else(|| ConfigError::UnsupportedDatabase(url.scheme().to_string()))?;

        // sqlite:///relative.db, sqlite:////abs/path.db
        let name = match engine {
            DatabaseEngine::Sqlite => url.path().strip_prefix('/').unwrap_or_default().to_string(),
            _ => decode(url.path().trim_start_matches('/')),
        };

        let user = Some(url.username())
            .filter(|user| !user.is_empty())
            .map(decode);
        let password = url.password().map(decode);
        let host = match engine {
            DatabaseEngine::Sqlite => None,
            _ => url.host_str().map(str::to_string),
        };

        Ok(Self {
            engine,
            name,
            user,
            password,
            host,
            port: url.port(),
            conn_max_age: CONN_MAX_AGE,
            url: value.to_string(),
        })
    }

    /// Full connection URL, credentials included.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("engine", &self.engine)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("conn_max_age", &self.conn_max_age)
            .finish()
    }
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}
