use std::collections::BTreeMap;

/// Environment variable names read at startup.
pub mod keys {
    pub const FRONTEND_URL: &str = "FRONTEND_URL";
    pub const CORS_EXTRA_URL: &str = "CORS_EXTRA_URL";
    pub const BACKEND_URL: &str = "BACKEND_URL";
    pub const SESSION_COOKIE_DOMAIN: &str = "SESSION_COOKIE_DOMAIN";

    pub const SECRET_KEY: &str = "DJANGO_SECRET_KEY";
    pub const DEBUG: &str = "DEBUG";
    pub const BIND_ADDRESS: &str = "BIND_ADDRESS";
    pub const DATABASE_URL: &str = "DATABASE_URL";

    pub const SOCIAL_AUTH_GITHUB_KEY: &str = "SOCIAL_AUTH_GITHUB_KEY";
    pub const SOCIAL_AUTH_GITHUB_SECRET: &str = "SOCIAL_AUTH_GITHUB_SECRET";
    pub const SOCIAL_AUTH_GITLAB_KEY: &str = "SOCIAL_AUTH_GITLAB_KEY";
    pub const SOCIAL_AUTH_GITLAB_SECRET: &str = "SOCIAL_AUTH_GITLAB_SECRET";
    pub const SOCIAL_AUTH_GOOGLE_OAUTH2_KEY: &str = "SOCIAL_AUTH_GOOGLE_OAUTH2_KEY";
    pub const SOCIAL_AUTH_GOOGLE_OAUTH2_SECRET: &str = "SOCIAL_AUTH_GOOGLE_OAUTH2_SECRET";
    pub const SOCIAL_AUTH_MICROSOFT_GRAPH_KEY: &str = "SOCIAL_AUTH_MICROSOFT_GRAPH_KEY";
    pub const SOCIAL_AUTH_MICROSOFT_GRAPH_SECRET: &str = "SOCIAL_AUTH_MICROSOFT_GRAPH_SECRET";

    pub const CONNECTION_GATEWAY_AUTH_CA: &str = "CONNECTION_GATEWAY_AUTH_CA";
    pub const CONNECTION_GATEWAY_AUTH_CERTIFICATE: &str = "CONNECTION_GATEWAY_AUTH_CERTIFICATE";
    pub const CONNECTION_GATEWAY_AUTH_KEY: &str = "CONNECTION_GATEWAY_AUTH_KEY";

    pub const GITHUB_ELIGIBLE_SPONSORSHIPS: &str = "GITHUB_ELIGIBLE_SPONSORSHIPS";
    pub const GITHUB_SPONSORS_MIN_PAYMENT: &str = "GITHUB_SPONSORS_MIN_PAYMENT";
    pub const GA_ID: &str = "GA_ID";
    pub const GA_DOMAIN: &str = "GA_DOMAIN";

    pub const APP_DIST_STORAGE: &str = "APP_DIST_STORAGE";
    pub const NPM_REGISTRY: &str = "NPM_REGISTRY";
    pub const FRONTEND_BUILD_DIR: &str = "FRONTEND_BUILD_DIR";
}

/// Snapshot of the process environment taken once at startup.
///
/// Empty values are treated exactly like unset ones, so `FOO=` in a `.env`
/// file disables a feature instead of feeding an empty string into parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConfig {
    vars: BTreeMap<String, String>,
}

impl RawConfig {
    /// Loads `.env` (if present) and captures the current environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Config: loaded environment from {}", path.display());
        }
        std::env::vars().collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }
}

impl<K, V> FromIterator<(K, V)> for RawConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_value_is_absent() {
        let raw: RawConfig = [(keys::FRONTEND_URL, ""), (keys::BACKEND_URL, "http://api")]
            .into_iter()
            .collect();

        assert_eq!(raw.get(keys::FRONTEND_URL), None);
        assert_eq!(raw.get(keys::BACKEND_URL), Some("http://api"));
        assert_eq!(raw.get(keys::CORS_EXTRA_URL), None);
    }

    #[test]
    fn test_get_or_falls_back_on_empty() {
        let raw: RawConfig = [(keys::NPM_REGISTRY, "")].into_iter().collect();
        assert_eq!(
            raw.get_or(keys::NPM_REGISTRY, "https://registry.npmjs.org"),
            "https://registry.npmjs.org"
        );
    }
}
