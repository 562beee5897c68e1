//! Cross-origin trust policy.
//!
//! Everything the CORS and CSRF layers and the cookie builders need is derived
//! here once, at startup, from three optional URLs:
//!
//! * `FRONTEND_URL`: where the web frontend is served from,
//! * `CORS_EXTRA_URL`: overrides the frontend URL for CORS/CSRF purposes,
//! * `BACKEND_URL`: an extra CSRF-trusted origin for the API itself.

use url::Url;

use super::env::{keys, RawConfig};
use super::error::ConfigError;

/// First-party web client that is always allowed to make CORS requests.
pub const PLATFORM_ORIGIN: &str = "https://tabby.sh";

/// Request headers accepted on credentialed cross-origin requests.
pub const CORS_ALLOW_HEADERS: [&str; 9] = [
    "accept",
    "accept-encoding",
    "authorization",
    "content-type",
    "dnt",
    "origin",
    "user-agent",
    "x-xsrf-token",
    "x-requested-with",
];

const DEFAULT_LOGIN_REDIRECT_URL: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

/// A URL read from the environment, validated to carry a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredUrl {
    raw: String,
    url: Url,
}

impl ConfiguredUrl {
    pub fn parse(var: &'static str, value: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
            var,
            value: value.to_string(),
            source,
        })?;

        if url.host_str().is_none() {
            return Err(ConfigError::MissingHost {
                var,
                value: value.to_string(),
            });
        }

        Ok(Self {
            raw: value.to_string(),
            url,
        })
    }

    /// The value exactly as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn hostname(&self) -> &str {
        // Checked in `parse`.
        self.url.host_str().unwrap_or_default()
    }

    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// `scheme://host[:port]`, dropping the port when it is 80 or 443.
    pub fn origin(&self) -> String {
        let mut origin = format!("{}://{}", self.url.scheme(), self.hostname());
        if let Some(port) = self.url.port().filter(|port| !matches!(port, 80 | 443)) {
            origin.push_str(&format!(":{}", port));
        }
        origin
    }
}

/// Validated inputs of the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginSettings {
    pub frontend_url: Option<ConfiguredUrl>,
    pub cors_extra_url: Option<ConfiguredUrl>,
    pub backend_url: Option<ConfiguredUrl>,
    pub session_cookie_domain: Option<String>,
}

impl OriginSettings {
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        let parse_url = |var: &'static str| {
            raw.get(var)
                .map(|value| ConfiguredUrl::parse(var, value))
                .transpose()
        };

        Ok(Self {
            frontend_url: parse_url(keys::FRONTEND_URL)?,
            cors_extra_url: parse_url(keys::CORS_EXTRA_URL)?,
            backend_url: parse_url(keys::BACKEND_URL)?,
            session_cookie_domain: raw.get(keys::SESSION_COOKIE_DOMAIN).map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPolicy {
    pub allowed_cors_origins: Vec<String>,
    pub cors_allow_credentials: bool,
    pub csrf_trusted_origins: Vec<String>,
    /// Secure-only transmission for the session and CSRF cookies.
    pub cookie_secure: bool,
    /// `None` leaves the platform default (Lax) in place.
    pub cookie_same_site: Option<SameSitePolicy>,
    /// Session cookie domain.
    pub cookie_domain: Option<String>,
    pub csrf_cookie_domain: Option<String>,
    pub login_redirect_url: String,
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self {
            allowed_cors_origins: Vec::new(),
            cors_allow_credentials: false,
            csrf_trusted_origins: Vec::new(),
            cookie_secure: false,
            cookie_same_site: None,
            cookie_domain: None,
            csrf_cookie_domain: None,
            login_redirect_url: DEFAULT_LOGIN_REDIRECT_URL.to_string(),
        }
    }
}

impl OriginPolicy {
    pub fn resolve(settings: &OriginSettings) -> Self {
        let mut policy = Self::default();

        let cors_target = settings
            .cors_extra_url
            .as_ref()
            .or(settings.frontend_url.as_ref());

        if let Some(target) = cors_target {
            push_unique(&mut policy.allowed_cors_origins, target.origin());
            push_unique(&mut policy.allowed_cors_origins, PLATFORM_ORIGIN.to_string());
            policy.cors_allow_credentials = true;

            policy.csrf_trusted_origins.push(target.origin());
            if let Some(backend) = &settings.backend_url {
                push_unique(&mut policy.csrf_trusted_origins, backend.origin());
            }

            if target.is_secure() {
                policy.cookie_secure = true;
            }
        }

        if let Some(frontend) = &settings.frontend_url {
            let hostname = frontend.hostname().to_string();

            policy.login_redirect_url = frontend.as_str().to_string();
            policy.cookie_same_site = Some(SameSitePolicy::None);
            policy.cookie_domain = Some(
                settings
                    .session_cookie_domain
                    .clone()
                    .unwrap_or_else(|| hostname.clone()),
            );
            policy.csrf_cookie_domain = Some(hostname);

            if frontend.is_secure() {
                policy.cookie_secure = true;
            }
        }

        policy
    }

    /// Same-site policy to put on cookies, falling back to Lax.
    pub fn effective_same_site(&self) -> SameSitePolicy {
        self.cookie_same_site.unwrap_or(SameSitePolicy::Lax)
    }

    pub fn is_trusted_origin(&self, origin: &str) -> bool {
        self.csrf_trusted_origins.iter().any(|trusted| trusted == origin)
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
