use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub mod cookies;
pub mod cors;
pub mod csrf;
pub mod database;
pub mod env;
pub mod error;
pub mod gateway;
pub mod origin;
pub mod security;
pub mod social_auth;

pub use cors::create_cors_layer;
pub use csrf::CsrfLayer;
pub use database::{DatabaseEngine, DatabaseSettings};
pub use env::{keys, RawConfig};
pub use error::ConfigError;
pub use gateway::GatewayAuth;
pub use origin::{OriginPolicy, OriginSettings, SameSitePolicy};
pub use security::with_security_headers;
pub use social_auth::{OAuthProvider, ProviderKind, SocialAuthSettings};

const DEFAULT_SECRET_KEY: &str = "django-insecure";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";
const DEFAULT_NPM_REGISTRY: &str = "https://registry.npmjs.org";

pub const STATIC_URL: &str = "/static/";

/// Validates the gateway certificate paths and derives the origin policy.
pub fn resolve(raw: &RawConfig) -> Result<OriginPolicy, ConfigError> {
    GatewayAuth::from_raw(raw)?;
    let settings = OriginSettings::from_raw(raw)?;
    Ok(OriginPolicy::resolve(&settings))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SponsorshipSettings {
    pub eligible_sponsorships: Vec<String>,
    pub min_payment: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsSettings {
    pub id: String,
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub app_dist_storage: String,
    pub npm_registry: String,
    pub frontend_build_dir: PathBuf,
    pub static_root: PathBuf,
    /// Directories served under [`STATIC_URL`], in lookup order.
    pub static_dirs: Vec<PathBuf>,
}

impl StorageSettings {
    fn from_raw(raw: &RawConfig, base_dir: &Path) -> Self {
        let app_dist_storage = raw
            .get(keys::APP_DIST_STORAGE)
            .map(str::to_string)
            .unwrap_or_else(|| format!("file://{}", base_dir.join("app-dist").display()));

        let frontend_build_dir = raw
            .get(keys::FRONTEND_BUILD_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| base_dir.join("../frontend/build"));

        let static_dirs = if frontend_build_dir.exists() {
            vec![frontend_build_dir.clone()]
        } else {
            tracing::debug!(
                "Static: {} does not exist, not serving frontend build",
                frontend_build_dir.display()
            );
            Vec::new()
        };

        Self {
            app_dist_storage,
            npm_registry: raw
                .get_or(keys::NPM_REGISTRY, DEFAULT_NPM_REGISTRY)
                .trim_end_matches('/')
                .to_string(),
            frontend_build_dir,
            static_root: base_dir.join("public"),
            static_dirs,
        }
    }
}

/// Everything the server reads from the environment, validated once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub secret_key: String,
    pub debug: bool,
    pub bind_address: SocketAddr,
    pub database: Option<DatabaseSettings>,
    pub origin: OriginPolicy,
    pub social_auth: SocialAuthSettings,
    pub gateway_auth: GatewayAuth,
    pub sponsorship: SponsorshipSettings,
    pub analytics: Option<AnalyticsSettings>,
    pub storage: StorageSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load(&RawConfig::from_env(), &base_dir)
    }

    /// `base_dir` anchors the default storage and static paths.
    pub fn load(raw: &RawConfig, base_dir: &Path) -> Result<Self, ConfigError> {
        let bind_value = raw.get_or(keys::BIND_ADDRESS, DEFAULT_BIND_ADDRESS);
        let bind_address: SocketAddr = bind_value
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress {
                var: keys::BIND_ADDRESS,
                value: bind_value.to_string(),
            })?;

        let database = raw
            .get(keys::DATABASE_URL)
            .map(DatabaseSettings::parse)
            .transpose()?;

        let min_payment = raw
            .get(keys::GITHUB_SPONSORS_MIN_PAYMENT)
            .map(|value| {
                value
                    .trim()
                    .parse::<i64>()
                    .map_err(|source| ConfigError::InvalidInteger {
                        var: keys::GITHUB_SPONSORS_MIN_PAYMENT,
                        value: value.to_string(),
                        source,
                    })
            })
            .transpose()?;

        let gateway_auth = GatewayAuth::from_raw(raw)?;

        let eligible_sponsorships = raw
            .get(keys::GITHUB_ELIGIBLE_SPONSORSHIPS)
            .map(|value| value.split(',').map(str::to_string).collect())
            .unwrap_or_default();

        let origin = OriginPolicy::resolve(&OriginSettings::from_raw(raw)?);

        Ok(Self {
            secret_key: raw.get_or(keys::SECRET_KEY, DEFAULT_SECRET_KEY).to_string(),
            debug: raw.get(keys::DEBUG).is_some(),
            bind_address,
            database,
            origin,
            social_auth: SocialAuthSettings::from_raw(raw),
            gateway_auth,
            sponsorship: SponsorshipSettings {
                eligible_sponsorships,
                min_payment,
            },
            analytics: raw.get(keys::GA_ID).map(|id| AnalyticsSettings {
                id: id.to_string(),
                domain: raw.get(keys::GA_DOMAIN).map(str::to_string),
            }),
            storage: StorageSettings::from_raw(raw, base_dir),
        })
    }

    pub fn uses_default_secret_key(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }

    /// Directory backing [`STATIC_URL`].
    pub fn static_dir(&self) -> &Path {
        self.storage
            .static_dirs
            .first()
            .unwrap_or(&self.storage.static_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let raw: RawConfig = vars.iter().copied().collect();
        Settings::load(&raw, Path::new("/srv/tabby/backend"))
    }

    #[test]
    fn test_defaults() {
        let settings = load(&[]).expect("defaults load");

        assert!(settings.uses_default_secret_key());
        assert!(!settings.debug);
        assert_eq!(
            settings.bind_address,
            "0.0.0.0:8000".parse::<SocketAddr>().unwrap()
        );
        assert!(settings.database.is_none());
        assert_eq!(settings.origin, OriginPolicy::default());
        assert!(settings.social_auth.providers.is_empty());
        assert!(!settings.gateway_auth.is_configured());
        assert_eq!(settings.sponsorship, SponsorshipSettings::default());
        assert!(settings.analytics.is_none());
        assert_eq!(
            settings.storage.app_dist_storage,
            "file:///srv/tabby/backend/app-dist"
        );
        assert_eq!(settings.storage.npm_registry, "https://registry.npmjs.org");
        assert_eq!(
            settings.storage.frontend_build_dir,
            PathBuf::from("/srv/tabby/backend/../frontend/build")
        );
        assert_eq!(settings.static_dir(), Path::new("/srv/tabby/backend/public"));
    }

    #[test]
    fn test_debug_is_any_non_empty_value() {
        assert!(load(&[(keys::DEBUG, "0")]).unwrap().debug);
        assert!(!load(&[(keys::DEBUG, "")]).unwrap().debug);
    }

    #[test]
    fn test_npm_registry_trailing_slash_stripped() {
        let settings = load(&[(keys::NPM_REGISTRY, "https://npm.example.com/")]).unwrap();
        assert_eq!(settings.storage.npm_registry, "https://npm.example.com");
    }

    #[test]
    fn test_sponsorships() {
        let settings = load(&[
            (keys::GITHUB_ELIGIBLE_SPONSORSHIPS, "tier-a,tier-b"),
            (keys::GITHUB_SPONSORS_MIN_PAYMENT, "5"),
        ])
        .unwrap();

        assert_eq!(
            settings.sponsorship.eligible_sponsorships,
            vec!["tier-a", "tier-b"]
        );
        assert_eq!(settings.sponsorship.min_payment, Some(5));
    }

    #[test]
    fn test_negative_min_payment_is_accepted() {
        let settings = load(&[(keys::GITHUB_SPONSORS_MIN_PAYMENT, "-1")]).unwrap();
        assert_eq!(settings.sponsorship.min_payment, Some(-1));
    }

    #[test]
    fn test_invalid_min_payment() {
        let err = load(&[(keys::GITHUB_SPONSORS_MIN_PAYMENT, "five")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInteger { .. }));
    }

    #[test]
    fn test_invalid_bind_address() {
        let err = load(&[(keys::BIND_ADDRESS, "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddress { .. }));
    }

    #[test]
    fn test_analytics_requires_id() {
        assert!(load(&[(keys::GA_DOMAIN, "example.com")]).unwrap().analytics.is_none());

        let settings = load(&[(keys::GA_ID, "UA-1"), (keys::GA_DOMAIN, "example.com")]).unwrap();
        assert_eq!(
            settings.analytics,
            Some(AnalyticsSettings {
                id: "UA-1".to_string(),
                domain: Some("example.com".to_string()),
            })
        );
    }

    #[test]
    fn test_frontend_build_dir_served_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load(&[(keys::FRONTEND_BUILD_DIR, dir.path().to_str().unwrap())]).unwrap();

        assert_eq!(settings.storage.static_dirs, vec![dir.path().to_path_buf()]);
        assert_eq!(settings.static_dir(), dir.path());
    }

    #[test]
    fn test_missing_certificate_fails_regardless_of_other_settings() {
        let vars = [
            (keys::FRONTEND_URL, "https://app.example.com"),
            (keys::CONNECTION_GATEWAY_AUTH_CERTIFICATE, "/missing/cert.pem"),
        ];

        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::MissingFile { .. }
        ));

        let raw: RawConfig = vars.iter().copied().collect();
        assert!(matches!(
            resolve(&raw).unwrap_err(),
            ConfigError::MissingFile { .. }
        ));
    }

    #[test]
    fn test_resolve_with_existing_certificate() {
        let cert = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
        let raw: RawConfig = [
            (keys::FRONTEND_URL, "https://app.example.com"),
            (keys::CONNECTION_GATEWAY_AUTH_CERTIFICATE, cert),
        ]
        .into_iter()
        .collect();

        let policy = resolve(&raw).expect("certificate exists");
        assert_eq!(policy.csrf_trusted_origins, vec!["https://app.example.com"]);
    }

    #[test]
    fn test_invalid_database_url_fails() {
        let err = load(&[(keys::DATABASE_URL, "redis://cache/0")]).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedDatabase(_)));
    }
}
