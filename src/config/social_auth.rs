use serde::Serialize;

use super::env::{keys, RawConfig};

pub const GITHUB_SCOPE: [&str; 2] = ["read:user", "user:email"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Github,
    Gitlab,
    MicrosoftGraph,
    GoogleOauth2,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Github,
        ProviderKind::Gitlab,
        ProviderKind::MicrosoftGraph,
        ProviderKind::GoogleOauth2,
    ];

    /// Backend name used in login URLs.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Github => "github",
            ProviderKind::Gitlab => "gitlab",
            ProviderKind::MicrosoftGraph => "microsoft-graph",
            ProviderKind::GoogleOauth2 => "google-oauth2",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Github => "GitHub",
            ProviderKind::Gitlab => "GitLab",
            ProviderKind::MicrosoftGraph => "Microsoft",
            ProviderKind::GoogleOauth2 => "Google",
        }
    }

    fn credential_keys(&self) -> (&'static str, &'static str) {
        match self {
            ProviderKind::Github => (keys::SOCIAL_AUTH_GITHUB_KEY, keys::SOCIAL_AUTH_GITHUB_SECRET),
            ProviderKind::Gitlab => (keys::SOCIAL_AUTH_GITLAB_KEY, keys::SOCIAL_AUTH_GITLAB_SECRET),
            ProviderKind::MicrosoftGraph => (
                keys::SOCIAL_AUTH_MICROSOFT_GRAPH_KEY,
                keys::SOCIAL_AUTH_MICROSOFT_GRAPH_SECRET,
            ),
            ProviderKind::GoogleOauth2 => (
                keys::SOCIAL_AUTH_GOOGLE_OAUTH2_KEY,
                keys::SOCIAL_AUTH_GOOGLE_OAUTH2_SECRET,
            ),
        }
    }

    fn scope(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::Github => &GITHUB_SCOPE,
            _ => &[],
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct OAuthProvider {
    pub kind: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    /// Extra scopes requested on top of the provider defaults.
    pub scope: Vec<String>,
}

impl std::fmt::Debug for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthProvider")
            .field("kind", &self.kind)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Social login providers that have both a key and a secret configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialAuthSettings {
    pub providers: Vec<OAuthProvider>,
}

impl SocialAuthSettings {
    pub fn from_raw(raw: &RawConfig) -> Self {
        let providers = ProviderKind::ALL
            .iter()
            .filter_map(|kind| {
                let (key_var, secret_var) = kind.credential_keys();
                match (raw.get(key_var), raw.get(secret_var)) {
                    (Some(key), Some(secret)) => Some(OAuthProvider {
                        kind: *kind,
                        client_id: key.to_string(),
                        client_secret: secret.to_string(),
                        scope: kind.scope().iter().map(|s| s.to_string()).collect(),
                    }),
                    (Some(_), None) | (None, Some(_)) => {
                        tracing::warn!(
                            "Auth: {} login disabled, both {} and {} are required",
                            kind.display_name(),
                            key_var,
                            secret_var
                        );
                        None
                    }
                    (None, None) => None,
                }
            })
            .collect();

        Self { providers }
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&OAuthProvider> {
        self.providers.iter().find(|provider| provider.kind == kind)
    }
}
