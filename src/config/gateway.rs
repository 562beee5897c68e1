use std::path::{Path, PathBuf};

use super::env::{keys, RawConfig};
use super::error::ConfigError;

/// mTLS material used to authenticate against the connection gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayAuth {
    pub ca: Option<PathBuf>,
    pub certificate: Option<PathBuf>,
    pub key: Option<PathBuf>,
}

impl GatewayAuth {
    /// Every configured path must exist on disk.
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            ca: existing_path(raw, keys::CONNECTION_GATEWAY_AUTH_CA)?,
            certificate: existing_path(raw, keys::CONNECTION_GATEWAY_AUTH_CERTIFICATE)?,
            key: existing_path(raw, keys::CONNECTION_GATEWAY_AUTH_KEY)?,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.ca.is_some() || self.certificate.is_some() || self.key.is_some()
    }
}

fn existing_path(raw: &RawConfig, var: &'static str) -> Result<Option<PathBuf>, ConfigError> {
    let Some(value) = raw.get(var) else {
        return Ok(None);
    };

    let path = Path::new(value);
    if !path.exists() {
        return Err(ConfigError::MissingFile {
            var,
            path: path.to_path_buf(),
        });
    }
    Ok(Some(path.to_path_buf()))
}
