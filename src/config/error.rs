use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration failures. All of them are fatal: the server must not
/// start serving with a configuration it could not validate.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL ({value:?}): {source}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{var} has no host ({value:?})")]
    MissingHost { var: &'static str, value: String },

    #[error("{var} points to {path:?} which does not exist")]
    MissingFile { var: &'static str, path: PathBuf },

    #[error("{var} is not a valid integer ({value:?}): {source}")]
    InvalidInteger {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("unsupported database scheme '{0}'")]
    UnsupportedDatabase(String),

    #[error("{var} is not a valid socket address ({value:?})")]
    InvalidBindAddress { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_variable() {
        let err = ConfigError::MissingFile {
            var: "CONNECTION_GATEWAY_AUTH_CA",
            path: PathBuf::from("/nope/ca.pem"),
        };
        let message = err.to_string();
        assert!(message.contains("CONNECTION_GATEWAY_AUTH_CA"));
        assert!(message.contains("/nope/ca.pem"));
    }
}
