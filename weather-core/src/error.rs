//! Boundary error types.
//!
//! These describe why a gateway or store call failed so the failure can be
//! logged precisely. The workflow controller never sees them: the gateway and
//! store contracts degrade every failure to an empty or absent result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to reach weather provider ({endpoint}): {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("weather provider {endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse weather provider {endpoint} JSON: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not determine platform data directory")]
    NoDataDir,

    #[error("failed to access location store {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse location store {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize location store: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("forecast days must be between 1 and 14, got {0}")]
    ForecastDaysOutOfRange(u8),
}
