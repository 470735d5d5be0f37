//! Configuration loading and representation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use nftledger_core::Address;
use nftledger_observability::LogFormat;

pub const ADMIN_VAR: &str = "NFT_LEDGER_ADMIN";
pub const LOG_FORMAT_VAR: &str = "NFT_LEDGER_LOG_FORMAT";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Settings a ledger deployment needs before it can accept operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Fixed at construction; the only address allowed to mint.
    pub admin: Address,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl LedgerConfig {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            log_format: LogFormat::default(),
        }
    }

    /// Read `NFT_LEDGER_ADMIN` and `NFT_LEDGER_LOG_FORMAT` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let admin = lookup(ADMIN_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(ADMIN_VAR))?;
        let admin = admin.trim().parse::<Address>().map_err(|e| ConfigError::Invalid {
            key: ADMIN_VAR,
            message: e.reason(),
        })?;

        let log_format = match lookup(LOG_FORMAT_VAR) {
            Some(v) if !v.trim().is_empty() => v.parse().map_err(|e: nftledger_observability::LogFormatError| {
                ConfigError::Invalid {
                    key: LOG_FORMAT_VAR,
                    message: e.to_string(),
                }
            })?,
            _ => LogFormat::default(),
        };

        Ok(Self { admin, log_format })
    }

    /// Parse a JSON document such as `{"admin": "0x…", "logFormat": "pretty"}`.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(|e| ConfigError::Invalid {
            key: "config",
            message: e.to_string(),
        })
    }
}
