//! # Client Configuration
//!
//! Every option is required; nothing has a default. A missing or unusable
//! option is a [`ConfigError`] at client construction, never at call time.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `GEPG_PRIVATE_KEYSTORE_PATH` | `private_keystore.path` |
//! | `GEPG_PRIVATE_KEYSTORE_PASSWORD` | `private_keystore.password` |
//! | `GEPG_PRIVATE_KEY_ALIAS` | `private_keystore.alias` |
//! | `GEPG_PUBLIC_KEYSTORE_PATH` | `public_keystore.path` |
//! | `GEPG_PUBLIC_KEYSTORE_PASSWORD` | `public_keystore.password` |
//! | `GEPG_PUBLIC_KEY_ALIAS` | `public_keystore.alias` |
//! | `GEPG_KEYSTORE_TYPE` | `container_type` |
//! | `GEPG_SIGNATURE_ALGORITHM` | `signature_algorithm` |
//! | `GEPG_BASE_URL` | `base_url` |
//! | `GEPG_SERVICE_CODE` | `service_code` |

use crate::domain::entities::RequestCategory;
use crate::domain::errors::KeyStoreError;
use crate::domain::keys::{ContainerType, KeyMaterial, KeyStoreConfig};
use crate::domain::signature::SignatureAlgorithm;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PRIVATE_KEYSTORE_PATH: &str = "GEPG_PRIVATE_KEYSTORE_PATH";
pub const ENV_PRIVATE_KEYSTORE_PASSWORD: &str = "GEPG_PRIVATE_KEYSTORE_PASSWORD";
pub const ENV_PRIVATE_KEY_ALIAS: &str = "GEPG_PRIVATE_KEY_ALIAS";
pub const ENV_PUBLIC_KEYSTORE_PATH: &str = "GEPG_PUBLIC_KEYSTORE_PATH";
pub const ENV_PUBLIC_KEYSTORE_PASSWORD: &str = "GEPG_PUBLIC_KEYSTORE_PASSWORD";
pub const ENV_PUBLIC_KEY_ALIAS: &str = "GEPG_PUBLIC_KEY_ALIAS";
pub const ENV_KEYSTORE_TYPE: &str = "GEPG_KEYSTORE_TYPE";
pub const ENV_SIGNATURE_ALGORITHM: &str = "GEPG_SIGNATURE_ALGORITHM";
pub const ENV_BASE_URL: &str = "GEPG_BASE_URL";
pub const ENV_SERVICE_CODE: &str = "GEPG_SERVICE_CODE";

/// Configuration errors, fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required option is absent or empty
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// An option is present but cannot be used
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// Key material could not be loaded
    #[error("Key material unavailable: {0}")]
    KeyStore(#[from] KeyStoreError),
}

/// Everything a [`GepgClient`](crate::service::GepgClient) needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GepgConfig {
    /// Container holding this side's signing key
    pub private_keystore: KeyStoreConfig,
    /// Container holding the gateway's certificate
    pub public_keystore: KeyStoreConfig,
    pub container_type: ContainerType,
    pub signature_algorithm: SignatureAlgorithm,
    /// Gateway base URL, e.g. `https://uat.gepg.go.tz`
    pub base_url: String,
    /// Caller's service code, sent as `Gepg-Code`
    pub service_code: String,
}

impl GepgConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    ///
    /// Reports the first missing or unparseable variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let private_keystore = KeyStoreConfig::new(
            require(ENV_PRIVATE_KEYSTORE_PATH)?,
            require(ENV_PRIVATE_KEYSTORE_PASSWORD)?,
            require(ENV_PRIVATE_KEY_ALIAS)?,
        );
        let public_keystore = KeyStoreConfig::new(
            require(ENV_PUBLIC_KEYSTORE_PATH)?,
            require(ENV_PUBLIC_KEYSTORE_PASSWORD)?,
            require(ENV_PUBLIC_KEY_ALIAS)?,
        );

        let container_type = require(ENV_KEYSTORE_TYPE)?
            .parse::<ContainerType>()
            .map_err(|reason| ConfigError::Invalid {
                field: ENV_KEYSTORE_TYPE,
                reason,
            })?;
        let signature_algorithm = require(ENV_SIGNATURE_ALGORITHM)?
            .parse::<SignatureAlgorithm>()
            .map_err(|e| ConfigError::Invalid {
                field: ENV_SIGNATURE_ALGORITHM,
                reason: e.to_string(),
            })?;

        let config = Self {
            private_keystore,
            public_keystore,
            container_type,
            signature_algorithm,
            base_url: require(ENV_BASE_URL)?,
            service_code: require(ENV_SERVICE_CODE)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every option is present and usable, in declaration order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let keystores = [
            (
                &self.private_keystore,
                ENV_PRIVATE_KEYSTORE_PATH,
                ENV_PRIVATE_KEYSTORE_PASSWORD,
                ENV_PRIVATE_KEY_ALIAS,
            ),
            (
                &self.public_keystore,
                ENV_PUBLIC_KEYSTORE_PATH,
                ENV_PUBLIC_KEYSTORE_PASSWORD,
                ENV_PUBLIC_KEY_ALIAS,
            ),
        ];
        for (keystore, path, password, alias) in keystores {
            if keystore.path.as_os_str().is_empty() {
                return Err(ConfigError::Missing(path));
            }
            if keystore.password.is_empty() {
                return Err(ConfigError::Missing(password));
            }
            if keystore.alias.trim().is_empty() {
                return Err(ConfigError::Missing(alias));
            }
        }

        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_BASE_URL));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: ENV_BASE_URL,
                reason: format!("'{}' is not an http(s) URL", self.base_url),
            });
        }
        if self.service_code.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_SERVICE_CODE));
        }
        Ok(())
    }

    /// Load both keys named by this configuration.
    pub fn load_key_material(&self) -> Result<KeyMaterial, ConfigError> {
        Ok(KeyMaterial::load(
            &self.private_keystore,
            &self.public_keystore,
            self.container_type,
            self.signature_algorithm,
        )?)
    }

    /// Full URL of the endpoint serving `category`.
    pub fn endpoint(&self, category: RequestCategory) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), category.path())
    }
}
