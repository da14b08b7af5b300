//! # Key Material Provider
//!
//! Loads the client's RSA signing key and the gateway's verification key out
//! of password-protected PKCS#12 containers, addressed by alias (the bag's
//! friendly name).
//!
//! ## Lookup rules
//!
//! - Aliases compare case-insensitively, matching how Java key stores store them
//! - A public-key lookup prefers a certificate carrying the alias; otherwise it
//!   follows the key entry's `localKeyId` to its certificate
//! - A wrong password is reported as an unreadable container (the MAC fails)

use super::errors::KeyStoreError;
use super::pkcs12::Pkcs12Store;
use super::signature::{self, SignatureAlgorithm};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;
use zeroize::Zeroize;

/// Fixed message used by [`check_key_pair`].
pub const KEY_PAIR_CHECK_MESSAGE: &str = "Test message for key pair validation";

/// Key-store container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContainerType {
    Pkcs12,
    /// Recognised so configuration can name it, but never decoded
    Jks,
}

impl ContainerType {
    pub fn name(&self) -> &'static str {
        match self {
            ContainerType::Pkcs12 => "PKCS12",
            ContainerType::Jks => "JKS",
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContainerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PKCS12" | "P12" | "PFX" => Ok(ContainerType::Pkcs12),
            "JKS" => Ok(ContainerType::Jks),
            other => Err(format!("unknown key store type '{other}'")),
        }
    }
}

impl TryFrom<String> for ContainerType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContainerType> for String {
    fn from(kind: ContainerType) -> Self {
        kind.name().to_string()
    }
}

/// Location of one key entry: container path, password and alias.
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyStoreConfig {
    pub path: PathBuf,
    pub password: String,
    pub alias: String,
}

impl KeyStoreConfig {
    pub fn new(path: impl Into<PathBuf>, password: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            password: password.into(),
            alias: alias.into(),
        }
    }
}

impl fmt::Debug for KeyStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStoreConfig")
            .field("path", &self.path)
            .field("password", &"<redacted>")
            .field("alias", &self.alias)
            .finish()
    }
}

impl Drop for KeyStoreConfig {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// Private and public key plus the algorithm they are used with.
///
/// Immutable after load; share it behind an `Arc` across concurrent exchanges.
#[derive(Clone)]
pub struct KeyMaterial {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    algorithm: SignatureAlgorithm,
}

impl KeyMaterial {
    pub fn new(
        private_key: RsaPrivateKey,
        public_key: RsaPublicKey,
        algorithm: SignatureAlgorithm,
    ) -> Self {
        Self {
            private_key,
            public_key,
            algorithm,
        }
    }

    /// Load the signing key and the counterparty's verification key.
    pub fn load(
        private: &KeyStoreConfig,
        public: &KeyStoreConfig,
        container_type: ContainerType,
        algorithm: SignatureAlgorithm,
    ) -> Result<Self, KeyStoreError> {
        let private_key =
            load_private_key(&private.path, container_type, &private.password, &private.alias)?;
        let public_key =
            load_public_key(&public.path, container_type, &public.password, &public.alias)?;

        tracing::debug!(
            private_keystore = %private.path.display(),
            public_keystore = %public.path.display(),
            algorithm = %algorithm,
            "Key material loaded"
        );

        Ok(Self::new(private_key, public_key, algorithm))
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("private_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Load the RSA private key stored under `alias`.
pub fn load_private_key(
    path: &Path,
    container_type: ContainerType,
    password: &str,
    alias: &str,
) -> Result<RsaPrivateKey, KeyStoreError> {
    let store = open_store(path, container_type, password)?;
    let der = store
        .private_key_der(alias)
        .ok_or_else(|| KeyStoreError::AliasNotFound {
            path: display(path),
            alias: alias.to_string(),
        })?;

    RsaPrivateKey::from_pkcs8_der(der).map_err(|e| KeyStoreError::KeyStoreUnreadable {
        path: display(path),
        reason: format!("key entry '{alias}' is not an RSA PKCS#8 key: {e}"),
    })
}

/// Load the RSA public key from the certificate bound to `alias`.
pub fn load_public_key(
    path: &Path,
    container_type: ContainerType,
    password: &str,
    alias: &str,
) -> Result<RsaPublicKey, KeyStoreError> {
    let store = open_store(path, container_type, password)?;
    let cert_der = match store.certificate_der(alias) {
        Some(der) => der,
        None if store.has_key_entry(alias) => {
            return Err(KeyStoreError::CertificateMissing {
                path: display(path),
                alias: alias.to_string(),
            })
        }
        None => {
            return Err(KeyStoreError::AliasNotFound {
                path: display(path),
                alias: alias.to_string(),
            })
        }
    };

    public_key_from_certificate(cert_der).map_err(|reason| KeyStoreError::KeyStoreUnreadable {
        path: display(path),
        reason: format!("certificate '{alias}': {reason}"),
    })
}

/// Diagnostic self-check: sign [`KEY_PAIR_CHECK_MESSAGE`] and verify it.
pub fn check_key_pair(
    private_key: &RsaPrivateKey,
    public_key: &RsaPublicKey,
    algorithm: SignatureAlgorithm,
) -> bool {
    let message = KEY_PAIR_CHECK_MESSAGE.as_bytes();
    match signature::sign(message, private_key, algorithm) {
        Ok(sig) => signature::verify(message, &sig, public_key, algorithm),
        Err(e) => {
            tracing::warn!(error = %e, "Key pair check could not sign");
            false
        }
    }
}

fn public_key_from_certificate(der: &[u8]) -> Result<RsaPublicKey, String> {
    let cert = Certificate::from_der(der).map_err(|e| format!("invalid X.509 DER: {e}"))?;
    let spki = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| format!("cannot re-encode public key info: {e}"))?;
    RsaPublicKey::from_public_key_der(&spki).map_err(|e| format!("not an RSA public key: {e}"))
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn open_store(
    path: &Path,
    container_type: ContainerType,
    password: &str,
) -> Result<Pkcs12Store, KeyStoreError> {
    let unreadable = |reason: String| KeyStoreError::KeyStoreUnreadable {
        path: display(path),
        reason,
    };

    if container_type != ContainerType::Pkcs12 {
        return Err(unreadable(format!(
            "container type {container_type} is not supported"
        )));
    }

    let bytes = std::fs::read(path).map_err(|e| unreadable(e.to_string()))?;
    Pkcs12Store::from_der(&bytes, password).map_err(unreadable)
}
