//! # Protocol Errors
//!
//! Error types for key loading, signing, envelope handling and exchanges.
//!
//! Each layer returns its own error; [`GepgError`] gathers them into the
//! protocol taxonomy and [`ExchangeError`] adds the exchange state reached
//! before the failure.

use super::entities::ExchangeState;
use crate::config::ConfigError;
use crate::ports::outbound::TransportError;
use thiserror::Error;

/// Errors raised while reading keys out of a key-store container.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyStoreError {
    /// Missing file, unparseable container, unsupported type or wrong password
    #[error("Key store {path} is unreadable: {reason}")]
    KeyStoreUnreadable { path: String, reason: String },

    /// No entry in the container carries the alias
    #[error("Alias '{alias}' not found in key store {path}")]
    AliasNotFound { path: String, alias: String },

    /// The alias names a key entry with no certificate bound to it
    #[error("No certificate bound to alias '{alias}' in key store {path}")]
    CertificateMissing { path: String, alias: String },
}

/// Errors from the signature engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The configured algorithm name is not one this engine knows
    #[error("Unsupported signature algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The private key could not produce a signature (key too small for the digest, ...)
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Structural violations of the `<Gepg>` wire format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Malformed envelope: {0}")]
    Malformed(String),
}

/// Errors from the canonical serializer and the typed-object mapper.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("Failed to encode payload: {0}")]
    Encode(String),

    #[error("Failed to decode payload: {0}")]
    Decode(String),
}

/// Status registry lookup miss.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("Unknown status code: {0}")]
    UnknownStatusCode(u16),

    /// A `TrxStsCode` token that is not a number at all
    #[error("Malformed status code: '{0}'")]
    MalformedStatusCode(String),
}

/// Protocol error taxonomy.
#[derive(Debug, Error)]
pub enum GepgError {
    /// Missing settings or unusable key material, surfaced at client construction
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Signing(#[from] SignatureError),

    #[error("Transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The envelope was well formed but its signature does not validate
    #[error("Signature verification failed")]
    VerificationFailed,

    #[error(transparent)]
    UnknownStatusCode(#[from] StatusError),

    #[error(transparent)]
    EnvelopeMalformed(#[from] EnvelopeError),

    #[error(transparent)]
    Decode(#[from] CanonicalError),
}

impl GepgError {
    /// Short label used for metrics and structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            GepgError::Configuration(_) => "configuration",
            GepgError::Signing(_) => "signing_failed",
            GepgError::Transport(_) => "transport_failed",
            GepgError::VerificationFailed => "verification_failed",
            GepgError::UnknownStatusCode(_) => "unknown_status_code",
            GepgError::EnvelopeMalformed(_) => "envelope_malformed",
            GepgError::Decode(_) => "decode_failed",
        }
    }
}

/// Terminal failure of a request/response exchange.
///
/// `state` is the last state the exchange reached before `kind` occurred, so a
/// transport failure reports `Signed` and a bad response signature reports
/// `Received`.
#[derive(Debug, Error)]
#[error("{kind} (exchange reached {state})")]
pub struct ExchangeError {
    pub state: ExchangeState,
    #[source]
    pub kind: GepgError,
}

impl ExchangeError {
    pub fn new(state: ExchangeState, kind: impl Into<GepgError>) -> Self {
        Self {
            state,
            kind: kind.into(),
        }
    }
}
