//! # GePG Envelope Protocol
//!
//! Client side of the Government e-Payment Gateway message exchange: signed
//! XML documents inside a fixed `<Gepg>` envelope, posted over HTTPS.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): keys, canonical form, signatures, envelope,
//!   status registry and business messages
//! - **Ports Layer** (`ports/`): inbound API traits and the outbound transport
//! - **Adapters** (`adapters/`): `reqwest` transport
//! - **Service Layer** (`service.rs`): the exchange state machine
//!
//! ## Security Notes
//!
//! - Only canonical payload bytes are signed, never the envelope
//! - A response whose signature does not validate is rejected whatever it says
//! - Acknowledgments generated here always carry status 7101

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::http::HttpTransport;
pub use config::{ConfigError, GepgConfig};
pub use domain::acknowledgment::{
    Acknowledgment, BillChangeAck, BillSubmissionAck, ControlNumberAck, ControlNumberReuseAck,
    PaymentAck, ReconciliationAck, ReconciliationRequestAck,
};
pub use domain::canonical::{canonicalize, decode, Payload};
pub use domain::entities::{ExchangeState, RequestCategory, SignedDocument};
pub use domain::envelope::{unwrap, wrap, Envelope};
pub use domain::errors::{
    CanonicalError, EnvelopeError, ExchangeError, GepgError, KeyStoreError, SignatureError,
    StatusError,
};
pub use domain::keys::{
    check_key_pair, load_private_key, load_public_key, ContainerType, KeyMaterial, KeyStoreConfig,
    KEY_PAIR_CHECK_MESSAGE,
};
pub use domain::signature::{sign, verify, SignatureAlgorithm};
pub use domain::status::{lookup, StatusCode, SUCCESS};
pub use ports::inbound::{BillingApi, CallbackApi};
pub use ports::outbound::{ProtocolHeaders, Transport, TransportError};
pub use service::GepgClient;
