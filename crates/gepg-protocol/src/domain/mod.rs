//! # Domain Layer
//!
//! Key material, canonical form, signatures, the envelope format and the
//! status registry. No network I/O; key loading reads files only.

pub mod acknowledgment;
pub mod canonical;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod keys;
pub mod messages;
mod pkcs12;
pub mod signature;
pub mod status;
