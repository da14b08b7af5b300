//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that billing code calls
//! - **Outbound (Driven)**: the HTTP transport this client needs

pub mod inbound;
pub mod outbound;
