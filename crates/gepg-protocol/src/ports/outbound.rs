//! # Outbound Ports (Driven Ports / SPI)
//!
//! The one dependency the client needs: send bytes, get bytes back.

use crate::domain::entities::RequestCategory;
use thiserror::Error;

/// Content type of every signed document.
pub const CONTENT_TYPE: &str = "application/xml";

/// Error from the transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not reach the gateway
    #[error("Connection error: {0}")]
    Connection(String),

    /// The gateway answered with a non-success HTTP status
    #[error("Gateway returned HTTP {status}")]
    Status { status: u16, body: String },

    /// No answer within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Protocol header values sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolHeaders {
    pub content_type: &'static str,
    pub category: RequestCategory,
    pub service_code: String,
}

impl ProtocolHeaders {
    pub fn new(category: RequestCategory, service_code: impl Into<String>) -> Self {
        Self {
            content_type: CONTENT_TYPE,
            category,
            service_code: service_code.into(),
        }
    }

    /// Value of the `Gepg-Com` header.
    pub fn request_category(&self) -> &'static str {
        self.category.header_value()
    }
}

/// Transport to the payment gateway.
///
/// One call is one request/response round trip. Implementations must not
/// retry; cancellation and timeouts are theirs to enforce.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url` and return the raw response body.
    ///
    /// # Errors
    /// * `TransportError::Connection` - gateway unreachable
    /// * `TransportError::Status` - non-2xx HTTP status
    /// * `TransportError::Timeout` - no response in time
    async fn send(
        &self,
        url: &str,
        headers: &ProtocolHeaders,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(
        &self,
        url: &str,
        headers: &ProtocolHeaders,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).send(url, headers, body).await
    }
}
