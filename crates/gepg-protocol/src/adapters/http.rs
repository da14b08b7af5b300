//! # HTTP Transport
//!
//! `reqwest` implementation of the [`Transport`] port. Posts the signed
//! document with the protocol headers:
//!
//! | Header | Value |
//! |--------|-------|
//! | `Content-Type` | `application/xml` |
//! | `Gepg-Com` | request category, e.g. `default.sp.in` |
//! | `Gepg-Code` | caller's service code |

use crate::ports::outbound::{ProtocolHeaders, Transport, TransportError};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

pub const HEADER_REQUEST_CATEGORY: &str = "Gepg-Com";
pub const HEADER_SERVICE_CODE: &str = "Gepg-Code";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport over HTTPS (rustls).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Use a preconfigured client (proxies, custom roots).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        url: &str,
        headers: &ProtocolHeaders,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, headers.content_type)
            .header(HEADER_REQUEST_CATEGORY, headers.request_category())
            .header(HEADER_SERVICE_CODE, headers.service_code.as_str())
            .body(body)
            .send()
            .await
            .map_err(map_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(url, status = status.as_u16(), "Gateway rejected request");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Body(e.to_string())
            }
        })?;
        Ok(bytes.to_vec())
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(e.to_string())
    }
}
