//! # Domain Entities
//!
//! Request categories, exchange states and the signed wire document.

use std::fmt;

/// Kind of request sent to the gateway.
///
/// Selects both the endpoint path and the `Gepg-Com` header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestCategory {
    BillSubmission,
    ControlNumberReuse,
    BillChange,
    BillCancellation,
    Payment,
    Reconciliation,
}

impl RequestCategory {
    pub const ALL: [RequestCategory; 6] = [
        RequestCategory::BillSubmission,
        RequestCategory::ControlNumberReuse,
        RequestCategory::BillChange,
        RequestCategory::BillCancellation,
        RequestCategory::Payment,
        RequestCategory::Reconciliation,
    ];

    /// Value of the `Gepg-Com` header.
    pub fn header_value(&self) -> &'static str {
        match self {
            RequestCategory::BillSubmission => "default.sp.in",
            RequestCategory::ControlNumberReuse => "reusebill.sp.in",
            RequestCategory::BillChange => "changebill.sp.in",
            RequestCategory::BillCancellation => "cancelbill.sp.in",
            RequestCategory::Payment => "payment.sp.in",
            RequestCategory::Reconciliation => "reconciliations.sp.in",
        }
    }

    /// Endpoint path appended to the configured base URL.
    pub fn path(&self) -> &'static str {
        match self {
            RequestCategory::BillSubmission => "/api/bill/sigqrequest",
            RequestCategory::ControlNumberReuse => "/api/bill/sigqrequest_reuse",
            RequestCategory::BillChange => "/api/bill/sigqrequest_change",
            RequestCategory::BillCancellation => "/api/bill/sigcancel_request",
            RequestCategory::Payment => "/api/pmt/sigpmt_request",
            RequestCategory::Reconciliation => "/api/reconciliations/sig_sp_qrequest",
        }
    }

    /// Metric and log label.
    pub fn label(&self) -> &'static str {
        match self {
            RequestCategory::BillSubmission => "bill_submission",
            RequestCategory::ControlNumberReuse => "control_number_reuse",
            RequestCategory::BillChange => "bill_change",
            RequestCategory::BillCancellation => "bill_cancellation",
            RequestCategory::Payment => "payment",
            RequestCategory::Reconciliation => "reconciliation",
        }
    }
}

impl fmt::Display for RequestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress of a single request/response exchange.
///
/// ```text
/// Composed -> Signed -> Sent -> Received -> Verified -> Decoded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExchangeState {
    /// A canonical payload exists
    Composed,
    /// Envelope bytes exist, ready for transmission
    Signed,
    /// Bytes handed to the transport
    Sent,
    /// Raw response bytes obtained
    Received,
    /// Response envelope unwrapped and its signature checked
    Verified,
    /// Response payload mapped to a typed object
    Decoded,
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExchangeState::Composed => "Composed",
            ExchangeState::Signed => "Signed",
            ExchangeState::Sent => "Sent",
            ExchangeState::Received => "Received",
            ExchangeState::Verified => "Verified",
            ExchangeState::Decoded => "Decoded",
        };
        f.write_str(name)
    }
}

/// Envelope bytes ready for the wire: canonical payload plus signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDocument {
    bytes: Vec<u8>,
}

impl SignedDocument {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for SignedDocument {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
