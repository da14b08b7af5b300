//! # Inbound Ports (Driving Ports / API)
//!
//! What billing code calls. [`BillingApi`] covers the outbound exchanges,
//! [`CallbackApi`] the documents the gateway pushes to us.

use crate::domain::acknowledgment::{
    Acknowledgment, BillChangeAck, BillSubmissionAck, ControlNumberReuseAck,
    ReconciliationRequestAck,
};
use crate::domain::entities::SignedDocument;
use crate::domain::errors::{ExchangeError, GepgError};
use crate::domain::messages::{
    BillCancellationRequest, BillCancellationResponse, BillChangeRequest, BillSubmissionRequest,
    ControlNumberReuseRequest, ReconciliationRequest,
};

/// Signed request/response exchanges with the gateway.
///
/// Every call runs `Composed -> Signed -> Sent -> Received -> Verified ->
/// Decoded` and fails with the state it had reached.
#[async_trait::async_trait]
pub trait BillingApi: Send + Sync {
    /// Submit a bill for a control number (`default.sp.in`).
    async fn submit_bill(
        &self,
        request: &BillSubmissionRequest,
    ) -> Result<BillSubmissionAck, ExchangeError>;

    /// Issue a bill under an existing control number (`reusebill.sp.in`).
    async fn reuse_control_number(
        &self,
        request: &ControlNumberReuseRequest,
    ) -> Result<ControlNumberReuseAck, ExchangeError>;

    /// Change a bill's expiry (`changebill.sp.in`).
    async fn change_bill(&self, request: &BillChangeRequest)
        -> Result<BillChangeAck, ExchangeError>;

    /// Cancel one or more bills (`cancelbill.sp.in`).
    async fn cancel_bill(
        &self,
        request: &BillCancellationRequest,
    ) -> Result<BillCancellationResponse, ExchangeError>;

    /// Request the reconciliation of a day's payments (`reconciliations.sp.in`).
    async fn request_reconciliation(
        &self,
        request: &ReconciliationRequest,
    ) -> Result<ReconciliationRequestAck, ExchangeError>;
}

/// Handling of gateway-initiated documents.
pub trait CallbackApi: Send + Sync {
    /// Unwrap and verify a received envelope, returning the payload bytes.
    ///
    /// # Errors
    /// * `GepgError::EnvelopeMalformed` - not a `<Gepg>` envelope
    /// * `GepgError::VerificationFailed` - signature does not validate
    fn verify_document(&self, bytes: &[u8]) -> Result<Vec<u8>, GepgError>;

    /// Produce the signed acknowledgment for a received document.
    ///
    /// The status field is always set to 7101 before signing.
    fn acknowledge(&self, ack: Acknowledgment) -> Result<SignedDocument, GepgError>;
}
