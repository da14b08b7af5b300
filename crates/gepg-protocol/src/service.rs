//! # GePG Client Service
//!
//! Application service wiring the domain to the ports.
//!
//! ## Architecture
//!
//! - Implements the inbound ports ([`BillingApi`], [`CallbackApi`])
//! - Uses the outbound port ([`Transport`]) for the HTTP round trip
//! - Delegates canonical form, signatures and envelopes to the domain layer
//!
//! One exchange runs sequentially through
//! `Composed -> Signed -> Sent -> Received -> Verified -> Decoded`. Exchanges
//! share only the immutable [`KeyMaterial`], so any number may run at once.

use crate::config::GepgConfig;
use crate::domain::acknowledgment::{
    Acknowledgment, BillChangeAck, BillSubmissionAck, ControlNumberReuseAck,
    ReconciliationRequestAck,
};
use crate::domain::canonical::{canonicalize, decode, Payload};
use crate::domain::entities::{ExchangeState, RequestCategory, SignedDocument};
use crate::domain::envelope;
use crate::domain::errors::{ExchangeError, GepgError};
use crate::domain::keys::KeyMaterial;
use crate::domain::messages::{
    BillCancellationRequest, BillCancellationResponse, BillChangeRequest, BillSubmissionRequest,
    ControlNumberReuseRequest, ReconciliationRequest,
};
use crate::domain::signature;
use crate::domain::status;
use crate::ports::inbound::{BillingApi, CallbackApi};
use crate::ports::outbound::{ProtocolHeaders, Transport};
use gepg_telemetry::{EXCHANGES_TOTAL, EXCHANGE_DURATION, SIGNATURES_CREATED, VERIFICATION_FAILURES};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Client for the payment gateway.
pub struct GepgClient<T: Transport> {
    keys: Arc<KeyMaterial>,
    transport: T,
    base_url: String,
    service_code: String,
}

impl<T: Transport> GepgClient<T> {
    /// Validate the configuration and load both keys.
    ///
    /// # Errors
    /// * `GepgError::Configuration` - a setting is missing or the key material
    ///   cannot be loaded
    pub fn new(config: &GepgConfig, transport: T) -> Result<Self, GepgError> {
        config.validate()?;
        let keys = config.load_key_material()?;
        Ok(Self::with_key_material(config, Arc::new(keys), transport))
    }

    /// Build a client around already loaded keys.
    pub fn with_key_material(config: &GepgConfig, keys: Arc<KeyMaterial>, transport: T) -> Self {
        Self {
            keys,
            transport,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_code: config.service_code.clone(),
        }
    }

    pub fn key_material(&self) -> &KeyMaterial {
        &self.keys
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Canonicalize, sign and wrap a payload.
    pub fn sign_document<P: Payload>(&self, payload: &P) -> Result<SignedDocument, GepgError> {
        let canonical = canonicalize(payload)?;
        self.sign_canonical(&canonical)
    }

    /// Verify a gateway-initiated document and decode it.
    pub fn receive<R>(&self, bytes: &[u8]) -> Result<R, GepgError>
    where
        R: Payload + DeserializeOwned,
    {
        let payload = self.verify_document(bytes)?;
        let decoded = decode(&payload)?;
        debug!(root = R::ROOT, bytes = bytes.len(), "Callback verified and decoded");
        Ok(decoded)
    }

    /// Run one signed exchange and decode the response.
    ///
    /// Every error carries the last state reached. No retries.
    #[instrument(skip_all, fields(category = %category))]
    pub async fn exchange<Req, Resp>(
        &self,
        category: RequestCategory,
        request: &Req,
    ) -> Result<Resp, ExchangeError>
    where
        Req: Payload + Sync,
        Resp: Payload + DeserializeOwned + Send,
    {
        let started = Instant::now();
        let result = self.run_exchange(category, request).await;

        EXCHANGE_DURATION
            .with_label_values(&[category.label()])
            .observe(started.elapsed().as_secs_f64());
        let outcome = match &result {
            Ok(_) => "decoded",
            Err(e) => e.kind.label(),
        };
        EXCHANGES_TOTAL
            .with_label_values(&[category.label(), outcome])
            .inc();

        result
    }

    async fn run_exchange<Req, Resp>(
        &self,
        category: RequestCategory,
        request: &Req,
    ) -> Result<Resp, ExchangeError>
    where
        Req: Payload + Sync,
        Resp: Payload + DeserializeOwned + Send,
    {
        let canonical =
            canonicalize(request).map_err(|e| ExchangeError::new(ExchangeState::Composed, e))?;
        debug!(state = %ExchangeState::Composed, root = Req::ROOT, bytes = canonical.len(), "Payload composed");

        let document = self
            .sign_canonical(&canonical)
            .map_err(|e| ExchangeError::new(ExchangeState::Composed, e))?;
        debug!(state = %ExchangeState::Signed, bytes = document.len(), "Envelope signed");

        let url = format!("{}{}", self.base_url, category.path());
        let headers = ProtocolHeaders::new(category, self.service_code.as_str());
        debug!(state = %ExchangeState::Sent, url = %url, "Envelope handed to transport");
        let response = self
            .transport
            .send(&url, &headers, document.into_bytes())
            .await
            .map_err(|e| ExchangeError::new(ExchangeState::Signed, e))?;
        debug!(state = %ExchangeState::Received, bytes = response.len(), "Response received");

        let payload = self
            .verify_document(&response)
            .map_err(|e| ExchangeError::new(ExchangeState::Received, e))?;
        debug!(state = %ExchangeState::Verified, bytes = payload.len(), "Response signature valid");

        let decoded =
            decode::<Resp>(&payload).map_err(|e| ExchangeError::new(ExchangeState::Verified, e))?;
        info!(state = %ExchangeState::Decoded, response = Resp::ROOT, "Exchange completed");

        Ok(decoded)
    }

    fn sign_canonical(&self, canonical: &[u8]) -> Result<SignedDocument, GepgError> {
        let signature = signature::sign(canonical, self.keys.private_key(), self.keys.algorithm())?;
        SIGNATURES_CREATED.inc();
        let bytes = envelope::wrap(canonical, &signature)?;
        Ok(SignedDocument::new(bytes))
    }
}

impl<T: Transport> CallbackApi for GepgClient<T> {
    fn verify_document(&self, bytes: &[u8]) -> Result<Vec<u8>, GepgError> {
        let envelope = envelope::unwrap(bytes)?;
        let valid = signature::verify(
            envelope.payload(),
            envelope.signature(),
            self.keys.public_key(),
            self.keys.algorithm(),
        );
        if !valid {
            VERIFICATION_FAILURES.inc();
            warn!(
                algorithm = %self.keys.algorithm(),
                bytes = bytes.len(),
                "Rejecting envelope with invalid signature"
            );
            return Err(GepgError::VerificationFailed);
        }

        let (payload, _) = envelope.into_parts();
        Ok(payload)
    }

    fn acknowledge(&self, mut ack: Acknowledgment) -> Result<SignedDocument, GepgError> {
        if ack.status() != status::SUCCESS {
            debug!(
                root = ack.root(),
                incoming = ack.status(),
                "Overriding acknowledgment status"
            );
        }
        ack.set_status(status::SUCCESS);
        let canonical = ack.canonicalize()?;
        self.sign_canonical(&canonical)
    }
}

#[async_trait::async_trait]
impl<T: Transport> BillingApi for GepgClient<T> {
    async fn submit_bill(
        &self,
        request: &BillSubmissionRequest,
    ) -> Result<BillSubmissionAck, ExchangeError> {
        self.exchange(RequestCategory::BillSubmission, request).await
    }

    async fn reuse_control_number(
        &self,
        request: &ControlNumberReuseRequest,
    ) -> Result<ControlNumberReuseAck, ExchangeError> {
        self.exchange(RequestCategory::ControlNumberReuse, request)
            .await
    }

    async fn change_bill(
        &self,
        request: &BillChangeRequest,
    ) -> Result<BillChangeAck, ExchangeError> {
        self.exchange(RequestCategory::BillChange, request).await
    }

    async fn cancel_bill(
        &self,
        request: &BillCancellationRequest,
    ) -> Result<BillCancellationResponse, ExchangeError> {
        self.exchange(RequestCategory::BillCancellation, request)
            .await
    }

    async fn request_reconciliation(
        &self,
        request: &ReconciliationRequest,
    ) -> Result<ReconciliationRequestAck, ExchangeError> {
        self.exchange(RequestCategory::Reconciliation, request).await
    }
}
