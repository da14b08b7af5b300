//! # Acknowledgments
//!
//! Every acknowledgment is a single-field document holding a status code.
//! [`Acknowledgment`] closes over all of them so the status field can be read
//! and overwritten without knowing the concrete kind.

use super::canonical::{canonicalize, Payload};
use super::errors::CanonicalError;
use serde::{Deserialize, Serialize};

macro_rules! acknowledgment {
    ($(#[$doc:meta])* $name:ident, $root:literal, $field:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(rename = $field)]
            pub status_code: u16,
        }

        impl $name {
            pub fn new(status_code: u16) -> Self {
                Self { status_code }
            }
        }

        impl Payload for $name {
            const ROOT: &'static str = $root;
        }
    };
}

acknowledgment!(
    /// `gepgBillSubReqAck`
    BillSubmissionAck, "gepgBillSubReqAck", "TrxStsCode"
);
acknowledgment!(
    /// `gepgBillCtrNumReuseReqAck`
    ControlNumberReuseAck, "gepgBillCtrNumReuseReqAck", "TrxStsCode"
);
acknowledgment!(
    /// `gepgBillChangeReqAck`
    BillChangeAck, "gepgBillChangeReqAck", "TrxStsCode"
);
acknowledgment!(
    /// `gepgBillSubRespAck`: receipt of a control-number callback
    ControlNumberAck, "gepgBillSubRespAck", "TrxStsCode"
);
acknowledgment!(
    /// `gepgPmtSpInfoAck`: receipt of a payment notification
    PaymentAck, "gepgPmtSpInfoAck", "TrxStsCode"
);
acknowledgment!(
    /// `gepgSpReconcReqAck`
    ReconciliationRequestAck, "gepgSpReconcReqAck", "ReconcStsCode"
);
acknowledgment!(
    /// `gepgSpReconcRespAck`: receipt of a reconciliation callback
    ReconciliationAck, "gepgSpReconcRespAck", "ReconcStsCode"
);

/// Any acknowledgment kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgment {
    BillSubmission(BillSubmissionAck),
    ControlNumberReuse(ControlNumberReuseAck),
    BillChange(BillChangeAck),
    ControlNumber(ControlNumberAck),
    Payment(PaymentAck),
    ReconciliationRequest(ReconciliationRequestAck),
    Reconciliation(ReconciliationAck),
}

impl Acknowledgment {
    pub fn status(&self) -> u16 {
        match self {
            Acknowledgment::BillSubmission(a) => a.status_code,
            Acknowledgment::ControlNumberReuse(a) => a.status_code,
            Acknowledgment::BillChange(a) => a.status_code,
            Acknowledgment::ControlNumber(a) => a.status_code,
            Acknowledgment::Payment(a) => a.status_code,
            Acknowledgment::ReconciliationRequest(a) => a.status_code,
            Acknowledgment::Reconciliation(a) => a.status_code,
        }
    }

    pub fn set_status(&mut self, code: u16) {
        match self {
            Acknowledgment::BillSubmission(a) => a.status_code = code,
            Acknowledgment::ControlNumberReuse(a) => a.status_code = code,
            Acknowledgment::BillChange(a) => a.status_code = code,
            Acknowledgment::ControlNumber(a) => a.status_code = code,
            Acknowledgment::Payment(a) => a.status_code = code,
            Acknowledgment::ReconciliationRequest(a) => a.status_code = code,
            Acknowledgment::Reconciliation(a) => a.status_code = code,
        }
    }

    /// Wire element name of the active kind.
    pub fn root(&self) -> &'static str {
        match self {
            Acknowledgment::BillSubmission(_) => BillSubmissionAck::ROOT,
            Acknowledgment::ControlNumberReuse(_) => ControlNumberReuseAck::ROOT,
            Acknowledgment::BillChange(_) => BillChangeAck::ROOT,
            Acknowledgment::ControlNumber(_) => ControlNumberAck::ROOT,
            Acknowledgment::Payment(_) => PaymentAck::ROOT,
            Acknowledgment::ReconciliationRequest(_) => ReconciliationRequestAck::ROOT,
            Acknowledgment::Reconciliation(_) => ReconciliationAck::ROOT,
        }
    }

    pub fn canonicalize(&self) -> Result<Vec<u8>, CanonicalError> {
        match self {
            Acknowledgment::BillSubmission(a) => canonicalize(a),
            Acknowledgment::ControlNumberReuse(a) => canonicalize(a),
            Acknowledgment::BillChange(a) => canonicalize(a),
            Acknowledgment::ControlNumber(a) => canonicalize(a),
            Acknowledgment::Payment(a) => canonicalize(a),
            Acknowledgment::ReconciliationRequest(a) => canonicalize(a),
            Acknowledgment::Reconciliation(a) => canonicalize(a),
        }
    }
}

macro_rules! into_acknowledgment {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Acknowledgment {
                fn from(ack: $ty) -> Self {
                    Acknowledgment::$variant(ack)
                }
            }
        )*
    };
}

into_acknowledgment!(
    BillSubmission(BillSubmissionAck),
    ControlNumberReuse(ControlNumberReuseAck),
    BillChange(BillChangeAck),
    ControlNumber(ControlNumberAck),
    Payment(PaymentAck),
    ReconciliationRequest(ReconciliationRequestAck),
    Reconciliation(ReconciliationAck),
);
