//! # Business Messages
//!
//! Typed payloads carried inside envelopes. Field order is wire order.
//!
//! Date-time layout is chosen per field: bill expiry and reconciliation
//! transaction times carry a `Z` suffix, generation and payment times do not.

use super::canonical::{amount, calendar_date, local_datetime, zulu_datetime, Payload};
use super::errors::StatusError;
use super::status::{self, StatusCode};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// BILL SUBMISSION / CONTROL NUMBER REUSE
// =============================================================================

/// `gepgBillSubReq`: ask the gateway to issue a control number for a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillSubmissionRequest {
    #[serde(rename = "BillHdr")]
    pub header: BillHeader,
    #[serde(rename = "BillTrxInf")]
    pub bill: BillTransaction,
}

impl Payload for BillSubmissionRequest {
    const ROOT: &'static str = "gepgBillSubReq";
}

/// `gepgBillCtrNumReuseReq`: issue a new bill under an existing control number.
///
/// `bill.control_number` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlNumberReuseRequest {
    #[serde(rename = "BillHdr")]
    pub header: BillHeader,
    #[serde(rename = "BillTrxInf")]
    pub bill: BillTransaction,
}

impl Payload for ControlNumberReuseRequest {
    const ROOT: &'static str = "gepgBillCtrNumReuseReq";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillHeader {
    #[serde(rename = "SpCode")]
    pub sp_code: String,
    /// Whether the gateway should call back with the control number
    #[serde(rename = "RtrRespFlg")]
    pub return_response: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillTransaction {
    #[serde(rename = "BillId")]
    pub bill_id: String,
    #[serde(
        rename = "PayCntrNum",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub control_number: Option<String>,
    #[serde(rename = "SubSpCode")]
    pub sub_sp_code: String,
    #[serde(rename = "SpSysId")]
    pub sp_sys_id: String,
    #[serde(rename = "BillAmt", with = "amount")]
    pub amount: Decimal,
    #[serde(rename = "MiscAmt", with = "amount")]
    pub misc_amount: Decimal,
    #[serde(rename = "BillExprDt", with = "zulu_datetime")]
    pub expires_at: NaiveDateTime,
    #[serde(rename = "PyrId")]
    pub payer_id: String,
    #[serde(rename = "PyrName")]
    pub payer_name: String,
    #[serde(rename = "BillDesc")]
    pub description: String,
    #[serde(rename = "BillGenDt", with = "local_datetime")]
    pub generated_at: NaiveDateTime,
    #[serde(rename = "BillGenBy")]
    pub generated_by: String,
    #[serde(rename = "BillApprBy")]
    pub approved_by: String,
    #[serde(rename = "PyrCellNum")]
    pub payer_phone: String,
    #[serde(rename = "PyrEmail")]
    pub payer_email: String,
    #[serde(rename = "Ccy")]
    pub currency: String,
    #[serde(rename = "BillEqvAmt", with = "amount")]
    pub equivalent_amount: Decimal,
    #[serde(rename = "RemFlag")]
    pub reminder: bool,
    /// 1 = full, 2 = partial, 3 = exact
    #[serde(rename = "BillPayOpt")]
    pub payment_option: u8,
    #[serde(rename = "BillItems")]
    pub items: BillItems,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BillItems {
    #[serde(rename = "BillItem", default)]
    pub items: Vec<BillItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    #[serde(rename = "BillItemRef")]
    pub reference: String,
    #[serde(rename = "UseItemRefOnPay")]
    pub use_reference_on_pay: String,
    #[serde(rename = "BillItemAmt", with = "amount")]
    pub amount: Decimal,
    #[serde(rename = "BillItemEqvAmt", with = "amount")]
    pub equivalent_amount: Decimal,
    #[serde(rename = "BillItemMiscAmt", with = "amount")]
    pub misc_amount: Decimal,
    #[serde(rename = "GfsCode")]
    pub gfs_code: String,
}

// =============================================================================
// BILL CHANGE / CANCELLATION
// =============================================================================

/// `gepgBillChangeReq`: move a bill's expiry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillChangeRequest {
    #[serde(rename = "BillTrxInf")]
    pub change: BillChange,
}

impl Payload for BillChangeRequest {
    const ROOT: &'static str = "gepgBillChangeReq";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillChange {
    #[serde(rename = "BillId")]
    pub bill_id: String,
    #[serde(rename = "SpCode")]
    pub sp_code: String,
    #[serde(rename = "BillExprDt", with = "zulu_datetime")]
    pub expires_at: NaiveDateTime,
}

/// `gepgBillCanclReq`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillCancellationRequest {
    #[serde(rename = "SpCode")]
    pub sp_code: String,
    #[serde(rename = "SpSysId")]
    pub sp_sys_id: String,
    #[serde(rename = "BillId")]
    pub bill_ids: Vec<String>,
}

impl Payload for BillCancellationRequest {
    const ROOT: &'static str = "gepgBillCanclReq";
}

/// `gepgBillCanclResp`: one result per cancelled bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillCancellationResponse {
    #[serde(rename = "BillCanclTrxDt", default)]
    pub results: Vec<BillCancellationResult>,
}

impl Payload for BillCancellationResponse {
    const ROOT: &'static str = "gepgBillCanclResp";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillCancellationResult {
    #[serde(rename = "BillId")]
    pub bill_id: String,
    #[serde(rename = "TrxSts")]
    pub transaction_status: String,
    /// One or more codes joined by `;`, as on a control-number callback
    #[serde(rename = "TrxStsCode")]
    pub status_codes: String,
}

impl BillCancellationResult {
    pub fn statuses(&self) -> Result<Vec<StatusCode>, StatusError> {
        status::resolve_list(&self.status_codes)
    }
}

// =============================================================================
// GATEWAY CALLBACKS
// =============================================================================

/// `gepgBillSubResp`: control number issued (or refused) for a submitted bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlNumberResponse {
    #[serde(rename = "BillTrxInf")]
    pub bill: ControlNumberAssignment,
}

impl Payload for ControlNumberResponse {
    const ROOT: &'static str = "gepgBillSubResp";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlNumberAssignment {
    #[serde(rename = "BillId")]
    pub bill_id: String,
    #[serde(rename = "TrxSts")]
    pub transaction_status: String,
    #[serde(rename = "PayCntrNum", default)]
    pub control_number: String,
    /// One or more codes joined by `;`, e.g. `7201;7227`
    #[serde(rename = "TrxStsCode")]
    pub status_codes: String,
}

impl ControlNumberAssignment {
    /// Resolve every code in `TrxStsCode`; an unregistered code fails the whole lookup.
    pub fn statuses(&self) -> Result<Vec<StatusCode>, StatusError> {
        status::resolve_list(&self.status_codes)
    }
}

/// `gepgPmtSpInfo`: a payer settled a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentNotification {
    #[serde(rename = "PymtTrxInf")]
    pub payment: PaymentTransaction,
}

impl Payload for PaymentNotification {
    const ROOT: &'static str = "gepgPmtSpInfo";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    #[serde(rename = "TrxId")]
    pub transaction_id: String,
    #[serde(rename = "SpCode")]
    pub sp_code: String,
    #[serde(rename = "PayRefId")]
    pub payment_reference: String,
    #[serde(rename = "BillId")]
    pub bill_id: String,
    #[serde(rename = "PayCtrNum")]
    pub control_number: String,
    #[serde(rename = "BillAmt", with = "amount")]
    pub bill_amount: Decimal,
    #[serde(rename = "PaidAmt", with = "amount")]
    pub paid_amount: Decimal,
    #[serde(rename = "BillPayOpt")]
    pub payment_option: u8,
    #[serde(rename = "CCy")]
    pub currency: String,
    #[serde(rename = "TrxDtTm", with = "local_datetime")]
    pub paid_at: NaiveDateTime,
    #[serde(rename = "UsdPayChnl")]
    pub channel: String,
    #[serde(rename = "PyrCellNum")]
    pub payer_phone: String,
    #[serde(rename = "PyrName")]
    pub payer_name: String,
    #[serde(rename = "PyrEmail", default)]
    pub payer_email: String,
    #[serde(rename = "PspReceiptNumber")]
    pub receipt_number: String,
    #[serde(rename = "PspName")]
    pub psp_name: String,
    #[serde(rename = "CtrAccNum")]
    pub collection_account: String,
}

// =============================================================================
// RECONCILIATION
// =============================================================================

/// `gepgSpReconcReq`: ask for the transactions settled on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRequest {
    #[serde(rename = "SpReconcReqId")]
    pub request_id: String,
    #[serde(rename = "SpCode")]
    pub sp_code: String,
    #[serde(rename = "SpSysId")]
    pub sp_sys_id: String,
    #[serde(rename = "TnxDt", with = "calendar_date")]
    pub transaction_date: NaiveDate,
    /// 1 = successful transactions, 2 = exceptions
    #[serde(rename = "ReconcOpt")]
    pub option: u8,
}

impl Payload for ReconciliationRequest {
    const ROOT: &'static str = "gepgSpReconcReq";
}

/// `gepgSpReconcResp`: gateway callback carrying the reconciled transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResponse {
    #[serde(rename = "ReconcBatchInfo")]
    pub batch: ReconciliationBatch,
    #[serde(rename = "ReconcTrans", default)]
    pub transactions: ReconciliationTransactions,
}

impl Payload for ReconciliationResponse {
    const ROOT: &'static str = "gepgSpReconcResp";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationBatch {
    #[serde(rename = "SpReconcReqId")]
    pub request_id: String,
    #[serde(rename = "SpCode")]
    pub sp_code: String,
    #[serde(rename = "SpName")]
    pub sp_name: String,
    #[serde(rename = "ReconcStsCode")]
    pub status_code: u16,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReconciliationTransactions {
    #[serde(rename = "ReconcTrxInf", default)]
    pub items: Vec<ReconciledTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledTransaction {
    #[serde(rename = "SpBillId")]
    pub bill_id: String,
    #[serde(rename = "BillCtrNum")]
    pub control_number: String,
    #[serde(rename = "pspTrxId")]
    pub psp_transaction_id: String,
    #[serde(rename = "PaidAmt", with = "amount")]
    pub paid_amount: Decimal,
    #[serde(rename = "CCy")]
    pub currency: String,
    #[serde(rename = "PayRefId")]
    pub payment_reference: String,
    #[serde(rename = "TrxDtTm", with = "zulu_datetime")]
    pub paid_at: NaiveDateTime,
    #[serde(rename = "CtrAccNum")]
    pub collection_account: String,
    #[serde(rename = "UsdPayChnl")]
    pub channel: String,
    #[serde(rename = "PspName")]
    pub psp_name: String,
    #[serde(rename = "Remarks", default)]
    pub remarks: String,
}
