//! # Protocol Status Registry
//!
//! Closed table of gateway status codes. 71xx is success, 72xx business
//! failures, 73xx protocol and security failures.
//!
//! The table is append-only for a protocol version. An unknown code is an
//! error, never a default meaning.

use super::errors::StatusError;
use std::fmt;

/// Code every acknowledgment generated by this side carries.
pub const SUCCESS: u16 = 7101;

/// Sorted by code; `lookup` binary-searches it.
static REGISTRY: &[(u16, &str)] = &[
    (7101, "SUCCESSFUL"),
    (7201, "FAILURE"),
    (7202, "REQUIRED_HEADER_NOT_GIVEN"),
    (7203, "UNAUTHORIZED"),
    (7204, "BILL_DOES_NOT_EXIST"),
    (7205, "INVALID_SERVICE_PROVIDER"),
    (7206, "SERVICE_PROVIDER_NOT_ACTIVE"),
    (7207, "DUPLICATE_PAYMENT"),
    (7208, "INVALID_BUSINESS_ACCOUNT"),
    (7209, "BUSINESS_ACCOUNT_NOT_ACTIVE"),
    (7210, "COLLECTION_ACCOUNT_BALANCE_LIMIT_REACHED"),
    (7211, "PAYMENT_SERVICE_PROVIDER_CODE_MISMATCH"),
    (7212, "PAYMENT_CURRENCY_MISMATCH"),
    (7213, "BILL_EXPIRED"),
    (7214, "INSUFFICIENT_AMOUNT_PAID"),
    (7215, "INVALID_PAYMENT_SERVICE_PROVIDER"),
    (7216, "PAYMENT_SERVICE_PROVIDER_NOT_ACTIVE"),
    (7217, "NO_PAYMENTS_FOUND"),
    (7218, "INVALID_BILL_REFERENCE"),
    (7219, "DUPLICATE_BILL_INFORMATION"),
    (7220, "BILL_ALREADY_PAID"),
    (7221, "BILL_CANCELLED"),
    (7222, "INVALID_BILL_AMOUNT"),
    (7223, "INVALID_BILL_EXPIRY_DATE"),
    (7224, "CONTROL_NUMBER_NOT_REUSABLE"),
    (7225, "INVALID_RECONCILIATION_DATE"),
    (7226, "RECONCILIATION_NOT_READY"),
    (7227, "BILL_CHANGE_NOT_ALLOWED"),
    (7301, "INVALID_SIGNATURE"),
    (7302, "SIGNATURE_MISSING"),
    (7303, "INVALID_REQUEST_DATA"),
    (7304, "INVALID_SERVICE_CODE"),
    (7305, "UNSUPPORTED_REQUEST_CATEGORY"),
    (7306, "GATEWAY_INTERNAL_ERROR"),
];

/// Resolve a code to its canonical meaning.
pub fn lookup(code: u16) -> Result<&'static str, StatusError> {
    REGISTRY
        .binary_search_by_key(&code, |(c, _)| *c)
        .map(|i| REGISTRY[i].1)
        .map_err(|_| StatusError::UnknownStatusCode(code))
}

pub fn is_success(code: u16) -> bool {
    code == SUCCESS
}

/// Every registered code, ascending.
pub fn codes() -> impl Iterator<Item = u16> {
    REGISTRY.iter().map(|(code, _)| *code)
}

/// Resolve a `;`-separated `TrxStsCode` list such as `7201;7227`.
///
/// Blank tokens are skipped. The first token that is not a number, or not a
/// registered code, fails the whole list.
pub fn resolve_list(codes: &str) -> Result<Vec<StatusCode>, StatusError> {
    codes
        .split(';')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            let code = token
                .parse::<u16>()
                .map_err(|_| StatusError::MalformedStatusCode(token.to_string()))?;
            StatusCode::resolve(code)
        })
        .collect()
}

/// A resolved status: code plus meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode {
    pub code: u16,
    pub meaning: &'static str,
}

impl StatusCode {
    pub fn resolve(code: u16) -> Result<Self, StatusError> {
        Ok(Self {
            code,
            meaning: lookup(code)?,
        })
    }

    pub fn is_success(&self) -> bool {
        is_success(self.code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.meaning)
    }
}
