//! # Integration Tests
//!
//! A real [`GepgClient`](gepg_protocol::GepgClient) against the in-process
//! [`Gateway`](crate::counterparty::Gateway), fixture keys on both sides.

pub mod callbacks;
pub mod exchanges;

use chrono::{NaiveDate, NaiveDateTime};
use gepg_protocol::domain::messages::{BillHeader, BillItem, BillItems, BillSubmissionRequest, BillTransaction};
use rust_decimal::Decimal;

use crate::counterparty::SERVICE_CODE;

pub fn timestamp(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .expect("valid test timestamp")
}

/// A single-item bill for `amount` TZS.
pub fn sample_bill(bill_id: &str, amount: i64) -> BillSubmissionRequest {
    let amount = Decimal::from(amount);
    BillSubmissionRequest {
        header: BillHeader {
            sp_code: SERVICE_CODE.to_string(),
            return_response: true,
        },
        bill: BillTransaction {
            bill_id: bill_id.to_string(),
            control_number: None,
            sub_sp_code: "1001".to_string(),
            sp_sys_id: "TSP001".to_string(),
            amount,
            misc_amount: Decimal::ZERO,
            expires_at: timestamp(31, 23),
            payer_id: "P-1".to_string(),
            payer_name: "Neema Mushi".to_string(),
            description: "Business licence".to_string(),
            generated_at: timestamp(1, 9),
            generated_by: "billing".to_string(),
            approved_by: "finance".to_string(),
            payer_phone: "255711000000".to_string(),
            payer_email: "neema@example.org".to_string(),
            currency: "TZS".to_string(),
            equivalent_amount: amount,
            reminder: true,
            payment_option: 3,
            items: BillItems {
                items: vec![BillItem {
                    reference: format!("{bill_id}-1"),
                    use_reference_on_pay: "N".to_string(),
                    amount,
                    equivalent_amount: amount,
                    misc_amount: Decimal::ZERO,
                    gfs_code: "140313".to_string(),
                }],
            },
        },
    }
}
