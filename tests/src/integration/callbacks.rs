//! # Callback Flows
//!
//! Gateway-initiated documents: the client verifies and decodes them, then
//! answers with a signed acknowledgment the gateway can check.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gepg_protocol::domain::messages::{
        ControlNumberAssignment, ControlNumberResponse, PaymentNotification, PaymentTransaction,
        ReconciledTransaction, ReconciliationBatch, ReconciliationResponse,
        ReconciliationTransactions,
    };
    use gepg_protocol::domain::status;
    use gepg_protocol::{
        decode, Acknowledgment, CallbackApi, ControlNumberAck, GepgClient, GepgError, PaymentAck,
        ReconciliationAck,
    };
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use crate::counterparty::{client_config, Gateway, SERVICE_CODE};
    use crate::integration::timestamp;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn setup() -> (GepgClient<Arc<Gateway>>, Arc<Gateway>) {
        let gateway = Arc::new(Gateway::acknowledging(status::SUCCESS));
        let client = GepgClient::new(&client_config(), Arc::clone(&gateway)).unwrap();
        (client, gateway)
    }

    fn payment() -> PaymentNotification {
        PaymentNotification {
            payment: PaymentTransaction {
                transaction_id: "TRX-9001".to_string(),
                sp_code: SERVICE_CODE.to_string(),
                payment_reference: "PR-77".to_string(),
                bill_id: "B-100".to_string(),
                control_number: "991110000100".to_string(),
                bill_amount: Decimal::new(15_000, 0),
                paid_amount: Decimal::new(15_000, 0),
                payment_option: 3,
                currency: "TZS".to_string(),
                paid_at: timestamp(3, 14),
                channel: "MPESA".to_string(),
                payer_phone: "255711000000".to_string(),
                payer_name: "Neema Mushi".to_string(),
                payer_email: "neema@example.org".to_string(),
                receipt_number: "RCPT-1".to_string(),
                psp_name: "Vodacom".to_string(),
                collection_account: "0150000000".to_string(),
            },
        }
    }

    // =============================================================================
    // CONTROL NUMBER CALLBACK
    // =============================================================================

    #[test]
    fn test_control_number_callback() {
        let (client, gateway) = setup();
        let document = gateway.callback(&ControlNumberResponse {
            bill: ControlNumberAssignment {
                bill_id: "B-100".to_string(),
                transaction_status: "GS".to_string(),
                control_number: "991110000100".to_string(),
                status_codes: "7101".to_string(),
            },
        });

        let response: ControlNumberResponse = client.receive(&document).unwrap();
        assert_eq!(response.bill.control_number, "991110000100");
        let statuses = response.bill.statuses().unwrap();
        assert_eq!(statuses.len(), 1);
        assert!(statuses[0].is_success());

        let ack = client
            .acknowledge(ControlNumberAck::new(status::SUCCESS).into())
            .unwrap();
        let payload = gateway.open(ack.as_bytes()).expect("client signature holds");
        let decoded: ControlNumberAck = decode(&payload).unwrap();
        assert_eq!(decoded.status_code, status::SUCCESS);
    }

    #[test]
    fn test_failed_control_number_lists_every_status() {
        let (client, gateway) = setup();
        let document = gateway.callback(&ControlNumberResponse {
            bill: ControlNumberAssignment {
                bill_id: "B-101".to_string(),
                transaction_status: "GF".to_string(),
                control_number: String::new(),
                status_codes: "7201;7204".to_string(),
            },
        });

        let response: ControlNumberResponse = client.receive(&document).unwrap();
        let meanings: Vec<_> = response
            .bill
            .statuses()
            .unwrap()
            .into_iter()
            .map(|s| s.meaning)
            .collect();
        assert_eq!(meanings, vec!["FAILURE", "BILL_DOES_NOT_EXIST"]);
    }

    // =============================================================================
    // PAYMENT CALLBACK
    // =============================================================================

    #[test]
    fn test_payment_callback_is_acknowledged_with_success() {
        let (client, gateway) = setup();
        let document = gateway.callback(&payment());

        let received: PaymentNotification = client.receive(&document).unwrap();
        assert_eq!(received, payment());

        // Whatever the caller asks for, the wire carries 7101.
        let ack = client.acknowledge(PaymentAck::new(7201).into()).unwrap();
        let payload = gateway.open(ack.as_bytes()).expect("client signature holds");
        let decoded: PaymentAck = decode(&payload).unwrap();
        assert_eq!(decoded.status_code, status::SUCCESS);
    }

    #[test]
    fn test_tampered_callback_is_rejected() {
        let (client, gateway) = setup();
        let document = String::from_utf8(gateway.callback(&payment()))
            .unwrap()
            .replace("15000.00</PaidAmt>", "1.00</PaidAmt>");

        let err = client
            .receive::<PaymentNotification>(document.as_bytes())
            .unwrap_err();
        assert!(matches!(err, GepgError::VerificationFailed));
    }

    #[test]
    fn test_callback_without_signature_is_malformed() {
        let (client, _) = setup();
        let document = b"<Gepg><gepgPmtSpInfo><PymtTrxInf/></gepgPmtSpInfo></Gepg>";

        let err = client.verify_document(document).unwrap_err();
        assert!(matches!(err, GepgError::EnvelopeMalformed(_)));
    }

    #[test]
    fn test_callback_with_empty_signature_fails_verification() {
        let (client, _) = setup();
        let document =
            b"<Gepg><gepgPmtSpInfo><PymtTrxInf/></gepgPmtSpInfo><gepgSignature></gepgSignature></Gepg>";

        let err = client.verify_document(document).unwrap_err();
        assert!(matches!(err, GepgError::VerificationFailed));
    }

    // =============================================================================
    // RECONCILIATION CALLBACK
    // =============================================================================

    #[test]
    fn test_reconciliation_callback() {
        let (client, gateway) = setup();
        let document = gateway.callback(&ReconciliationResponse {
            batch: ReconciliationBatch {
                request_id: "R-7".to_string(),
                sp_code: SERVICE_CODE.to_string(),
                sp_name: "Municipal Council".to_string(),
                status_code: status::SUCCESS,
            },
            transactions: ReconciliationTransactions {
                items: vec![ReconciledTransaction {
                    bill_id: "B-100".to_string(),
                    control_number: "991110000100".to_string(),
                    psp_transaction_id: "TRX-9001".to_string(),
                    paid_amount: Decimal::new(15_000, 0),
                    currency: "TZS".to_string(),
                    payment_reference: "PR-77".to_string(),
                    paid_at: timestamp(3, 14),
                    collection_account: "0150000000".to_string(),
                    channel: "MPESA".to_string(),
                    psp_name: "Vodacom".to_string(),
                    remarks: "settled".to_string(),
                }],
            },
        });

        let response: ReconciliationResponse = client.receive(&document).unwrap();
        assert_eq!(response.batch.request_id, "R-7");
        assert_eq!(response.transactions.items.len(), 1);
        assert_eq!(response.transactions.items[0].paid_at, timestamp(3, 14));

        let ack = client
            .acknowledge(ReconciliationAck::new(status::SUCCESS).into())
            .unwrap();
        let payload = gateway.open(ack.as_bytes()).expect("client signature holds");
        assert_eq!(
            payload,
            b"<gepgSpReconcRespAck><ReconcStsCode>7101</ReconcStsCode></gepgSpReconcRespAck>"
        );
    }

    #[test]
    fn test_callback_of_wrong_kind_fails_decoding() {
        let (client, gateway) = setup();
        let document = gateway.callback(&payment());

        let err = client
            .receive::<ReconciliationResponse>(&document)
            .unwrap_err();
        assert!(matches!(err, GepgError::Decode(_)));
    }

    // =============================================================================
    // PROPERTY TESTS
    // =============================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_acknowledgment_always_success(code in any::<u16>()) {
            let (client, gateway) = setup();
            let ack: Acknowledgment = PaymentAck::new(code).into();

            let signed = client.acknowledge(ack).unwrap();
            let payload = gateway.open(signed.as_bytes()).unwrap();
            let decoded: PaymentAck = decode(&payload).unwrap();
            prop_assert_eq!(decoded.status_code, status::SUCCESS);
        }
    }
}
