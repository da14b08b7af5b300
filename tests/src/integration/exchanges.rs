//! # Exchange Flows
//!
//! Client-initiated requests: sign, send, verify the gateway's answer, decode.
//!
//! ## Flows Tested:
//!
//! 1. **Happy path** per request category, with protocol headers checked
//! 2. **Gateway failure codes** decode as ordinary acknowledgments
//! 3. **Rejected exchanges** carry the state they reached
//! 4. **Concurrent exchanges** share one client

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gepg_protocol::domain::messages::{
        BillCancellationRequest, BillChange, BillChangeRequest, ControlNumberReuseRequest,
        ReconciliationRequest,
    };
    use gepg_protocol::domain::status;
    use gepg_protocol::{
        BillSubmissionAck, BillingApi, ExchangeState, GepgClient, GepgError, KeyStoreConfig,
        CanonicalError, PaymentAck, RequestCategory, TransportError,
    };
    use gepg_telemetry::{gather_metrics, register_metrics};
    use rust_decimal::Decimal;

    use crate::counterparty::{
        client_config, fixture, Gateway, Mode, GATEWAY_ALIAS, INVALID_SIGNATURE, PASSWORD,
        SERVICE_CODE,
    };
    use crate::integration::{sample_bill, timestamp};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn client(gateway: Gateway) -> GepgClient<Arc<Gateway>> {
        GepgClient::new(&client_config(), Arc::new(gateway)).expect("client from fixtures")
    }

    // =============================================================================
    // HAPPY PATH
    // =============================================================================

    #[tokio::test]
    async fn test_submit_bill_round_trip() {
        let client = client(Gateway::acknowledging(status::SUCCESS));

        let ack = client.submit_bill(&sample_bill("B-100", 15_000)).await.unwrap();
        assert_eq!(ack.status_code, status::SUCCESS);

        let seen = client.transport().requests();
        assert_eq!(seen.len(), 1);
        let request = &seen[0];
        assert!(request.signature_valid, "gateway must accept our signature");
        assert_eq!(request.url, "https://gateway.test/api/bill/sigqrequest");
        assert_eq!(request.headers.request_category(), "default.sp.in");
        assert_eq!(request.headers.service_code, SERVICE_CODE);
        assert_eq!(request.headers.content_type, "application/xml");

        let payload = String::from_utf8(request.payload.clone()).unwrap();
        assert!(payload.starts_with("<gepgBillSubReq>"));
        assert!(payload.contains("<BillAmt>15000.00</BillAmt>"));
    }

    #[tokio::test]
    async fn test_every_category_reaches_its_endpoint() {
        let client = client(Gateway::acknowledging(status::SUCCESS));

        let mut reuse = sample_bill("B-101", 500);
        reuse.bill.control_number = Some("991110000101".to_string());
        let reuse = ControlNumberReuseRequest {
            header: reuse.header,
            bill: reuse.bill,
        };
        assert_eq!(
            client.reuse_control_number(&reuse).await.unwrap().status_code,
            status::SUCCESS
        );

        let change = BillChangeRequest {
            change: BillChange {
                bill_id: "B-101".to_string(),
                sp_code: SERVICE_CODE.to_string(),
                expires_at: timestamp(15, 12),
            },
        };
        assert_eq!(
            client.change_bill(&change).await.unwrap().status_code,
            status::SUCCESS
        );

        let reconciliation = ReconciliationRequest {
            request_id: "R-7".to_string(),
            sp_code: SERVICE_CODE.to_string(),
            sp_sys_id: "TSP001".to_string(),
            transaction_date: timestamp(2, 0).date(),
            option: 1,
        };
        assert_eq!(
            client
                .request_reconciliation(&reconciliation)
                .await
                .unwrap()
                .status_code,
            status::SUCCESS
        );

        let categories: Vec<_> = client
            .transport()
            .requests()
            .iter()
            .map(|r| (r.headers.request_category(), r.url.clone()))
            .collect();
        assert_eq!(
            categories,
            vec![
                (
                    "reusebill.sp.in",
                    "https://gateway.test/api/bill/sigqrequest_reuse".to_string()
                ),
                (
                    "changebill.sp.in",
                    "https://gateway.test/api/bill/sigqrequest_change".to_string()
                ),
                (
                    "reconciliations.sp.in",
                    "https://gateway.test/api/reconciliations/sig_sp_qrequest".to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_bill_returns_result_per_bill() {
        let client = client(Gateway::acknowledging(status::SUCCESS));
        let request = BillCancellationRequest {
            sp_code: SERVICE_CODE.to_string(),
            sp_sys_id: "TSP001".to_string(),
            bill_ids: vec!["B-1".to_string(), "B-2".to_string()],
        };

        let response = client.cancel_bill(&request).await.unwrap();
        let ids: Vec<_> = response.results.iter().map(|r| r.bill_id.as_str()).collect();
        assert_eq!(ids, vec!["B-1", "B-2"]);
        for result in &response.results {
            let statuses = result.statuses().unwrap();
            assert_eq!(statuses.len(), 1);
            assert!(statuses[0].is_success());
        }
    }

    // =============================================================================
    // GATEWAY STATUS CODES
    // =============================================================================

    #[tokio::test]
    async fn test_failure_status_is_decoded_not_raised() {
        let client = client(Gateway::acknowledging(7204));

        let ack = client.submit_bill(&sample_bill("B-404", 100)).await.unwrap();
        assert_eq!(ack.status_code, 7204);
        assert_eq!(status::lookup(ack.status_code), Ok("BILL_DOES_NOT_EXIST"));
        assert!(!status::is_success(ack.status_code));
    }

    #[tokio::test]
    async fn test_wrong_signing_key_is_refused_by_gateway() {
        // Sign with the gateway's own key instead of ours.
        let mut config = client_config();
        config.private_keystore = KeyStoreConfig::new(fixture("gepg.p12"), PASSWORD, GATEWAY_ALIAS);
        let client = GepgClient::new(&config, Arc::new(Gateway::acknowledging(status::SUCCESS)))
            .unwrap();

        let ack = client.submit_bill(&sample_bill("B-1", 100)).await.unwrap();
        assert_eq!(ack.status_code, INVALID_SIGNATURE);
        assert!(!client.transport().requests()[0].signature_valid);
    }

    // =============================================================================
    // REJECTED EXCHANGES
    // =============================================================================

    #[tokio::test]
    async fn test_tampered_response_is_rejected_at_received() {
        let client = client(Gateway::new(Mode::TamperResponse));

        let err = client
            .submit_bill(&sample_bill("B-200", 100))
            .await
            .unwrap_err();
        assert_eq!(err.state, ExchangeState::Received);
        assert!(matches!(err.kind, GepgError::VerificationFailed));
    }

    #[tokio::test]
    async fn test_sub_cent_amount_never_leaves_the_client() {
        let client = client(Gateway::acknowledging(status::SUCCESS));
        let mut bill = sample_bill("B-205", 0);
        bill.bill.amount = Decimal::new(125, 3);

        let err = client.submit_bill(&bill).await.unwrap_err();
        assert_eq!(err.state, ExchangeState::Composed);
        assert!(matches!(err.kind, GepgError::Decode(CanonicalError::Encode(_))));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_gateway_fails_after_signing() {
        let client = client(Gateway::new(Mode::Unavailable));

        let err = client
            .submit_bill(&sample_bill("B-201", 100))
            .await
            .unwrap_err();
        assert_eq!(err.state, ExchangeState::Signed);
        assert!(matches!(
            err.kind,
            GepgError::Transport(TransportError::Connection(_))
        ));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_unsigned_response_is_malformed() {
        let raw = b"<Gepg><gepgBillSubReqAck><TrxStsCode>7101</TrxStsCode></gepgBillSubReqAck></Gepg>";
        let client = client(Gateway::new(Mode::Raw(raw.to_vec())));

        let err = client
            .submit_bill(&sample_bill("B-202", 100))
            .await
            .unwrap_err();
        assert_eq!(err.state, ExchangeState::Received);
        assert!(matches!(err.kind, GepgError::EnvelopeMalformed(_)));
    }

    #[tokio::test]
    async fn test_empty_signature_fails_verification() {
        let raw = b"<Gepg><gepgBillSubReqAck><TrxStsCode>7101</TrxStsCode></gepgBillSubReqAck>\
                    <gepgSignature></gepgSignature></Gepg>";
        let client = client(Gateway::new(Mode::Raw(raw.to_vec())));

        let err = client
            .submit_bill(&sample_bill("B-203", 100))
            .await
            .unwrap_err();
        assert_eq!(err.state, ExchangeState::Received);
        assert!(matches!(err.kind, GepgError::VerificationFailed));
    }

    #[tokio::test]
    async fn test_valid_but_unexpected_document_fails_decoding() {
        let gateway = Gateway::acknowledging(status::SUCCESS);
        let wrong_document = gateway.callback(&PaymentAck::new(status::SUCCESS));
        let client = client(Gateway::new(Mode::Raw(wrong_document)));

        let err = client
            .submit_bill(&sample_bill("B-204", 100))
            .await
            .unwrap_err();
        assert_eq!(err.state, ExchangeState::Verified);
        assert!(matches!(err.kind, GepgError::Decode(_)));
    }

    #[tokio::test]
    async fn test_generic_exchange_with_explicit_category() {
        let client = client(Gateway::acknowledging(status::SUCCESS));

        let ack: BillSubmissionAck = client
            .exchange(RequestCategory::BillSubmission, &sample_bill("B-300", 1))
            .await
            .unwrap();
        assert_eq!(ack.status_code, status::SUCCESS);
    }

    // =============================================================================
    // CONCURRENCY & METRICS
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_exchanges_share_one_client() {
        let client = Arc::new(client(Gateway::acknowledging(status::SUCCESS)));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let client = Arc::clone(&client);
                tokio::spawn(async move {
                    let bill = sample_bill(&format!("B-C{i}"), 100 + i);
                    client.submit_bill(&bill).await
                })
            })
            .collect();

        for handle in handles {
            let ack = handle.await.unwrap().unwrap();
            assert_eq!(ack.status_code, status::SUCCESS);
        }

        let seen = client.transport().requests();
        assert_eq!(seen.len(), 16);
        assert!(seen.iter().all(|r| r.signature_valid));
    }

    #[tokio::test]
    async fn test_exchanges_are_counted() {
        register_metrics().unwrap();
        let client = client(Gateway::acknowledging(status::SUCCESS));
        client.submit_bill(&sample_bill("B-M1", 1)).await.unwrap();

        let text = gather_metrics().unwrap();
        assert!(text.contains("gepg_exchanges_total"));
        assert!(text.contains("gepg_signatures_created_total"));
    }
}
