//! # GePG Envelope Benchmarks
//!
//! | Operation | Target |
//! |-----------|--------|
//! | RSA sign (2048-bit, SHA1) | < 5ms |
//! | RSA verify | < 0.5ms |
//! | Envelope wrap/unwrap | < 50µs |
//! | Canonicalize + sign + wrap a bill | < 5ms |

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gepg_protocol::domain::envelope;
use gepg_protocol::{canonicalize, sign, verify, GepgClient, SignatureAlgorithm};
use gepg_tests::counterparty::{client_config, Gateway};
use gepg_tests::integration::sample_bill;

// ============================================================================
// Signature engine
// ============================================================================

fn bench_signatures(c: &mut Criterion) {
    let config = client_config();
    let keys = config.load_key_material().expect("fixture keys");
    let payload = canonicalize(&sample_bill("B-BENCH", 25_000)).expect("canonical bill");

    let mut group = c.benchmark_group("signature");
    group.measurement_time(Duration::from_secs(10));

    for algorithm in [SignatureAlgorithm::Sha1WithRsa, SignatureAlgorithm::Sha256WithRsa] {
        let signature = sign(&payload, keys.private_key(), algorithm).expect("sign");

        group.bench_with_input(
            BenchmarkId::new("sign", algorithm),
            &payload,
            |b, payload| b.iter(|| black_box(sign(payload, keys.private_key(), algorithm))),
        );
        group.bench_with_input(
            BenchmarkId::new("verify", algorithm),
            &(payload.clone(), signature),
            |b, (payload, signature)| {
                b.iter(|| black_box(verify(payload, signature, keys.public_key(), algorithm)))
            },
        );
    }

    group.finish();
}

// ============================================================================
// Envelope codec
// ============================================================================

fn bench_envelope(c: &mut Criterion) {
    let config = client_config();
    let keys = config.load_key_material().expect("fixture keys");

    let mut group = c.benchmark_group("envelope");

    for items in [1usize, 10, 100] {
        let mut bill = sample_bill("B-BENCH", 1_000);
        let template = bill.bill.items.items[0].clone();
        bill.bill.items.items = (0..items)
            .map(|i| {
                let mut item = template.clone();
                item.reference = format!("B-BENCH-{i}");
                item
            })
            .collect();

        let payload = canonicalize(&bill).expect("canonical bill");
        let signature = sign(&payload, keys.private_key(), keys.algorithm()).expect("sign");
        let wrapped = envelope::wrap(&payload, &signature).expect("wrap");

        group.throughput(Throughput::Bytes(wrapped.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("wrap", items),
            &(payload, signature),
            |b, (payload, signature)| b.iter(|| black_box(envelope::wrap(payload, signature))),
        );
        group.bench_with_input(BenchmarkId::new("unwrap", items), &wrapped, |b, wrapped| {
            b.iter(|| black_box(envelope::unwrap(wrapped)))
        });
    }

    group.finish();
}

// ============================================================================
// Client
// ============================================================================

fn bench_sign_document(c: &mut Criterion) {
    let client = GepgClient::new(&client_config(), Arc::new(Gateway::acknowledging(7101)))
        .expect("client from fixtures");
    let bill = sample_bill("B-BENCH", 25_000);

    c.bench_function("client/sign_document", |b| {
        b.iter(|| black_box(client.sign_document(&bill)))
    });
}

criterion_group!(benches, bench_signatures, bench_envelope, bench_sign_document);

criterion_main!(benches);
