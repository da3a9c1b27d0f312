use criterion::{black_box, criterion_group, criterion_main, Criterion};
use careledger_types::{BlockHash, NodeId, Payload, Timestamp};

fn sample_payload(fields: usize) -> Payload {
    let mut payload = Payload::new();
    payload.insert("action".into(), "blood_test".into());
    for i in 0..fields {
        payload.insert(format!("field_{i}"), format!("value number {i}").into());
    }
    payload
}

fn canonical_encode_bench(c: &mut Criterion) {
    let value = serde_json::Value::Object(sample_payload(16));

    c.bench_function("canonical_json_16_fields", |b| {
        b.iter(|| careledger_crypto::canonical_json(black_box(&value)))
    });
}

fn compute_hash_bench(c: &mut Criterion) {
    let payload = sample_payload(4);
    let previous = BlockHash::new([0xAB; 32]);
    let originator = NodeId::new("doctor_node").unwrap();

    c.bench_function("compute_hash_small_payload", |b| {
        b.iter(|| {
            careledger_crypto::compute_hash(
                black_box(42),
                Timestamp::new(1_700_000_000_000),
                black_box(&payload),
                &previous,
                &originator,
            )
        })
    });
}

fn compute_hash_large_payload_bench(c: &mut Criterion) {
    let payload = sample_payload(256);
    let originator = NodeId::new("hospital_node").unwrap();

    c.bench_function("compute_hash_256_fields", |b| {
        b.iter(|| {
            careledger_crypto::compute_hash(
                black_box(7),
                Timestamp::new(1_700_000_000_000),
                black_box(&payload),
                &BlockHash::ZERO,
                &originator,
            )
        })
    });
}

criterion_group!(
    benches,
    canonical_encode_bench,
    compute_hash_bench,
    compute_hash_large_payload_bench,
);
criterion_main!(benches);
