// Witness merge benchmarks for the Littercoin pipeline.
//
// Covers span scanning of a realistic transaction, parsing a wallet witness
// set, and the full verify-and-attach merge at several signer counts.

use ciborium::value::Value;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;

use littercoin_protocol::cbor::raw::Reader;
use littercoin_protocol::cbor::{Transaction, WitnessSet};
use littercoin_protocol::finalize::merge_witness;

/// `[body, {}, true, null]` with `inputs` inputs and a 2 KB metadata blob.
fn unsigned_tx(inputs: usize) -> Vec<u8> {
    let input = |i: usize| {
        Value::Array(vec![
            Value::Bytes(vec![i as u8; 32]),
            Value::Integer((i as u64 % 4).into()),
        ])
    };
    let body = Value::Map(vec![
        (
            Value::Integer(0.into()),
            Value::Array((0..inputs).map(input).collect()),
        ),
        (Value::Integer(2.into()), Value::Integer(187_000.into())),
        (Value::Integer(7.into()), Value::Bytes(vec![0xab; 32])),
    ]);
    let tx = Value::Array(vec![
        body,
        Value::Map(vec![]),
        Value::Bool(true),
        Value::Bytes(vec![0x5a; 2048]),
    ]);
    let mut out = Vec::new();
    ciborium::ser::into_writer(&tx, &mut out).expect("encode fixture");
    out
}

fn witness_hex(tx_hash: &[u8; 32], signers: usize) -> String {
    let witnesses = (0..signers)
        .map(|_| {
            let key = SigningKey::generate(&mut OsRng);
            Value::Array(vec![
                Value::Bytes(key.verifying_key().to_bytes().to_vec()),
                Value::Bytes(key.sign(tx_hash).to_bytes().to_vec()),
            ])
        })
        .collect();
    let set = Value::Map(vec![(
        Value::Integer(0.into()),
        Value::Tag(258, Box::new(Value::Array(witnesses))),
    )]);
    let mut out = Vec::new();
    ciborium::ser::into_writer(&set, &mut out).expect("encode fixture");
    hex::encode(out)
}

fn bench_span_scan(c: &mut Criterion) {
    let tx = unsigned_tx(64);
    c.bench_function("cbor/item_span_64_inputs", |b| {
        b.iter(|| Reader::new(&tx).item_span().map(<[u8]>::len));
    });
}

fn bench_parse_witness_set(c: &mut Criterion) {
    let hash = [9u8; 32];
    let bytes = hex::decode(witness_hex(&hash, 4)).expect("fixture hex");
    c.bench_function("cbor/parse_witness_set_4", |b| {
        b.iter(|| WitnessSet::from_cbor(&bytes));
    });
}

fn bench_merge(c: &mut Criterion) {
    let tx = unsigned_tx(16);
    let tx_hex = hex::encode(&tx);
    let hash = Transaction::from_cbor(&tx).expect("fixture tx").hash();

    let mut group = c.benchmark_group("finalize/merge_witness");
    for signers in [1usize, 4, 16] {
        let witness = witness_hex(&hash, signers);
        group.throughput(Throughput::Elements(signers as u64));
        group.bench_with_input(BenchmarkId::from_parameter(signers), &witness, |b, w| {
            b.iter(|| merge_witness(w, &tx_hex).expect("merge"));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_span_scan,
    bench_parse_witness_set,
    bench_merge
);
criterion_main!(benches);
