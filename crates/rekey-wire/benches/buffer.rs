//! Benchmarks for the wire buffer codec.

#![allow(clippy::unwrap_used, missing_docs)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rekey_wire::Buffer;

fn bench_u32_encode(c: &mut Criterion) {
    c.bench_function("u32_encode", |b| {
        b.iter(|| {
            let mut buf = Buffer::new();
            buf.put_u32(black_box(0xdead_beef));
            black_box(buf)
        })
    });
}

fn bench_u32_decode(c: &mut Criterion) {
    let mut buf = Buffer::new();
    buf.put_u32(0xdead_beef);
    let encoded = buf.into_vec();

    c.bench_function("u32_decode", |b| {
        b.iter(|| {
            let mut reader = Buffer::from_vec(encoded.clone());
            black_box(reader.get_u32().unwrap())
        })
    });
}

fn bench_principal_str_round_trip(c: &mut Criterion) {
    let principal = "host/db1.example.org@EXAMPLE.ORG";

    c.bench_function("principal_str_encode", |b| {
        b.iter(|| {
            let mut buf = Buffer::new();
            buf.put_str(black_box(principal));
            black_box(buf)
        })
    });

    let mut buf = Buffer::new();
    buf.put_str(principal);
    let encoded = buf.into_vec();

    c.bench_function("principal_str_decode", |b| {
        b.iter(|| {
            let mut reader = Buffer::from_vec(encoded.clone());
            black_box(reader.get_str().unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_u32_encode,
    bench_u32_decode,
    bench_principal_str_round_trip
);
criterion_main!(benches);
