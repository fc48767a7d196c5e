//! Benchmarks for postage stamp operations.

#![allow(missing_docs)]

use alloy_primitives::B256;
use alloy_signer_local::PrivateKeySigner;
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use pollen_postage::{
    BatchStamper, BucketLayout, MemoryIssuer, Stamp, StampIndex, StampIssuer, Stamper,
    calculate_bucket,
};
use pollen_primitives::SwarmAddress;
use rand::Rng;

fn random_address() -> SwarmAddress {
    let mut rng = rand::rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    SwarmAddress::new(bytes)
}

fn random_stamp() -> Stamp {
    let mut rng = rand::rng();
    let mut batch = [0u8; 32];
    rng.fill(&mut batch);
    let mut sig = [0u8; 65];
    rng.fill(&mut sig);

    let index = StampIndex::new(rng.random(), rng.random());
    Stamp::new(B256::from(batch), index, rng.random(), sig)
}

fn bench_stamp_roundtrip(c: &mut Criterion) {
    let stamp = random_stamp();

    c.bench_function("stamp_roundtrip", |b| {
        b.iter(|| {
            let encoded = stamp.to_bytes();
            black_box(Stamp::from_bytes(black_box(&encoded)))
        })
    });
}

fn bench_bucket_allocation(c: &mut Criterion) {
    let addresses: Vec<SwarmAddress> = (0..1000).map(|_| random_address()).collect();
    let layout = BucketLayout::new(24, 16).unwrap();

    let mut group = c.benchmark_group("allocation");
    group.throughput(Throughput::Elements(addresses.len() as u64));

    group.bench_function("calculate_bucket", |b| {
        b.iter(|| {
            for address in &addresses {
                black_box(calculate_bucket(address, 16));
            }
        })
    });

    group.bench_function("prepare_stamp", |b| {
        b.iter_batched(
            || MemoryIssuer::new(B256::ZERO, layout),
            |mut issuer| {
                for address in &addresses {
                    black_box(issuer.prepare_stamp(address, 0).unwrap());
                }
            },
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn bench_stamp_signed(c: &mut Criterion) {
    let stamper =
        BatchStamper::from_blank(PrivateKeySigner::random(), B256::ZERO, 40, 16).unwrap();
    let address = random_address();

    c.bench_function("stamp_signed", |b| {
        b.iter(|| black_box(stamper.stamp(&address).unwrap()))
    });
}

fn bench_stamp_recover(c: &mut Criterion) {
    let stamper =
        BatchStamper::from_blank(PrivateKeySigner::random(), B256::ZERO, 20, 16).unwrap();
    let address = random_address();
    let stamp = stamper.stamp(&address).unwrap().to_stamp();

    c.bench_function("stamp_recover_issuer", |b| {
        b.iter(|| black_box(stamp.recover_issuer(address).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_stamp_roundtrip,
    bench_bucket_allocation,
    bench_stamp_signed,
    bench_stamp_recover
);
criterion_main!(benches);
