#![allow(missing_docs)]
use alloy_primitives::{B256, keccak256};
use alloy_signer_local::PrivateKeySigner;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use digest::Digest;
use pollen_primitives::{ContentChunk, SingleOwnerChunk, bmt::Hasher};
use rand::prelude::*;

pub fn primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");
    let mut rng = rand::rng();

    let random_data: Vec<u8> = (0..4096).map(|_| rng.random::<u8>()).collect();

    // Plain keccak256 over a full chunk as the lower bound
    group.bench_function("hash_baseline_4096", |b| {
        b.iter(|| {
            black_box(keccak256(&random_data));
        })
    });

    group.bench_function("bmt_hash_4096", |b| {
        b.iter(|| {
            let mut hasher = Hasher::new();
            hasher.set_span(4096);
            hasher.update(&random_data);
            black_box(hasher.sum());
        })
    });

    // Short payloads hit the zero subtree cache
    for size in [32, 128, 512, 1024, 2048, 4096] {
        let data = vec![0x42; size];
        group.bench_with_input(BenchmarkId::new("bmt_by_size", size), &size, |b, &size| {
            b.iter(|| {
                let mut hasher = Hasher::new();
                hasher.set_span(size as u64);
                hasher.update(&data);
                black_box(hasher.finalize());
            });
        });
    }

    group.bench_function("bmt_reused_hasher_4096", |b| {
        let mut hasher = Hasher::new();
        b.iter(|| {
            hasher.set_span(4096);
            hasher.update(&random_data);
            black_box(hasher.finalize_reset());
        });
    });

    group.bench_function("content_chunk_4096", |b| {
        b.iter(|| black_box(ContentChunk::new(random_data.clone()).unwrap()));
    });

    let signer = PrivateKeySigner::random();
    group.bench_function("single_owner_chunk_sign_4096", |b| {
        b.iter(|| {
            black_box(SingleOwnerChunk::new(B256::ZERO, random_data.clone(), &signer).unwrap())
        });
    });

    let soc = SingleOwnerChunk::new(B256::ZERO, random_data.clone(), &signer).unwrap();
    let wire = pollen_primitives::Chunk::to_bytes(&soc);
    group.bench_function("single_owner_chunk_unmarshal_4096", |b| {
        b.iter(|| {
            black_box(SingleOwnerChunk::unmarshal(wire.clone(), &signer.address()).unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, primitives);
criterion_main!(benches);
