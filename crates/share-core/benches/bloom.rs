use criterion::{criterion_group, criterion_main, Criterion};
use share_core::ShareBloom;

fn bloom_add(c: &mut Criterion) {
    c.bench_function("bloom filter add token", |b| {
        let mut filter = ShareBloom::with_expected_items(500_000);
        let mut i = 0u64;
        b.iter(|| {
            let token = format!("file-{i}.bin");
            filter.add(&token);
            i += 1;
        });
    });
}

fn bloom_contains(c: &mut Criterion) {
    let tokens: Vec<String> = (0..100_000u64).map(|i| format!("file-{i}.bin")).collect();
    let mut filter = ShareBloom::with_expected_items(tokens.len());
    for t in &tokens {
        filter.add(t);
    }

    c.bench_function("bloom filter contains, true positive", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let token = &tokens[i % tokens.len()];
            assert!(filter.contains(token));
            i += 1;
        });
    });

    c.bench_function("bloom filter contains, true negative", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let token = format!("absent-{i}.bin");
            let _ = filter.contains(&token);
            i += 1;
        });
    });
}

criterion_group!(benches, bloom_add, bloom_contains);
criterion_main!(benches);
