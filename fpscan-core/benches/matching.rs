use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fpscan_core::{
    score, BruteForceMatcher, Descriptor, DescriptorSet, Keypoint, NearestNeighborMatcher, RATIO_THRESHOLD,
};

/// Deterministic pseudo-random descriptors (xorshift), no two sets alike for different seeds
fn create_descriptor_set(count: usize, seed: u64) -> DescriptorSet {
    let mut state = seed.max(1);
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut set = DescriptorSet::empty();
    for i in 0..count {
        let mut d: Descriptor = [0; 32];
        for chunk in d.chunks_mut(8) {
            chunk.copy_from_slice(&next().to_le_bytes());
        }
        set.push(Keypoint::new((i % 96) as f32, (i / 96) as f32), d);
    }
    set
}

/// Candidate that shares `shared` descriptors with the sample, with a few bits flipped
fn create_related_set(sample: &DescriptorSet, shared: usize, seed: u64) -> DescriptorSet {
    let noise = create_descriptor_set(sample.len(), seed);
    let mut set = DescriptorSet::empty();
    for (i, ((kp, d), (_, n))) in sample.iter().zip(noise.iter()).enumerate() {
        if i < shared {
            let mut d = *d;
            d[i % 32] ^= 0b0000_0101;
            set.push(*kp, d);
        } else {
            set.push(*kp, *n);
        }
    }
    set
}

fn bench_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn2");

    for &count in &[100usize, 300, 500] {
        let query = create_descriptor_set(count, 7);
        let train = create_descriptor_set(count, 11);
        group.bench_with_input(BenchmarkId::new("brute_force", count), &count, |b, _| {
            b.iter(|| BruteForceMatcher.knn2(black_box(&query), black_box(&train)))
        });
    }

    group.finish();
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");

    let sample = create_descriptor_set(500, 3);
    for &shared in &[0usize, 100, 400] {
        let candidate = create_related_set(&sample, shared, 5);
        group.bench_with_input(BenchmarkId::new("ratio_test", shared), &shared, |b, _| {
            b.iter(|| score(black_box(&sample), black_box(&candidate), RATIO_THRESHOLD, &BruteForceMatcher))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_knn, bench_score);
criterion_main!(benches);
