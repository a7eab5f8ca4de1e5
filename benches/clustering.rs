use clade::validity::ClusterValidity;
use clade::{
    DissimilarityMatrix, FeatureMatrix, HierarchicalClustering, Kmeans, Linkage, Metric,
    ValidityConfig, ValidityMethod,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;

fn ratings(n: usize, d: usize) -> FeatureMatrix {
    let mut rng = StdRng::seed_from_u64(42);
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|_| (0..d).map(|_| rng.random_range(1.0..5.0)).collect())
        .collect();
    FeatureMatrix::from_rows(&rows).unwrap()
}

fn bench_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans");
    let data = ratings(1000, 16);

    group.bench_function("fit_n1000_d16_k10", |b| {
        b.iter(|| {
            let model = Kmeans::new(10).with_restarts(3).with_max_iter(10).with_seed(42);
            model.fit(black_box(&data)).unwrap();
        })
    });

    group.finish();
}

fn bench_hierarchical(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchical");
    let data = ratings(300, 16);
    let d = DissimilarityMatrix::compute(&data, Metric::Euclidean).unwrap();

    for linkage in [Linkage::Single, Linkage::Average, Linkage::Ward] {
        group.bench_function(format!("build_n300_{}", linkage.name()), |b| {
            b.iter(|| {
                HierarchicalClustering::new(1)
                    .with_linkage(linkage)
                    .build(black_box(&d))
                    .unwrap();
            })
        });
    }

    group.finish();
}

fn bench_validity(c: &mut Criterion) {
    let data = ratings(100, 8);
    let validity = ClusterValidity::new(ValidityConfig::default().with_references(10).with_restarts(3));

    c.bench_function("gap_n100_k1_8", |b| {
        b.iter(|| {
            validity
                .evaluate(black_box(&data), ValidityMethod::Gap, 1..=8)
                .unwrap();
        })
    });
}

criterion_group!(benches, bench_kmeans, bench_hierarchical, bench_validity);
criterion_main!(benches);
