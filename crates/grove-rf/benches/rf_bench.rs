//! Criterion benchmarks for grove-rf: forest training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use grove_rf::{RandomForestConfig, TrainingMode};

/// 28x28 "images": a class-dependent bright block on a noisy background.
fn make_images(n_samples: usize, n_classes: usize, seed: u64) -> (Vec<Vec<i32>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class);
        let row: Vec<i32> = (0..784)
            .map(|px| {
                let row_band = px / 28 / 3;
                if row_band == class {
                    200 + rng.gen_range(0..56)
                } else {
                    rng.gen_range(0..64)
                }
            })
            .collect();
        features.push(row);
    }
    (features, labels)
}

fn bench_train_sequential(c: &mut Criterion) {
    let (features, labels) = make_images(1000, 10, 42);
    let config = RandomForestConfig::new(10).unwrap();

    c.bench_function("rf_train_1000x784_10class_10trees_seq", |b| {
        b.iter(|| config.fit(&features, &labels).unwrap());
    });
}

fn bench_train_parallel(c: &mut Criterion) {
    let (features, labels) = make_images(1000, 10, 42);
    let config = RandomForestConfig::new(10)
        .unwrap()
        .with_training_mode(TrainingMode::Parallel);

    c.bench_function("rf_train_1000x784_10class_10trees_par", |b| {
        b.iter(|| config.fit(&features, &labels).unwrap());
    });
}

fn bench_predict_batch(c: &mut Criterion) {
    let (features, labels) = make_images(1000, 10, 42);
    let forest = RandomForestConfig::new(10)
        .unwrap()
        .fit(&features, &labels)
        .unwrap()
        .into_forest();

    c.bench_function("rf_predict_batch_1000x784_10trees", |b| {
        b.iter(|| forest.predict_batch(&features).unwrap());
    });
}

criterion_group!(benches, bench_train_sequential, bench_train_parallel, bench_predict_batch);
criterion_main!(benches);
