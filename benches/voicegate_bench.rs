use criterion::{black_box, criterion_group, criterion_main, Criterion};
use voicegate::{similarity, FeatureExtractor, Waveform};

fn make_sine(freq_hz: f64, n_samples: usize, sample_rate: u32) -> Waveform {
    let samples: Vec<f32> = (0..n_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (0.8 * (freq_hz * 2.0 * std::f64::consts::PI * t).sin()) as f32
        })
        .collect();
    Waveform::new(samples, sample_rate)
}

fn bench_extract_1s(c: &mut Criterion) {
    let extractor = FeatureExtractor::new();
    let wave = make_sine(200.0, 16000, 16000);

    c.bench_function("voicegate_extract_1s", |b| {
        b.iter(|| {
            let _ = black_box(extractor.extract(black_box(&wave)));
        });
    });
}

fn bench_extract_5s(c: &mut Criterion) {
    let extractor = FeatureExtractor::new();
    let wave = make_sine(200.0, 80000, 16000);

    c.bench_function("voicegate_extract_5s", |b| {
        b.iter(|| {
            let _ = black_box(extractor.extract(black_box(&wave)));
        });
    });
}

fn bench_similarity(c: &mut Criterion) {
    let extractor = FeatureExtractor::new();
    let a = extractor.extract(&make_sine(200.0, 80000, 16000));
    let b_set = extractor.extract(&make_sine(220.0, 80000, 16000));

    c.bench_function("voicegate_similarity", |b| {
        b.iter(|| {
            let _ = black_box(similarity(black_box(&a), black_box(&b_set)));
        });
    });
}

criterion_group!(benches, bench_extract_1s, bench_extract_5s, bench_similarity);
criterion_main!(benches);
