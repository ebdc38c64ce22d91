use criterion::{black_box, criterion_group, criterion_main, Criterion};
use event_fusion::{BusSample, FatigueSample, FusionEngine, VisionSample};

fn full_engine() -> FusionEngine {
    let engine = FusionEngine::default();
    for i in 0..10 {
        let _ = engine.ingest_vision(VisionSample {
            lane_departure: i % 3 == 0,
            closest_object_distance: Some(5.0 + i as f64),
            ..Default::default()
        });
        let _ = engine.ingest_obd(BusSample {
            speed_kmh: 60.0 + i as f64 * 5.0,
            aggressive_braking: i % 4 == 0,
            ..Default::default()
        });
        let _ = engine.ingest_fatigue(FatigueSample {
            fatigue_score: 10.0 * i as f64,
            yawn_detected: i % 2 == 0,
            ..Default::default()
        });
    }
    engine
}

fn bench_assessment(c: &mut Criterion) {
    let engine = full_engine();
    c.bench_function("generate_assessment", |b| {
        b.iter(|| black_box(engine.generate_assessment()))
    });
}

fn bench_ingest(c: &mut Criterion) {
    let engine = FusionEngine::default();
    c.bench_function("ingest_vision", |b| {
        b.iter(|| engine.ingest_vision(black_box(VisionSample::default())))
    });
}

criterion_group!(benches, bench_assessment, bench_ingest);
criterion_main!(benches);
