//! Concurrent producers feeding one engine

use event_fusion::{
    BusSample, FatigueSample, FusionEngine, FusionSettings, ManualClock, VisionSample,
};
use std::sync::Arc;

const PER_PRODUCER: usize = 500;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_three_producers_and_a_reader() {
    let engine = Arc::new(
        FusionEngine::new(&FusionSettings::default())
            .unwrap()
            .with_clock(Arc::new(ManualClock::new(1_700_000_000.0))),
    );

    let vision = {
        let engine = engine.clone();
        tokio::spawn(async move {
            for i in 0..PER_PRODUCER {
                engine
                    .ingest_vision(VisionSample {
                        lane_departure: i % 2 == 0,
                        closest_object_distance: Some((i % 30) as f64),
                        ..Default::default()
                    })
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let obd = {
        let engine = engine.clone();
        tokio::spawn(async move {
            for i in 0..PER_PRODUCER {
                engine
                    .ingest_obd(BusSample {
                        speed_kmh: (i % 140) as f64,
                        engine_stress: i % 3 == 0,
                        ..Default::default()
                    })
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let fatigue = {
        let engine = engine.clone();
        tokio::spawn(async move {
            for i in 0..PER_PRODUCER {
                engine
                    .ingest_fatigue(FatigueSample {
                        fatigue_score: (i % 100) as f64,
                        ..Default::default()
                    })
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let reader = {
        let engine = engine.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                let assessment = engine.generate_assessment();
                let risks = assessment.risks;
                for risk in [
                    risks.collision,
                    risks.lane_departure,
                    risks.driver_fatigue,
                    risks.aggressive_driving,
                ] {
                    assert!((0.0..=1.0).contains(&risk));
                }
                assert!((0.0..=100.0).contains(&assessment.overall_safety_score));

                let summary = engine.summary();
                assert!(summary.vision_entries <= 10);
                assert!(summary.obd_entries <= 10);
                assert!(summary.fatigue_entries <= 10);
                tokio::task::yield_now().await;
            }
        })
    };

    for handle in [vision, obd, fatigue, reader] {
        handle.await.unwrap();
    }

    let summary = engine.summary();
    assert_eq!(summary.vision_entries, 10);
    assert_eq!(summary.obd_entries, 10);
    assert_eq!(summary.fatigue_entries, 10);

    // Last ten fatigue scores are 90..=99
    let snapshot = engine.snapshot();
    let scores: Vec<f64> = snapshot.fatigue_data.iter().map(|s| s.fatigue_score).collect();
    assert_eq!(scores, (90..100).map(f64::from).collect::<Vec<_>>());
}

#[test]
fn test_eviction_scenario_through_engine() {
    let engine = FusionEngine::default().with_clock(Arc::new(ManualClock::new(10.0)));
    engine
        .ingest_obd(BusSample {
            speed_kmh: 130.0,
            excessive_speed: true,
            ..Default::default()
        })
        .unwrap();
    for _ in 0..10 {
        engine
            .ingest_obd(BusSample {
                speed_kmh: 40.0,
                ..Default::default()
            })
            .unwrap();
    }

    let assessment = engine.generate_assessment();
    assert_eq!(assessment.risks.aggressive_driving, 0.0);
    assert_eq!(engine.summary().obd_entries, 10);
}
