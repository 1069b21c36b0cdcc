//! Performance benchmarks for review recalculation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use review_pipeline::metrics::MetricsCollector;
use review_pipeline::review::{InMemoryReviewStore, NoOpNotifier, ReviewService};
use review_pipeline::{
    recalculate, Application, ApplicationStatus, EligibilityEngine, EngineConfig, Rating,
    Reviewer, Round0Decision,
};
use std::sync::Arc;

fn create_bench_system(applications: usize) -> ReviewService {
    let service = ReviewService::new(
        Arc::new(InMemoryReviewStore::new()),
        EligibilityEngine::default(),
        Arc::new(NoOpNotifier),
        Arc::new(MetricsCollector::new().unwrap()),
    )
    .with_progress_interval(usize::MAX);

    service
        .register_reviewer(Reviewer::new("gate", "Gate", "gate@example.org").with_rounds(true, true, true))
        .unwrap();
    service
        .register_reviewer(Reviewer::new("second", "Second", "second@example.org"))
        .unwrap();

    for i in 0..applications {
        let app = service
            .submit_application(Application::new(
                format!("applicant {}", i),
                format!("applicant{}@example.org", i),
            ))
            .unwrap();
        service
            .record_round0_decision("gate", app.id, Round0Decision::Yes)
            .unwrap();
        let first = Rating::new(((i % 10) + 1) as f64).unwrap();
        service
            .record_round1_rating("gate", app.id, first, None)
            .unwrap();
        service
            .record_round1_rating("second", app.id, Rating::new(9.0).unwrap(), None)
            .unwrap();
    }

    service
}

fn bench_single_recalculation(c: &mut Criterion) {
    let config = EngineConfig::default();
    let round0 = [Round0Decision::No, Round0Decision::Yes];
    let round1 = [Rating::new(5.0).unwrap(), Rating::new(9.0).unwrap()];
    let round2 = [Rating::new(7.5).unwrap()];

    c.bench_function("recalculate_single_application", |b| {
        b.iter(|| {
            black_box(recalculate(
                black_box(ApplicationStatus::Regular),
                black_box(&round0),
                black_box(&round1),
                black_box(&round2),
                &config,
            ))
        })
    });
}

fn bench_record_rating(c: &mut Criterion) {
    let service = create_bench_system(1);
    let app = service.applications().unwrap().remove(0);
    let rating = Rating::new(6.5).unwrap();

    c.bench_function("record_round1_rating", |b| {
        b.iter(|| black_box(service.record_round1_rating("second", app.id, rating, None)))
    });
}

fn bench_recalculate_all(c: &mut Criterion) {
    let service = create_bench_system(500);

    c.bench_function("recalculate_all_500_applications", |b| {
        b.iter(|| black_box(service.recalculate_all()))
    });
}

criterion_group!(
    benches,
    bench_single_recalculation,
    bench_record_rating,
    bench_recalculate_all
);
criterion_main!(benches);
