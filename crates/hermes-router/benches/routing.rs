//! Routing benchmarks.
//!
//! Run with: `cargo bench -p hermes-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hermes_router::Router;

const PROBE_METHODS: [&str; 9] = [
    "CONNECT", "DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT", "TRACE",
];

fn build_router(num_routes: usize) -> Router<String> {
    let mut router = Router::new();

    for i in 0..num_routes / 3 {
        router
            .insert("GET", &format!("/api/v1/resource{i}"), format!("getResource{i}"))
            .unwrap();
        router
            .insert(
                "GET",
                &format!("/api/v1/resource{i}/:id"),
                format!("getResourceById{i}"),
            )
            .unwrap();
        router
            .insert(
                "POST",
                &format!("/api/v1/org/:orgId/resource{i}/:id"),
                format!("postOrgResource{i}"),
            )
            .unwrap();
    }

    router
}

fn bench_static_match(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("static_match", |b| {
        b.iter(|| black_box(router.lookup("GET", "/api/v1/resource20")));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("param_match", |b| {
        b.iter(|| black_box(router.lookup("GET", "/api/v1/resource25/12345")));
    });
}

fn bench_method_probe(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("options_method_probe", |b| {
        b.iter(|| {
            let allowed: Vec<&str> = PROBE_METHODS
                .iter()
                .copied()
                .filter(|m| router.contains(m, "/api/v1/org/acme/resource5/9"))
                .collect();
            black_box(allowed)
        });
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for size in [30, 300, 3000] {
        let router = build_router(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &router, |b, router| {
            b.iter(|| black_box(router.lookup("GET", "/api/v1/resource7/abc")));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_static_match,
    bench_param_match,
    bench_method_probe,
    bench_scaling
);
criterion_main!(benches);
