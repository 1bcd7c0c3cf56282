use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::sync::Arc;
use tour_marketplace::router::{Location, Router};

// Benchmark route matching against mixed static and parameterized patterns
pub fn router_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_matching");

    let patterns = vec![
        "/",
        "/tours",
        "/destinations",
        "/about",
        "/login",
        "/dashboard",
        "/company/:id",
    ];

    // Current paths the site actually sees: the static pages plus company
    // detail pages with varying identifiers
    let mut paths: Vec<String> = vec![
        "/".to_string(),
        "/tours".to_string(),
        "/destinations".to_string(),
        "/about".to_string(),
        "/login".to_string(),
        "/dashboard".to_string(),
    ];
    for i in 0..100 {
        paths.push(format!("/company/company{}", i));
    }

    for path_count in [10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(path_count),
            path_count,
            |b, &path_count| {
                b.iter(|| {
                    let location = Arc::new(Location::new());
                    let router = Router::new(Arc::clone(&location));
                    let mut rng = thread_rng();

                    // Simulate a navigation followed by page selection: every
                    // path change re-matches each registered pattern
                    for _ in 0..path_count {
                        let path = paths.choose(&mut rng).unwrap();
                        router.navigate(path);

                        for pattern in &patterns {
                            black_box(router.match_route(pattern));
                        }
                        black_box(router.current_page());
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, router_benchmark);
criterion_main!(benches);
