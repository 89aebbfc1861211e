//! Routing benchmarks.
//!
//! Run with: `cargo bench -p tessera-router`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use http::Method;
use tessera_router::{RouteTarget, Router, UrlParams};

fn build_router(num_routes: usize) -> Router {
    let mut builder = Router::builder();

    for i in 0..num_routes / 2 {
        builder = builder
            .get(
                &format!("/app{i}/index"),
                RouteTarget::new(format!("app{i}"), "index", "index"),
            )
            .name(format!("app{i}.index"));
    }

    for i in 0..num_routes / 2 {
        builder = builder.get(
            &format!("/plugin{i}/items/{{id}}"),
            RouteTarget::new("api", "item", "show").in_plugin(format!("plugin{i}")),
        );
    }

    builder.build().expect("benchmark routes are valid")
}

fn bench_static_match(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("static_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/app25/index")));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("param_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/plugin25/items/12345")));
    });
}

fn bench_url_for(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("url_for", |b| {
        b.iter(|| black_box(router.url_for("app40.index", &UrlParams::none())));
    });
}

criterion_group!(benches, bench_static_match, bench_param_match, bench_url_for);
criterion_main!(benches);
