use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rankwatch_core::{Category, DomainMap, PageSnapshot, ScrapeConfig, assets, extract_period, render_text, segment};

fn bench_render_text(c: &mut Criterion) {
    let apps = std::fs::read_to_string("../../tests/fixtures/apps.html").unwrap();
    let models = std::fs::read_to_string("../../tests/fixtures/models.html").unwrap();

    let mut group = c.benchmark_group("render_text");

    group.bench_with_input(BenchmarkId::new("apps", "5 rows"), &apps, |b, html| {
        b.iter(|| render_text(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("models", "5 rows"), &models, |b, html| {
        b.iter(|| render_text(black_box(html)))
    });

    group.finish();
}

fn bench_link_assets(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/apps.html").unwrap();

    c.bench_function("link_assets", |b| b.iter(|| assets::extract(black_box(&html), 20, 1000)));
}

fn bench_segment(c: &mut Criterion) {
    let text = std::fs::read_to_string("../../tests/fixtures/apps.txt").unwrap();

    c.bench_function("segment", |b| b.iter(|| segment(black_box(&text), "Top Apps", 10, 20)));
}

fn bench_extract_period(c: &mut Criterion) {
    let apps = PageSnapshot::new(
        std::fs::read_to_string("../../tests/fixtures/apps.html").unwrap(),
        std::fs::read_to_string("../../tests/fixtures/apps.txt").unwrap(),
    );
    let models = PageSnapshot::new(
        std::fs::read_to_string("../../tests/fixtures/models.html").unwrap(),
        std::fs::read_to_string("../../tests/fixtures/models.txt").unwrap(),
    );
    let app_config = ScrapeConfig::for_category(Category::App);
    let model_config = ScrapeConfig::for_category(Category::Model);
    let domains = DomainMap::builtin();

    let mut group = c.benchmark_group("extract_period");

    group.bench_with_input(BenchmarkId::new("apps", "combined"), &apps, |b, snapshot| {
        b.iter(|| extract_period(black_box(snapshot), &app_config, &domains, "Today"))
    });

    group.bench_with_input(BenchmarkId::new("models", "combined"), &models, |b, snapshot| {
        b.iter(|| extract_period(black_box(snapshot), &model_config, &domains, "Top today"))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_render_text,
    bench_link_assets,
    bench_segment,
    bench_extract_period
);
criterion_main!(benches);
