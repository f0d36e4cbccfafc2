//! Benchmark tests for vidlay-core operations
//!
//! Run with: cargo bench -p vidlay-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use vidlay_core::config::{resolve, ConfigOverride, TokenOverride};
use vidlay_core::testing::{FakeContent, FakeSurface};
use vidlay_core::token::{contains_token, split_tokens};
use vidlay_core::types::{format_time, ClickTarget, MediaEvent, Viewport};
use vidlay_core::{PlayerConfig, PlayerController, TokenPipeline};

// ============================================================================
// Helpers
// ============================================================================

fn article(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| {
            if i % 4 == 0 {
                format!(
                    r#"<p>Paragraph {i} [[video src="/media/{i}.mp4" autoplay="{}"]] end.</p>"#,
                    i % 8 == 0
                )
            } else {
                format!("<p>Paragraph {i} with [[brackets]] but no player in it.</p>")
            }
        })
        .collect()
}

fn global_layer() -> ConfigOverride {
    ConfigOverride::from_json(
        r#"{
            "autoplay": false,
            "loop": true,
            "aspectInitial": "16:7",
            "aspectInitialMobile": "9:10",
            "clickToPlay": { "aspectActive": "16:9", "aspectActiveMobile": "4:5" }
        }"#,
    )
    .unwrap()
}

// ============================================================================
// Token Benchmarks
// ============================================================================

fn bench_token_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_scan");

    for paragraphs in [10, 100, 1000] {
        let input = article(paragraphs);
        group.bench_with_input(BenchmarkId::new("split", paragraphs), &input, |b, input| {
            b.iter(|| split_tokens(black_box(input)))
        });
        group.bench_with_input(BenchmarkId::new("contains", paragraphs), &input, |b, input| {
            b.iter(|| contains_token(black_box(input)))
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let runs: Vec<String> = (0..50).map(|i| article(i % 5 + 1)).collect();
    let pipeline = TokenPipeline::new(global_layer());

    c.bench_function("pipeline_expand_50_runs", |b| {
        b.iter(|| {
            let refs: Vec<&str> = runs.iter().map(String::as_str).collect();
            let mut content = FakeContent::new(&refs);
            pipeline.expand(black_box(&mut content)).report
        })
    });
}

// ============================================================================
// Config Benchmarks
// ============================================================================

fn bench_resolve(c: &mut Criterion) {
    let global = global_layer();
    let caller = ConfigOverride::from_json(r#"{ "muted": false }"#).unwrap();
    let token = TokenOverride {
        autoplay: Some(true),
        sound: Some(false),
    };

    c.bench_function("config_resolve", |b| {
        b.iter(|| resolve(black_box(&global), black_box(&caller), Some(&token)))
    });

    let config = resolve(&global, &caller, None);
    c.bench_function("config_aspect_for", |b| {
        b.iter(|| config.aspect_for(black_box(Viewport::Mobile), black_box(true)))
    });
}

// ============================================================================
// Controller Benchmarks
// ============================================================================

fn bench_controller(c: &mut Criterion) {
    c.bench_function("controller_timeupdate", |b| {
        let mut controller =
            PlayerController::mount(FakeSurface::new(), PlayerConfig::default()).unwrap();
        b.iter(|| {
            controller.surface_mut().media.current_time += 0.25;
            controller.on_media_event(black_box(MediaEvent::TimeUpdate));
        })
    });

    c.bench_function("controller_click_toggle", |b| {
        let mut controller =
            PlayerController::mount(FakeSurface::new(), PlayerConfig::default()).unwrap();
        b.iter(|| {
            controller.on_wrapper_click(black_box(ClickTarget::Body));
            controller.surface_mut().feedback.clear();
        })
    });

    c.bench_function("format_time", |b| b.iter(|| format_time(black_box(3725.8))));
}

criterion_group!(
    benches,
    bench_token_scan,
    bench_pipeline,
    bench_resolve,
    bench_controller,
);

criterion_main!(benches);
