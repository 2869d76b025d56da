use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use progressive_fractal::controllers::interactive::ports::presentation_sink::PresentationSink;
use progressive_fractal::core::actions::render_surface::render_surface_parallel;
use progressive_fractal::core::actions::render_tile::render_tile;
use progressive_fractal::core::data::render_params::{
    FractalType, JuliaParams, RenderMode, RenderParameters,
};
use progressive_fractal::core::data::tile::Tile;
use progressive_fractal::core::data::viewport::Viewport;
use progressive_fractal::{CanvasCompositor, PoolConfig, RenderOrchestrator, RendererConfig};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

fn viewport() -> Viewport {
    Viewport::mandelbrot_default(WIDTH, HEIGHT).unwrap()
}

fn params(max_iterations: u32) -> RenderParameters {
    RenderParameters::new(max_iterations, FractalType::Mandelbrot).unwrap()
}

fn bench_tile(c: &mut Criterion) {
    let viewport = viewport();
    let tile = Tile::new(128, 96, 64, 64);
    let mut group = c.benchmark_group("render_tile");

    for max_iterations in [100, 500, 1000] {
        let params = params(max_iterations);
        group.bench_with_input(
            BenchmarkId::from_parameter(max_iterations),
            &params,
            |b, params| b.iter(|| render_tile(black_box(tile), &viewport, params).unwrap()),
        );
    }

    group.finish();
}

fn bench_surface(c: &mut Criterion) {
    let viewport = viewport();
    let params = params(500);

    c.bench_function("render_surface_parallel_320x240", |b| {
        b.iter(|| render_surface_parallel(black_box(&viewport), &params))
    });
}

fn bench_progressive(c: &mut Criterion) {
    let compositor = Arc::new(CanvasCompositor::new(WIDTH, HEIGHT));
    let config = RendererConfig {
        pool: PoolConfig::default(),
        ..RendererConfig::default()
    };
    let renderer = RenderOrchestrator::new(
        config,
        Arc::clone(&compositor) as Arc<dyn PresentationSink>,
        None,
    )
    .unwrap();
    let viewport = viewport();
    let params = params(500);

    c.bench_function("progressive_render_320x240", |b| {
        b.iter(|| {
            renderer.start_render(viewport, params, RenderMode::Mandelbrot, JuliaParams::default());
            assert!(renderer.wait_idle(Duration::from_secs(60)));
        })
    });
}

criterion_group!(benches, bench_tile, bench_surface, bench_progressive);
criterion_main!(benches);
