//! Spinning wireframe model plus a pointer-following marker.
//!
//! Usage: `sparkle-demo [model.obj]`. Press Escape or close the window to quit.
//! Set `SPARKLE_VSYNC=1` to cap presentation at the display refresh rate.

mod model;
mod obj;
mod raster;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use sparkle_engine::logging::{init_logging, LoggingConfig};
use sparkle_engine::time::FrameClock;
use sparkle_engine::{
    load_text_asset, App, Context, DrawerId, EngineConfig, FramePacing, GpuInit, Rgba,
    RuntimeConfig, WindowConfig,
};

use obj::Mesh;

const DEFAULT_MODEL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/cube.obj");

/// Yaw speed in radians per second.
const SPIN: f32 = 0.9;
const PITCH: f32 = 0.45;

const FACE: Rgba = Rgba::new(24, 40, 72, 96);
const EDGE: Rgba = Rgba::opaque(120, 200, 255);
const MARKER: Rgba = Rgba::opaque(255, 170, 40);

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let path = std::env::args().nth(1).map(PathBuf::from);
    let mut mesh = load_mesh(path)?;
    model::normalize(&mut mesh);
    log::info!(
        "model: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangles.len()
    );

    let config = RuntimeConfig {
        window: WindowConfig::new("sparkle demo", 960, 640),
        engine: EngineConfig {
            clear_color: Rgba::opaque(12, 14, 22),
            update_pacing: FramePacing::per_second(240),
            ..EngineConfig::default()
        },
        gpu: GpuInit::default().with_vsync(std::env::var_os("SPARKLE_VSYNC").is_some()),
    };

    let ctx = sparkle_engine::run_app(config, Demo::new(mesh))?;
    log::info!("window closed at {}", ctx.size());
    Ok(())
}

/// Loads the model at `path`, or the bundled cube.
///
/// A missing bundled file falls back to the copy compiled into the binary.
fn load_mesh(path: Option<PathBuf>) -> Result<Mesh> {
    let (name, src) = match path {
        Some(path) => {
            let src = load_text_asset(&path)?;
            (path.display().to_string(), src)
        }
        None => match load_text_asset(DEFAULT_MODEL) {
            Ok(src) => (DEFAULT_MODEL.to_string(), src),
            Err(err) => {
                log::warn!("{err:#}; using built-in cube");
                ("built-in cube".to_string(), include_str!("../assets/cube.obj").to_string())
            }
        },
    };

    obj::parse(&src).with_context(|| format!("failed to load model {name}"))
}

struct Demo {
    mesh: Arc<Mesh>,
    /// Current yaw as `f32` bits; written by `update`, read by the drawer.
    yaw: Arc<AtomicU32>,
    clock: FrameClock,
    drawers: Vec<DrawerId>,
}

impl Demo {
    fn new(mesh: Mesh) -> Self {
        Self {
            mesh: Arc::new(mesh),
            yaw: Arc::new(AtomicU32::new(0.0f32.to_bits())),
            clock: FrameClock::new(),
            drawers: Vec::new(),
        }
    }
}

impl App for Demo {
    fn start(&mut self, ctx: &Context) {
        self.clock.reset();

        let (mesh, yaw) = (self.mesh.clone(), self.yaw.clone());
        self.drawers.push(ctx.add_drawer(move |ctx| {
            let yaw = f32::from_bits(yaw.load(Ordering::Relaxed));
            draw_model(ctx, &mesh, yaw);
        }));
        self.drawers.push(ctx.add_drawer(draw_marker));

        log::info!("registered {} drawers", self.drawers.len());
    }

    fn stop(&mut self, ctx: &Context) {
        for id in self.drawers.drain(..) {
            ctx.remove_drawer(id);
        }
        log::info!("stopped after {} updates", self.clock.frame_count());
    }

    fn update(&mut self, _ctx: &Context) {
        let dt = self.clock.tick().dt;
        let yaw = f32::from_bits(self.yaw.load(Ordering::Relaxed));
        let next = (yaw + dt * SPIN) % std::f32::consts::TAU;
        self.yaw.store(next.to_bits(), Ordering::Relaxed);
    }
}

fn draw_model(ctx: &Context, mesh: &Mesh, yaw: f32) {
    let mut buf = ctx.buffer();
    let size = buf.size();

    let projected: Vec<(f32, f32)> = mesh
        .vertices
        .iter()
        .map(|&v| model::project(model::rotate(v, yaw, PITCH), size))
        .collect();

    for &[a, b, c] in &mesh.triangles {
        let pts = [a, b, c].map(|i| projected[i as usize]);
        raster::fill_triangle(&mut buf, pts, FACE);
    }

    for (a, b) in mesh.edges() {
        let (p, q) = (projected[a as usize], projected[b as usize]);
        raster::line(&mut buf, round(p), round(q), EDGE);
    }
}

/// Small triangle pointing at the cursor.
fn draw_marker(ctx: &Context) {
    let (x, y) = (ctx.pointer_x(), ctx.pointer_y());
    let mut buf = ctx.buffer();
    raster::fill_triangle(&mut buf, [(x, y), (x + 6.0, y + 16.0), (x + 14.0, y + 9.0)], MARKER);
}

fn round((x, y): (f32, f32)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}
