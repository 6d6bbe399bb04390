//! # Frame Pacing Demo
//!
//! Drives frames through a headless render thread and prints the pacing
//! diagnostics.
//!
//! - Game thread records a clear and a vertex upload per frame
//! - Every 30th frame reads a value back with a synchronous call
//! - Present sleeps to simulate a 60 Hz vsync
//!
//! Usage: `frame_pacing_demo [config.toml]`
//! Set `RUST_LOG=debug` to see every hand-off.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use oroboros_render_queue::{
    last_error, render_thread, CommandArgs, HeadlessBackend, RenderThreadConfig, WindowId,
};
use tracing::{error, info};

/// Frames to drive.
const FRAMES: u32 = 120;
/// Simulated vsync interval.
const VSYNC: Duration = Duration::from_micros(16_667);
/// Vertices uploaded per frame.
const VERTICES_PER_FRAME: usize = 256;

static CLEARS: AtomicU64 = AtomicU64::new(0);
static VERTICES: AtomicU64 = AtomicU64::new(0);

fn clear_color(args: &CommandArgs<'_>) {
    let _rgba: [f32; 4] = args.payload();
    CLEARS.fetch_add(1, Ordering::Relaxed);
}

fn upload_vertices(args: &CommandArgs<'_>) {
    let _slot: u32 = args.payload();
    let vertices = args.blob::<[f32; 4]>();
    VERTICES.fetch_add(vertices.len() as u64, Ordering::Relaxed);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match RenderThreadConfig::from_toml_file(&path) {
            Ok(config) => config,
            Err(e) => {
                error!(%path, error = %e, "failed to load config");
                std::process::exit(1);
            }
        },
        None => RenderThreadConfig::pipelined(),
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║           FRAME PACING DEMO                                      ║");
    println!("║           ONE FRAME IN FLIGHT                                    ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("Configuration:");
    println!("  Frames:          {FRAMES}");
    println!("  Max commands:    {}", config.max_commands_per_frame);
    println!("  Max bytes:       {}", config.max_command_bytes_per_frame);
    println!("  Wait on submit:  {}", config.wait_on_submit);
    println!("  Vsync:           {VSYNC:?}");
    println!();

    let window = WindowId::new(1);
    let backend = HeadlessBackend::new().with_present_delay(VSYNC);
    let presents = backend.stats();

    if !render_thread::start(window, config, backend) {
        error!(code = %last_error(), "render thread failed to start");
        std::process::exit(1);
    }

    let mut vertices = vec![[0.0f32, 0.0, 0.0, 1.0]; VERTICES_PER_FRAME];
    let started = Instant::now();

    for frame in 0..FRAMES {
        if !render_thread::begin_frame(window) {
            error!(frame, code = %last_error(), "begin_frame failed");
            break;
        }

        let shade = frame as f32 / FRAMES as f32;
        render_thread::dispatch(clear_color, &[shade, shade, shade, 1.0f32]);

        // Mutated right after recording; the render thread sees the snapshot.
        render_thread::dispatch_blob(upload_vertices, &frame, &vertices);
        for vertex in &mut vertices {
            vertex[0] += 1.0;
        }

        if frame % 30 == 29 {
            let uploaded = render_thread::call_sync(|| VERTICES.load(Ordering::Relaxed));
            info!(frame, ?uploaded, "read back");
        }

        if !render_thread::submit_frame(window) {
            error!(frame, code = %last_error(), "submit_frame failed");
            break;
        }
    }

    render_thread::wait_idle(window);
    let elapsed = started.elapsed();

    if let Some(diagnostics) = render_thread::diagnostics(window) {
        println!("Results:");
        println!("  Elapsed:         {elapsed:?}");
        println!("  Frames:          {}", diagnostics.frames);
        println!("  Presents:        {}", presents.presents());
        println!("  Clears:          {}", CLEARS.load(Ordering::Relaxed));
        println!("  Vertices:        {}", VERTICES.load(Ordering::Relaxed));
        println!(
            "  Avg frame:       {:.3}ms",
            elapsed.as_secs_f64() * 1000.0 / f64::from(FRAMES)
        );
    }

    render_thread::stop(window);
}
