mod demos;

use anyhow::{Context, Result};
use clap::Parser;
use winit::dpi::LogicalSize;

use annulus_engine::core::{App, AppControl, FrameCtx};
use annulus_engine::device::{GpuInit, HeadlessDevice};
use annulus_engine::frame::{FrameDriver, FrameDriverConfig, FrameOutcome, Scene};
use annulus_engine::logging::{init_logging, LoggingConfig};
use annulus_engine::window::{Runtime, RuntimeConfig};
use annulus_engine::EngineError;

use demos::{Demo, DemoOptions};

/// Procedural geometry and GPU buffer layout demos.
#[derive(Debug, Parser)]
#[command(name = "annulus-studio", version)]
struct Args {
    /// Scene to run.
    #[arg(long, value_enum, default_value_t = Demo::Rings)]
    demo: Demo,

    /// Number of instances.
    #[arg(long, default_value_t = 100)]
    count: usize,

    /// Seed for instance placement. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Angular steps of ring meshes.
    #[arg(long, default_value_t = 24)]
    subdivisions: u32,

    /// Render this many frames on the headless device instead of a window.
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u64>,

    #[arg(long, default_value_t = 800.0)]
    width: f64,

    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Present without waiting for vertical sync.
    #[arg(long)]
    no_vsync: bool,

    /// Close the window after this many presented frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Log filter, `env_logger` syntax. Overrides `RUST_LOG`.
    #[arg(long)]
    log: Option<String>,
}

struct StudioApp {
    driver: FrameDriver<Box<dyn Scene>>,
    max_frames: Option<u64>,
}

impl App for StudioApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.redraw_index == 1 {
            let (w, h) = ctx.window.physical_size();
            log::debug!(
                "first redraw at {w}x{h} (aspect {:.3}) on {} as {:?}",
                ctx.window.aspect_ratio(),
                ctx.gpu.adapter_info().name,
                ctx.gpu.surface_format()
            );
        }

        match self.driver.advance_frame(&mut *ctx.gpu) {
            Ok(FrameOutcome::Presented { frame_index, .. }) => {
                if self.max_frames.is_some_and(|max| frame_index >= max) {
                    log::info!("reached {frame_index} frames");
                    return AppControl::Exit;
                }
                AppControl::Continue
            }
            Ok(FrameOutcome::Skipped) => AppControl::Continue,
            Err(EngineError::DeviceUnavailable(reason)) => {
                log::error!("device lost, closing: {reason}");
                AppControl::Exit
            }
            Err(err) => {
                log::error!("frame failed: {err}");
                AppControl::Exit
            }
        }
    }

    fn on_exit(&mut self) {
        let state = self.driver.state();
        log::info!(
            "{}: {} frames presented, final angle {:.3} rad",
            self.driver.scene().name(),
            state.frame_index,
            state.angle
        );
    }
}

fn run_headless(driver: &mut FrameDriver<Box<dyn Scene>>, frames: u64) -> Result<()> {
    let mut device = HeadlessDevice::new();
    let mut draw_calls = 0;

    for _ in 0..frames {
        if let FrameOutcome::Presented { draw_calls: n, .. } = driver.advance_frame(&mut device)? {
            draw_calls += n;
        }
    }

    let state = driver.state();
    log::info!(
        "{}: {} frames, {draw_calls} draw calls, {} buffers, final angle {:.3} rad",
        driver.scene().name(),
        state.frame_index,
        device.buffer_count(),
        state.angle
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(match &args.log {
        Some(filter) => LoggingConfig::with_filter(filter.as_str()),
        None => LoggingConfig::default(),
    });

    let options = DemoOptions { count: args.count, seed: args.seed, subdivisions: args.subdivisions };
    let scene = demos::build(args.demo, &options)
        .with_context(|| format!("failed to build the {:?} demo", args.demo))?;
    let mut driver = FrameDriver::new(FrameDriverConfig::default(), scene)?;

    if let Some(frames) = args.headless {
        return run_headless(&mut driver, frames);
    }

    let gpu_init = if args.no_vsync { GpuInit::default().without_vsync() } else { GpuInit::default() };
    let runtime = RuntimeConfig {
        title: format!("annulus studio - {}", driver.scene().name()),
        initial_size: LogicalSize::new(args.width, args.height),
    };

    Runtime::run(runtime, gpu_init, StudioApp { driver, max_frames: args.max_frames })
}
