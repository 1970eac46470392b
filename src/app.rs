//! Window, event loop and frame pacing for the demo.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::DemoConfig;
use crate::error::{RenderError, RunError};
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::render_graph::FrameGraph;
use crate::scene::{Scene, build_demo_scene};

/// How often the title bar statistics refresh, in seconds.
const STATS_INTERVAL: f32 = 0.5;

/// Open a window and run the demo until it is closed.
///
/// # Example
/// ```ignore
/// penumbra::run(DemoConfig::default())?;
/// ```
pub fn run(config: DemoConfig) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PenumbraApp::Pending { config };
    event_loop.run_app(&mut app)?;
    Ok(())
}

/// Frame counter for the title bar.
#[derive(Debug)]
pub struct FrameStats {
    elapsed: f32,
    frames: u32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            frames: 0,
        }
    }

    /// Count one frame of length `dt`. Every [`STATS_INTERVAL`] seconds
    /// returns `(fps, milliseconds per frame)` and starts over.
    pub fn tick(&mut self, dt: f32) -> Option<(f32, f32)> {
        self.elapsed += dt;
        self.frames += 1;
        if self.elapsed < STATS_INTERVAL {
            return None;
        }
        let fps = self.frames as f32 / self.elapsed;
        let ms = self.elapsed * 1000.0 / self.frames as f32;
        self.elapsed = 0.0;
        self.frames = 0;
        Some((fps, ms))
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

enum PenumbraApp {
    Pending {
        config: DemoConfig,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        scene: Scene,
        graph: FrameGraph,
        input: Input,
        config: DemoConfig,
        stats: FrameStats,
        last_frame: Instant,
    },
    Failed,
}

impl PenumbraApp {
    fn start(config: DemoConfig, event_loop: &ActiveEventLoop) -> Result<Self, RenderError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.window.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.window.width,
                config.window.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| RenderError::Window(e.to_string()))?,
        );

        let gpu = GpuContext::new(window.clone(), config.window.vsync)?;
        let scene = build_demo_scene(&gpu, &config);
        let graph = FrameGraph::new(&gpu, config.shadow.clone());
        info!("Started {}x{}", gpu.width(), gpu.height());

        Ok(PenumbraApp::Running {
            window,
            gpu,
            scene,
            graph,
            input: Input::new(),
            config,
            stats: FrameStats::new(),
            last_frame: Instant::now(),
        })
    }
}

impl ApplicationHandler for PenumbraApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let PenumbraApp::Pending { config } = self else {
            return;
        };
        let config = std::mem::take(config);
        match PenumbraApp::start(config, event_loop) {
            Ok(app) => *self = app,
            Err(err) => {
                error!("Failed to start: {err}");
                *self = PenumbraApp::Failed;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let PenumbraApp::Running {
            window,
            gpu,
            scene,
            graph,
            input,
            config,
            stats,
            last_frame,
        } = self
        else {
            return;
        };

        input.handle_event(&event);
        if input.key_pressed(KeyCode::Escape) {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                debug!("Resized to {}x{}", size.width, size.height);
                gpu.resize(size.width, size.height);
                graph.resize(gpu);
                scene.camera_mut().update_projection_matrix(gpu.aspect());
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(*last_frame).as_secs_f32();
                *last_frame = now;

                scene.update(dt, input);

                match graph.render(gpu, scene) {
                    Ok(()) => {}
                    Err(RenderError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        debug!("Surface lost or outdated, reconfiguring");
                        gpu.reconfigure();
                    }
                    Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        error!("Out of GPU memory");
                        event_loop.exit();
                    }
                    Err(err) => error!("Frame failed: {err}"),
                }

                if let Some((fps, ms)) = stats.tick(dt)
                    && config.show_stats
                {
                    window.set_title(&format!(
                        "{} | FPS: {fps:.0} | Frame: {ms:.2} ms | {}x{}",
                        config.window.title,
                        gpu.width(),
                        gpu.height()
                    ));
                }

                input.begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}
