use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info, trace};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use super::app::{App, AppControl};
use super::event::{EventQueue, HostEvent};
use crate::device::{Gpu, GpuInit, SurfaceDevice};
use crate::frame::{FrameContext, FrameOutcome};
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Presentation ring depth; 2 gives classic double buffering.
    pub buffer_count: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            title: "cadence".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
            buffer_count: 2,
        }
    }
}

const EVENT_QUEUE_CAPACITY: usize = 64;

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs the host until close or a fatal device failure.
    pub fn run<A>(config: HostConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = HostState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct HostState<A: App> {
    config: HostConfig,
    gpu_init: GpuInit,
    app: A,

    window: Option<Arc<Window>>,
    frames: Option<FrameContext<SurfaceDevice>>,
    events: EventQueue,
    clock: FrameClock,

    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl<A: App> HostState<A> {
    fn new(config: HostConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            window: None,
            frames: None,
            events: EventQueue::new(EVENT_QUEUE_CAPACITY),
            clock: FrameClock::default(),
            exit_requested: false,
            failure: None,
        }
    }

    fn fatal(&mut self, err: anyhow::Error, event_loop: &ActiveEventLoop) {
        error!("{err:#}");
        self.failure = Some(err);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn setup(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu = pollster::block_on(Gpu::new(Arc::clone(&window), self.gpu_init.clone()))
            .context("GPU initialization failed")?;
        let size = gpu.size();

        let frames = FrameContext::new(
            SurfaceDevice::new(gpu),
            self.config.buffer_count,
            size.width,
            size.height,
        )
        .context("failed to create frame context")?;

        info!(
            "host ready: {}x{}, ring of {}",
            size.width, size.height, self.config.buffer_count
        );

        self.window = Some(window);
        self.frames = Some(frames);
        self.clock.reset();
        Ok(())
    }

    /// Orderly shutdown: drain in-flight GPU work, then release the frame
    /// context and window. Nothing is dropped while a fence is outstanding.
    fn shutdown(&mut self) {
        if let Some(frames) = self.frames.as_mut() {
            if let Err(err) = frames.drain() {
                error!("shutdown drain failed: {err}");
            }
        }
        self.frames = None;
        self.window = None;
        self.exit_requested = true;
        info!("host shut down");
    }

    fn render(&mut self, event_loop: &ActiveEventLoop) {
        let Some(frames) = self.frames.as_mut() else {
            return;
        };

        let time = self.clock.tick();
        let color = self.app.clear_color(time);

        match frames.render_frame(color) {
            Ok(FrameOutcome::Rendered { fence_value, waited }) => {
                trace!("frame {}: fence value {fence_value}, waited {waited}", time.frame_index);
                if time.frame_index > 0 && time.frame_index % 300 == 0 {
                    debug!("frame {}: {:.1} fps", time.frame_index, 1.0 / time.dt);
                }
            }
            Ok(FrameOutcome::Skipped) => {
                trace!("frame {} skipped (zero-sized drawable)", time.frame_index);
            }
            Err(err) => {
                self.fatal(
                    anyhow::Error::new(err).context("per-frame device failure"),
                    event_loop,
                );
            }
        }
    }

    fn drain_events(&mut self, event_loop: &ActiveEventLoop) {
        while let Some(event) = self.events.pop() {
            if self.app.on_event(&event) == AppControl::Exit {
                self.shutdown();
                event_loop.exit();
                return;
            }

            match event {
                HostEvent::Redraw => self.render(event_loop),
                HostEvent::Resized { width, height } => {
                    let Some(frames) = self.frames.as_mut() else {
                        continue;
                    };
                    if let Err(err) = frames.resize(width, height) {
                        self.fatal(
                            anyhow::Error::new(err).context("resize failed"),
                            event_loop,
                        );
                        return;
                    }
                }
                HostEvent::CloseRequested => {
                    self.shutdown();
                    event_loop.exit();
                    return;
                }
            }

            if self.exit_requested {
                event_loop.exit();
                return;
            }
        }
    }
}

impl<A: App> ApplicationHandler for HostState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.setup(event_loop) {
            self.fatal(err, event_loop);
            return;
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Translation only; dispatch happens in about_to_wait so the frame
        // loop always runs from a single pull point.
        match event {
            WindowEvent::RedrawRequested => self.events.push(HostEvent::Redraw),
            WindowEvent::Resized(size) => self.events.push(HostEvent::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.events.push(HostEvent::Resized {
                        width: size.width,
                        height: size.height,
                    });
                }
            }
            WindowEvent::CloseRequested => self.events.push(HostEvent::CloseRequested),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        self.drain_events(event_loop);
        if self.exit_requested {
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; the FIFO present mode paces the loop.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
