use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, StartCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::{translate_window_event, InputState};
use crate::schedule::FrameRequests;
use crate::time::Timeline;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "ionview".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the viewer window and runs `app` until it exits or the window closes.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    frames: FrameRequests,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    timeline: Timeline,

    entry: Option<WindowEntry>,
    stopped: bool,
    error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            timeline: Timeline::new(),
            entry: None,
            stopped: false,
            error: None,
        }
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        WindowEntryTryBuilder {
            input_state: InputState::default(),
            frames: FrameRequests::new(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")
    }

    /// Gives the app a chance to withdraw pending frames, then exits the loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.stop_app();
        event_loop.exit();
    }

    fn stop_app(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        let (app, entry) = (&mut self.app, &mut self.entry);
        if let Some(entry) = entry {
            entry.with_frames_mut(|frames| app.on_stop(frames));
        }
    }

    fn request_redraw_if_pending(&self) {
        if let Some(entry) = self.entry.as_ref() {
            if entry.borrow_frames().is_pending() {
                entry.borrow_window().request_redraw();
            }
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.stopped {
            return;
        }

        let entry = match self.create_window_entry(event_loop) {
            Ok(entry) => entry,
            Err(e) => {
                log::error!("failed to create viewer window: {e:#}");
                self.error = Some(e);
                self.stopped = true;
                event_loop.exit();
                return;
            }
        };
        self.entry = Some(entry);

        let (app, entry) = (&mut self.app, &mut self.entry);
        let mut control = AppControl::Continue;
        if let Some(entry) = entry {
            entry.with_mut(|fields| {
                let mut ctx = StartCtx {
                    window: WindowCtx {
                        id: fields.window.id(),
                        window: fields.window,
                    },
                    gpu: fields.gpu,
                    frames: fields.frames,
                };
                control = app.on_start(&mut ctx);
            });
        }

        if control == AppControl::Exit {
            self.shutdown(event_loop);
            return;
        }

        self.request_redraw_if_pending();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Redraws are requested explicitly after each delivered frame.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.stopped {
            return;
        }

        let mut control = AppControl::Continue;
        {
            // Split borrows to avoid `self` capture inside `ouroboros` closures.
            let (app, entry) = (&mut self.app, &mut self.entry);
            let Some(entry) = entry else { return };

            entry.with_mut(|fields| {
                if let Some(ev) = translate_window_event(fields.window.scale_factor(), fields.input_state, &event) {
                    fields.input_state.apply_event(&ev);
                    control = app.on_input(&ev, fields.input_state);
                }
            });
        }

        if control == AppControl::Exit {
            self.shutdown(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested");
                self.shutdown(event_loop);
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let (app, entry) = (&mut self.app, &mut self.entry);
                if let Some(entry) = entry {
                    entry.with_mut(|fields| {
                        let new_size = fields.window.inner_size();
                        if fields.gpu.resize(new_size) {
                            let window = WindowCtx {
                                id: window_id,
                                window: fields.window,
                            };
                            app.on_resize(&window, fields.gpu);
                        }
                    });
                }
                self.request_redraw_if_pending();
            }

            WindowEvent::RedrawRequested => {
                let timestamp_ms = self.timeline.now_ms();

                let (app, entry) = (&mut self.app, &mut self.entry);
                if let Some(entry) = entry {
                    entry.with_mut(|fields| {
                        // Redraws not backed by a frame request (expose, resize) are skipped.
                        if fields.frames.take_pending().is_none() {
                            return;
                        }

                        let mut ctx = FrameCtx {
                            window: WindowCtx {
                                id: window_id,
                                window: fields.window,
                            },
                            gpu: fields.gpu,
                            input: fields.input_state,
                            timestamp_ms,
                            frames: fields.frames,
                        };
                        control = app.on_frame(&mut ctx);
                    });
                }

                if control == AppControl::Exit {
                    self.shutdown(event_loop);
                    return;
                }

                self.request_redraw_if_pending();
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.stop_app();
        // Drop GPU objects before the window.
        self.entry = None;
    }
}
