use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::gpu::{GpuState, ImageWritten};
use crate::gui::{FrameStats, Gui};
use crate::session::Session;
use crate::types::RendererConfig;

/// Opens the window and drives frames until the session asks to exit.
pub(crate) fn run(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = NoiseToyApp {
        config,
        state: None,
        fatal: None,
    };
    event_loop
        .run_app(&mut app)
        .context("event loop exited with an error")?;

    match app.fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct NoiseToyApp {
    config: RendererConfig,
    state: Option<WindowState>,
    fatal: Option<anyhow::Error>,
}

impl NoiseToyApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!(error = %format!("{err:#}"), "stopping");
        self.fatal = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for NoiseToyApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match WindowState::create(event_loop, &self.config) {
            Ok(state) => self.state = Some(state),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if let Err(err) = state.handle_event(event) {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        if state.session.exit_requested() {
            info!("exit requested; closing window");
            event_loop.exit();
        } else {
            state.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.state = None;
    }
}

/// Everything the open window owns. `gpu` is declared first so the surface
/// is dropped before the window it was created from.
struct WindowState {
    gpu: GpuState,
    gui: Gui,
    window: Arc<Window>,
    session: Session,
    adapter: String,
    export_path: PathBuf,
    export_png: bool,
}

impl WindowState {
    fn create(event_loop: &ActiveEventLoop, config: &RendererConfig) -> Result<Self> {
        let (width, height) = config.window_size;
        let attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(width, height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );

        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size, config)?;
        let gui = Gui::new(&window, gpu.device(), gpu.surface_format());
        let profile = gpu.adapter_profile();
        let adapter = format!("{} ({:?})", profile.name, profile.backend);
        info!(
            adapter = %adapter,
            width = size.width,
            height = size.height,
            "window ready"
        );

        let session = Session::new(config.params.clone(), config.view, config.texture_size, size);
        Ok(Self {
            gpu,
            gui,
            window,
            session,
            adapter,
            export_path: config.export_path.clone(),
            export_png: config.export_png,
        })
    }

    fn handle_event(&mut self, event: WindowEvent) -> Result<()> {
        let consumed = self.gui.on_window_event(&self.window, &event);
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.session.request_exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if !consumed => {
                self.session.request_exit();
            }
            WindowEvent::Resized(new_size) => {
                self.gpu.resize(new_size);
                self.session.screen_resized(new_size);
            }
            WindowEvent::RedrawRequested => {
                self.redraw()?;
            }
            _ => {}
        }
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let stats = FrameStats {
            frame_time: self.gpu.frame_time(),
            adapter: self.adapter.clone(),
        };
        let gui_frame = self.gui.prepare(&self.window, &mut self.session, &stats);

        match self.gpu.render(&self.session, &mut self.gui, gui_frame) {
            Ok(written) => {
                if self.session.take_export_request() {
                    self.export(&written);
                }
                self.gpu.apply_pending_size(&mut self.session);
                Ok(())
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("surface out of memory")),
            Err(err) => {
                warn!(error = %err, "surface error; retrying next frame");
                Ok(())
            }
        }
    }

    fn export(&self, written: &ImageWritten) {
        match self.gpu.export(written, &self.export_path, self.export_png) {
            Ok(report) => info!(
                path = %report.path.display(),
                bytes = report.bytes_written,
                size = %written.size(),
                dimension = ?written.dimension(),
                preview = ?report.preview,
                "exported noise texture"
            ),
            Err(err) => error!(
                error = %err,
                path = %self.export_path.display(),
                "export failed; continuing"
            ),
        }
    }
}
