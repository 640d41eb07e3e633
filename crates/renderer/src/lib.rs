//! Renderer crate for NoiseToy.
//!
//! Generates Perlin/Worley noise on the GPU and shows it through an egui
//! control panel. The overall flow of one frame is:
//!
//! ```text
//!   noisetoy CLI
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ redraw()
//!                                                            │
//!        Session (params, view, size latch) ◀── egui panel ──┤
//!                                                            ▼
//!        upload params ─▶ compute pass ─▶ composite pass ─▶ egui pass ─▶ present
//!                                                            │
//!                              pending export ◀──────────────┤
//!                              pending resize ◀──────────────┘
//! ```
//!
//! `WindowState` owns every GPU resource and the `Session`; nothing is
//! shared across threads. The noise kernels and the compositing shaders are
//! plain GLSL files read from [`RendererConfig::shader_dir`] at start-up.

mod export;
mod gpu;
mod gui;
mod params;
mod session;
mod size;
mod types;
mod view;
mod window;

use anyhow::Result;

pub use export::ExportError;
pub use gpu::ShaderError;
pub use params::{Channel, Frequency, LayerRole, NoiseKind, NoiseLayerConfig, NoiseParameters};
pub use size::TextureSize;
pub use types::{GpuPowerPreference, RendererConfig};
pub use view::{ChannelView, Dimension, LayeringMode, ViewState};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and runs until Escape or a close request.
    ///
    /// Window, adapter, device, shader, and buffer failures during start-up
    /// are returned as errors. Export failures are logged and never end the
    /// session.
    pub fn run(self) -> Result<()> {
        window::run(self.config)
    }
}
