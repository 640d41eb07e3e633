use std::path::PathBuf;

use crate::params::NoiseParameters;
use crate::size::TextureSize;
use crate::view::ViewState;

/// Power preference forwarded to adapter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Summary of the selected adapter, kept for logging and the stats overlay.
#[derive(Debug, Clone)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    pub(crate) fn from_wgpu(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors the merged config file and CLI flags: where the
/// shaders live, where exports go, and the state the session starts from.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub window_size: (u32, u32),
    /// Window title.
    pub title: String,
    /// Directory holding `noise2d.comp`, `noise3d.comp`, `quad.vert`, `quad.frag`.
    pub shader_dir: PathBuf,
    /// Texture edge allocated at start-up.
    pub texture_size: TextureSize,
    /// Destination of the binary dump.
    pub export_path: PathBuf,
    /// Also write a PNG preview for 2D exports.
    pub export_png: bool,
    /// Present with vsync (`Fifo`) instead of the lowest-latency mode.
    pub vsync: bool,
    pub gpu_power: GpuPowerPreference,
    /// Starting noise layers.
    pub params: NoiseParameters,
    /// Starting display state.
    pub view: ViewState,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_size: (800, 800),
            title: "NoiseToy".to_string(),
            shader_dir: PathBuf::from("shaders"),
            texture_size: TextureSize::default(),
            export_path: PathBuf::from("output/out.dat"),
            export_png: false,
            vsync: false,
            gpu_power: GpuPowerPreference::default(),
            params: NoiseParameters::default(),
            view: ViewState::default(),
        }
    }
}
