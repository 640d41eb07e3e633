use bytemuck::{Pod, Zeroable};
use winit::dpi::PhysicalSize;

use crate::params::{NoiseLayerConfig, NoiseParameters, LAYER_SLOTS};
use crate::session::Session;
use crate::view::{Dimension, ViewState};

/// One entry of the `layers[8]` array in the noise kernels' uniform block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct GpuNoiseLayer {
    pub kind: u32,
    pub seed: f32,
    pub frequency: f32,
    pub octaves: u32,
}

impl From<&NoiseLayerConfig> for GpuNoiseLayer {
    fn from(layer: &NoiseLayerConfig) -> Self {
        Self {
            kind: layer.kind.shader_id(),
            seed: layer.seed,
            frequency: layer.frequency.value() as f32,
            octaves: layer.octaves(),
        }
    }
}

/// std140 image of `NoiseParams` in `noise2d.comp` / `noise3d.comp`.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct GpuNoiseParams {
    pub layers: [GpuNoiseLayer; LAYER_SLOTS],
    pub layering: u32,
    pub size: u32,
    pub depth: u32,
    pub _padding: u32,
}

impl GpuNoiseParams {
    /// Every slot is encoded regardless of the layering mode; the kernel
    /// decides whether the secondary slots contribute.
    pub fn new(params: &NoiseParameters, view: &ViewState, edge: u32) -> Self {
        let slots = params.slots();
        Self {
            layers: std::array::from_fn(|slot| GpuNoiseLayer::from(&slots[slot])),
            layering: view.layering.shader_id(),
            size: edge,
            depth: if view.dimension.is_3d() { edge } else { 1 },
            _padding: 0,
        }
    }
}

/// std140 image of `CompositeParams` in `quad.frag`.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct CompositeUniforms {
    pub scale: [f32; 2],
    pub channel: u32,
    pub grayscale: u32,
    pub is_3d: u32,
    pub slice: f32,
    pub _padding: [f32; 2],
}

impl CompositeUniforms {
    pub fn new(session: &Session) -> Self {
        let view = &session.view;
        Self {
            // Noise images are always square.
            scale: aspect_scale(session.screen(), 1.0),
            channel: view.channel.shader_id(),
            grayscale: u32::from(view.grayscale),
            is_3d: u32::from(view.dimension == Dimension::D3),
            slice: view.slice(),
            _padding: [0.0; 2],
        }
    }
}

/// Letterbox/pillarbox factors that keep the texture's aspect ratio inside
/// the window. One axis is always `1.0`.
pub(crate) fn aspect_scale(screen: PhysicalSize<u32>, texture_aspect: f32) -> [f32; 2] {
    if screen.width == 0 || screen.height == 0 || texture_aspect <= 0.0 {
        return [1.0, 1.0];
    }
    let screen_aspect = screen.width as f32 / screen.height as f32;
    [
        (texture_aspect / screen_aspect).min(1.0),
        (screen_aspect / texture_aspect).min(1.0),
    ]
}
