//! GPU side of the noise pipeline.
//!
//! One frame runs compute then render inside a single command encoder:
//! - `context` owns the wgpu instance/device/surface and reconfigures the
//!   swapchain on resize.
//! - `shader` reads GLSL from disk, compiles it through naga, and turns
//!   validation failures into `ShaderError`s with bounded logs.
//! - `uniforms` holds the std140 blocks shared with the shaders.
//! - `textures` allocates the 2D and 3D `Rgba32Float` images.
//! - `dispatch` picks the 2D or 3D noise target and records the compute pass.
//!   The pass boundary orders the storage writes before any sampling.
//! - `compositor` samples the written image onto a letterboxed quad.
//! - `readback` copies an image back to the host for export.
//! - `state` glues everything together and exposes `GpuState` to `window`.

mod compositor;
mod context;
mod dispatch;
mod readback;
mod shader;
mod state;
mod textures;
mod uniforms;

pub use shader::ShaderError;

pub(crate) use dispatch::ImageWritten;
pub(crate) use state::GpuState;
