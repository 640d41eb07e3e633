//! Compute side of the frame: one [`NoiseTarget`] per image dimension, picked
//! by table lookup so the dispatcher itself never branches on 2D vs 3D.

use std::num::NonZeroU64;

use crate::gpu::shader::{self, ShaderError, ShaderKind, ShaderLoader};
use crate::gpu::textures::{NoiseImage, NoiseTextures, NOISE_FORMAT};
use crate::gpu::uniforms::GpuNoiseParams;
use crate::params::NoiseParameters;
use crate::size::TextureSize;
use crate::view::{Dimension, ViewState};

/// Local work-group edge on every axis; injected into the kernels as
/// `WORK_GROUP_SIZE`.
pub const WORK_GROUP_SIZE: u32 = 8;

/// Smallest number of groups of `group` invocations that covers `size`.
pub fn workgroup_count(size: u32, group: u32) -> u32 {
    size.div_ceil(group)
}

/// Returned by [`NoiseDispatcher::dispatch`] once the compute pass has been
/// recorded. Sampling and readback take it by reference, so they can only be
/// recorded after the write, at the size that was written.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImageWritten {
    size: TextureSize,
    dimension: Dimension,
}

impl ImageWritten {
    pub fn size(&self) -> TextureSize {
        self.size
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }
}

pub(crate) trait NoiseTarget {
    fn dimension(&self) -> Dimension;

    fn program(&self) -> &ComputeProgram;

    fn workgroups(&self, edge: u32) -> [u32; 3] {
        grid(self.dimension(), edge)
    }

    /// Builds a fresh bind group for this frame and records the dispatch.
    fn dispatch(
        &self,
        pass: &mut wgpu::ComputePass<'_>,
        device: &wgpu::Device,
        params: &wgpu::Buffer,
        image: &NoiseImage,
        edge: u32,
    ) {
        let program = self.program();
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(program.label),
            layout: &program.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&image.view),
                },
            ],
        });

        let [x, y, z] = self.workgroups(edge);
        pass.set_pipeline(&program.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(x, y, z);
    }
}

fn grid(dimension: Dimension, edge: u32) -> [u32; 3] {
    let groups = workgroup_count(edge, WORK_GROUP_SIZE);
    match dimension {
        Dimension::D2 => [groups, groups, 1],
        Dimension::D3 => [groups, groups, groups],
    }
}

/// Compute pipeline plus the bind-group layout it was linked against.
pub(crate) struct ComputeProgram {
    label: &'static str,
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
}

impl ComputeProgram {
    fn new(
        device: &wgpu::Device,
        loader: &ShaderLoader,
        label: &'static str,
        file: &str,
        dimension: Dimension,
    ) -> Result<Self, ShaderError> {
        let module = loader.load(device, file, ShaderKind::Compute)?;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &layout_entries(dimension),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = shader::link(device, label, || {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            })
        })?;

        Ok(Self {
            label,
            layout,
            pipeline,
        })
    }
}

fn layout_entries(dimension: Dimension) -> [wgpu::BindGroupLayoutEntry; 2] {
    let view_dimension = match dimension {
        Dimension::D2 => wgpu::TextureViewDimension::D2,
        Dimension::D3 => wgpu::TextureViewDimension::D3,
    };
    [
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<GpuNoiseParams>() as u64),
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: NOISE_FORMAT,
                view_dimension,
            },
            count: None,
        },
    ]
}

pub(crate) struct Texture2dTarget {
    program: ComputeProgram,
}

impl Texture2dTarget {
    pub fn new(device: &wgpu::Device, loader: &ShaderLoader) -> Result<Self, ShaderError> {
        let program = ComputeProgram::new(device, loader, "noise2d", "noise2d.comp", Dimension::D2)?;
        Ok(Self { program })
    }
}

impl NoiseTarget for Texture2dTarget {
    fn dimension(&self) -> Dimension {
        Dimension::D2
    }

    fn program(&self) -> &ComputeProgram {
        &self.program
    }
}

pub(crate) struct Texture3dTarget {
    program: ComputeProgram,
}

impl Texture3dTarget {
    pub fn new(device: &wgpu::Device, loader: &ShaderLoader) -> Result<Self, ShaderError> {
        let program = ComputeProgram::new(device, loader, "noise3d", "noise3d.comp", Dimension::D3)?;
        Ok(Self { program })
    }
}

impl NoiseTarget for Texture3dTarget {
    fn dimension(&self) -> Dimension {
        Dimension::D3
    }

    fn program(&self) -> &ComputeProgram {
        &self.program
    }
}

/// Uploads the parameter block and runs the kernel for the active dimension.
pub(crate) struct NoiseDispatcher {
    targets: [Box<dyn NoiseTarget>; 2],
    params_buffer: wgpu::Buffer,
}

impl NoiseDispatcher {
    pub fn new(device: &wgpu::Device, loader: &ShaderLoader) -> Result<Self, ShaderError> {
        let targets: [Box<dyn NoiseTarget>; 2] = [
            Box::new(Texture2dTarget::new(device, loader)?),
            Box::new(Texture3dTarget::new(device, loader)?),
        ];
        debug_assert!(Dimension::ALL
            .iter()
            .all(|dimension| targets[dimension.index()].dimension() == *dimension));

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("noise params"),
            size: std::mem::size_of::<GpuNoiseParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            targets,
            params_buffer,
        })
    }

    pub fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        params: &NoiseParameters,
        view: &ViewState,
        textures: &NoiseTextures,
    ) -> ImageWritten {
        let target = &self.targets[view.dimension.index()];
        let size = textures.current_size();
        let block = GpuNoiseParams::new(params, view, size.edge());
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&block));

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("noise pass"),
                timestamp_writes: None,
            });
            target.dispatch(
                &mut pass,
                device,
                &self.params_buffer,
                textures.image(target.dimension()),
                size.edge(),
            );
        }

        ImageWritten {
            size,
            dimension: target.dimension(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_the_minimal_cover_for_every_size() {
        for size in TextureSize::ALL {
            let edge = size.edge();
            let groups = workgroup_count(edge, WORK_GROUP_SIZE);
            assert!(groups * WORK_GROUP_SIZE >= edge, "size {edge}");
            assert!((groups - 1) * WORK_GROUP_SIZE < edge, "size {edge}");
        }
    }

    #[test]
    fn uneven_sizes_round_up() {
        assert_eq!(workgroup_count(1, 8), 1);
        assert_eq!(workgroup_count(9, 8), 2);
        assert_eq!(workgroup_count(100, 16), 7);
    }

    #[test]
    fn volume_reuses_group_size_for_depth() {
        assert_eq!(grid(Dimension::D2, 128), [16, 16, 1]);
        assert_eq!(grid(Dimension::D3, 128), [16, 16, 16]);
        assert_eq!(grid(Dimension::D3, 32), [4, 4, 4]);
    }

    #[test]
    fn layouts_bind_matching_image_dimension() {
        for (dimension, expected) in [
            (Dimension::D2, wgpu::TextureViewDimension::D2),
            (Dimension::D3, wgpu::TextureViewDimension::D3),
        ] {
            let [params, image] = layout_entries(dimension);
            assert_eq!(params.binding, 0);
            assert!(matches!(
                params.ty,
                wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    ..
                }
            ));
            assert_eq!(image.binding, 1);
            match image.ty {
                wgpu::BindingType::StorageTexture {
                    access,
                    format,
                    view_dimension,
                } => {
                    assert_eq!(access, wgpu::StorageTextureAccess::WriteOnly);
                    assert_eq!(format, NOISE_FORMAT);
                    assert_eq!(view_dimension, expected);
                }
                other => panic!("unexpected binding {other:?}"),
            }
        }
    }
}
