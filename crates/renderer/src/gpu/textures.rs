use crate::size::TextureSize;
use crate::view::Dimension;

pub(crate) const NOISE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

pub(crate) struct NoiseImage {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl NoiseImage {
    fn new(device: &wgpu::Device, edge: u32, dimension: Dimension) -> Self {
        let (label, size, texture_dimension, view_dimension) = match dimension {
            Dimension::D2 => (
                "noise image 2d",
                wgpu::Extent3d {
                    width: edge,
                    height: edge,
                    depth_or_array_layers: 1,
                },
                wgpu::TextureDimension::D2,
                wgpu::TextureViewDimension::D2,
            ),
            Dimension::D3 => (
                "noise image 3d",
                wgpu::Extent3d {
                    width: edge,
                    height: edge,
                    depth_or_array_layers: edge,
                },
                wgpu::TextureDimension::D3,
                wgpu::TextureViewDimension::D3,
            ),
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: texture_dimension,
            format: NOISE_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(view_dimension),
            ..Default::default()
        });
        Self { texture, view }
    }
}

/// The 2D and cubic 3D noise images. Both always share one edge length.
pub(crate) struct NoiseTextures {
    size: TextureSize,
    images: [NoiseImage; 2],
}

impl NoiseTextures {
    pub fn new(device: &wgpu::Device, size: TextureSize) -> Self {
        Self {
            size,
            images: allocate(device, size),
        }
    }

    pub fn current_size(&self) -> TextureSize {
        self.size
    }

    pub fn image(&self, dimension: Dimension) -> &NoiseImage {
        &self.images[dimension.index()]
    }

    /// Reallocates both images at `size`, discarding their contents. Only
    /// the end-of-frame hook calls this, once the frame's work is submitted.
    pub fn resize(&mut self, device: &wgpu::Device, size: TextureSize) -> bool {
        if size == self.size {
            return false;
        }
        tracing::info!(from = %self.size, to = %size, "reallocating noise textures");
        self.images = allocate(device, size);
        self.size = size;
        true
    }
}

fn allocate(device: &wgpu::Device, size: TextureSize) -> [NoiseImage; 2] {
    let edge = size.edge();
    Dimension::ALL.map(|dimension| NoiseImage::new(device, edge, dimension))
}
