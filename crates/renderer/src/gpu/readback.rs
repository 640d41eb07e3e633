use std::sync::mpsc;

use crate::export::{padded_bytes_per_row, unpack_readback, ExportError, ExportImage};
use crate::gpu::dispatch::ImageWritten;
use crate::gpu::textures::NoiseTextures;

/// Copies the image named by `written` into a host-visible buffer, waits for
/// the GPU, and converts it to RGBA8.
pub(crate) fn read_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    textures: &NoiseTextures,
    written: &ImageWritten,
) -> Result<ExportImage, ExportError> {
    let edge = written.size().edge();
    let dimension = written.dimension();
    let layers = if dimension.is_3d() { edge } else { 1 };
    let padded_row = padded_bytes_per_row(edge);
    let image = textures.image(dimension);

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("export readback"),
        size: u64::from(padded_row) * u64::from(edge) * u64::from(layers),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("export readback"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &image.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(edge),
            },
        },
        wgpu::Extent3d {
            width: edge,
            height: edge,
            depth_or_array_layers: layers,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device
        .poll(wgpu::PollType::Wait)
        .map_err(|err| ExportError::Poll(err.to_string()))?;
    receiver
        .recv()
        .map_err(|_| ExportError::Poll("map callback was dropped".to_string()))??;

    let pixels = {
        let mapped = slice.get_mapped_range();
        unpack_readback(&mapped, edge, dimension, padded_row)
    };
    buffer.unmap();

    Ok(ExportImage {
        edge,
        dimension,
        pixels: pixels?,
    })
}
