//! Host side of the texture export: readback unpacking and the flat dump
//! format `[u32 LE edge][edge^d × RGBA8]`.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::view::Dimension;

/// Bytes per texel of the GPU image format (`Rgba32Float`).
pub const GPU_BYTES_PER_TEXEL: u32 = 16;

/// Bytes per texel in the exported dump (`RGBA8`).
pub const EXPORT_BYTES_PER_TEXEL: u32 = 4;

/// Length of the size header at the start of the dump.
pub const HEADER_BYTES: u64 = 4;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to create export directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write export file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write PNG preview {path}: {source}")]
    Png {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to map readback buffer: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("GPU readback did not complete: {0}")]
    Poll(String),
    #[error("readback returned {actual} bytes, expected at least {expected}")]
    ShortReadback { expected: usize, actual: usize },
}

/// RGBA8 pixels of one exported image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportImage {
    pub edge: u32,
    pub dimension: Dimension,
    pub pixels: Vec<u8>,
}

/// Summary returned to the caller after a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub preview: Option<PathBuf>,
}

pub fn texel_count(edge: u32, dimension: Dimension) -> u64 {
    u64::from(edge).pow(dimension.axes())
}

/// Total dump length for an image of the given edge and dimensionality.
#[cfg(test)]
pub(crate) fn dump_len(edge: u32, dimension: Dimension) -> u64 {
    HEADER_BYTES + texel_count(edge, dimension) * u64::from(EXPORT_BYTES_PER_TEXEL)
}

/// Row pitch of the readback buffer, rounded up to wgpu's copy alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * GPU_BYTES_PER_TEXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

pub fn quantize(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Strips row padding from a mapped `Rgba32Float` readback and converts each
/// component to a byte.
pub fn unpack_readback(
    raw: &[u8],
    edge: u32,
    dimension: Dimension,
    padded_row: u32,
) -> Result<Vec<u8>, ExportError> {
    let layers = if dimension.is_3d() { edge } else { 1 };
    let rows = (edge * layers) as usize;
    let padded_row = padded_row as usize;
    let row_bytes = (edge * GPU_BYTES_PER_TEXEL) as usize;
    let expected = padded_row * rows.saturating_sub(1) + row_bytes;
    if raw.len() < expected {
        return Err(ExportError::ShortReadback {
            expected,
            actual: raw.len(),
        });
    }

    let mut pixels = Vec::with_capacity(
        (texel_count(edge, dimension) * u64::from(EXPORT_BYTES_PER_TEXEL)) as usize,
    );
    for row in 0..rows {
        let start = row * padded_row;
        let texels = &raw[start..start + row_bytes];
        pixels.extend(texels.chunks_exact(4).map(|component| {
            let bytes = [component[0], component[1], component[2], component[3]];
            quantize(f32::from_le_bytes(bytes))
        }));
    }
    Ok(pixels)
}

/// Writes the size header followed by the raw pixel bytes.
pub fn write_dump(path: &Path, image: &ExportImage) -> Result<u64, ExportError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let write_err = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&image.edge.to_le_bytes())
        .map_err(write_err)?;
    writer.write_all(&image.pixels).map_err(write_err)?;
    writer.flush().map_err(write_err)?;

    Ok(HEADER_BYTES + image.pixels.len() as u64)
}

/// Saves a PNG next to the dump for 2D images. 3D images have no preview.
pub fn write_png_preview(path: &Path, image: &ExportImage) -> Result<Option<PathBuf>, ExportError> {
    if image.dimension.is_3d() {
        return Ok(None);
    }
    let preview = path.with_extension("png");
    image::save_buffer(
        &preview,
        &image.pixels,
        image.edge,
        image.edge,
        image::ExtendedColorType::Rgba8,
    )
    .map_err(|source| ExportError::Png {
        path: preview.clone(),
        source,
    })?;
    Ok(Some(preview))
}
