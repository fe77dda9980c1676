use wgpu::{Device, Queue};

use crate::error::PipelineError;
use crate::CanvasSize;

const BYTES_PER_TEXEL: u32 = 4;

/// Bytes per row of a texture-to-buffer copy, rounded up to the copy alignment
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_TEXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Copy an RGBA8 texture back to host memory as tightly packed rows
pub fn read_texture_rgba8(
    device: &Device,
    queue: &Queue,
    texture: &wgpu::Texture,
    size: CanvasSize,
) -> Result<Vec<u8>, PipelineError> {
    let unpadded_bpr = (size.width * BYTES_PER_TEXEL) as usize;
    let padded_bpr = padded_bytes_per_row(size.width);

    let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback_staging"),
        size: padded_bpr as u64 * size.height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging_buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(size.height),
            },
        },
        wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging_buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    receiver
        .recv()
        .map_err(|_| PipelineError::Readback("map callback never ran".into()))??;

    let mut pixels = Vec::with_capacity(unpadded_bpr * size.height as usize);
    {
        let data = slice.get_mapped_range();
        for row in data.chunks_exact(padded_bpr as usize) {
            pixels.extend_from_slice(&row[..unpadded_bpr]);
        }
    }
    staging_buffer.unmap();

    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(800), 3328);
        assert_eq!(padded_bytes_per_row(1024), 4096);
    }
}
