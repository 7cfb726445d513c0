//! Synchronous pixel readback.

use depthscope_core::PixelRegion;

use super::{RenderEngine, TargetTextures};
use crate::error::{RenderError, RenderResult};

/// Row pitch of a staging copy, padded to `COPY_BYTES_PER_ROW_ALIGNMENT`.
pub(crate) fn aligned_bytes_per_row(width: u32) -> u32 {
    let bytes_per_pixel = 4u32; // RGBA8
    let unaligned = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Drops the padding at the end of each staged row.
pub(crate) fn strip_row_padding(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row_bytes = width as usize * 4;
    let mut result = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * padded_row as usize;
        result.extend_from_slice(&data[start..start + row_bytes]);
    }
    result
}

impl RenderEngine {
    /// Copies `region` of a target through a staging buffer and blocks until
    /// the bytes are available. Returns exactly `width * height * 4` bytes,
    /// top row first.
    pub(crate) fn read_texture(
        &self,
        textures: &TargetTextures,
        region: PixelRegion,
    ) -> RenderResult<Vec<u8>> {
        if !region.fits(textures.width, textures.height) {
            return Err(RenderError::RegionOutOfBounds {
                width: textures.width,
                height: textures.height,
            });
        }
        if region.width == 0 || region.height == 0 {
            return Ok(Vec::new());
        }

        let bytes_per_row = aligned_bytes_per_row(region.width);
        let buffer_size = u64::from(bytes_per_row) * u64::from(region.height);

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback staging buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback copy encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &textures.color,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x,
                    y: region.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(region.height),
                },
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let polled = self.device.poll(wgpu::PollType::wait_indefinitely());

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            log::error!("Readback failed: {error}");
            return Err(RenderError::Gpu(error.to_string()));
        }
        polled.map_err(|_| RenderError::Timeout)?;

        rx.recv()
            .map_err(|_| RenderError::BufferMapFailed)?
            .map_err(|_| RenderError::BufferMapFailed)?;

        let data = buffer_slice.get_mapped_range();
        let result = strip_row_padding(&data, region.width, region.height, bytes_per_row);
        drop(data);
        buffer.unmap();

        Ok(result)
    }
}
