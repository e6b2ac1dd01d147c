/// Storage format of the visualization image written by the kernel.
pub const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const FRAME_BYTES_PER_PIXEL: u32 = 4;

/// Visualization pixel for a new cell state: opaque white if alive, opaque
/// black if dead, in normalized channels.
#[inline]
pub fn visualization_sample(state: u32) -> [f32; 4] {
    let shade = state as f32;
    [shade, shade, shade, 1.0]
}

/// The same pixel after quantization to `FRAME_FORMAT`.
pub fn visualization_rgba8(state: u32) -> [u8; 4] {
    visualization_sample(state).map(|c| (c * 255.0).round() as u8)
}

/// Image the kernel writes one texel per cell into. Presenters can sample it
/// directly; `TEXTURE_BINDING` is set for that purpose.
pub fn create_frame_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Visualization Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FRAME_FORMAT,
        usage: wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

pub fn frame_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format: FRAME_FORMAT,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

/// Row pitch of a texture-to-buffer copy; wgpu requires rows aligned to
/// `COPY_BYTES_PER_ROW_ALIGNMENT`.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * FRAME_BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strips row padding from a mapped frame copy.
pub fn unpad_frame(data: &[u8], width: u32, height: u32) -> Vec<[u8; 4]> {
    let pitch = padded_bytes_per_row(width) as usize;
    let row_bytes = (width * FRAME_BYTES_PER_PIXEL) as usize;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for row in data.chunks(pitch).take(height as usize) {
        pixels.extend(
            row[..row_bytes]
                .chunks_exact(FRAME_BYTES_PER_PIXEL as usize)
                .map(|px| [px[0], px[1], px[2], px[3]]),
        );
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_opaque_black_or_white() {
        assert_eq!(visualization_sample(1), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(visualization_sample(0), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(visualization_rgba8(1), [255, 255, 255, 255]);
        assert_eq!(visualization_rgba8(0), [0, 0, 0, 255]);
    }

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
    }

    #[test]
    fn unpad_drops_row_padding() {
        let width = 3;
        let mut data = vec![9u8; 256 * 2];
        data[..12].copy_from_slice(&[1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]);
        data[256..268].copy_from_slice(&[4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 6]);
        let pixels = unpad_frame(&data, width, 2);
        assert_eq!(pixels.len(), 6);
        assert_eq!(pixels[0], [1, 1, 1, 1]);
        assert_eq!(pixels[3], [4, 4, 4, 4]);
        assert_eq!(pixels[5], [6, 6, 6, 6]);
    }
}
