use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{RenderError, RenderResult};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// A sampleable 2D texture.
///
/// Textures are caller-owned values; the renderer's slot table keeps
/// only cheap view clones for the duration of a batch sequence, so a
/// texture may be dropped once no flush still references it. GPU
/// resources are released on drop.
pub struct Texture {
    id: u64,
    view: wgpu::TextureView,
    texture: wgpu::Texture,
    width: u32,
    height: u32,
    channels: u32,
}

impl Texture {
    /// Creates a texture from decoded pixel data.
    ///
    /// `channels` may be 1 (grayscale), 3 (RGB) or 4 (RGBA); 1- and
    /// 3-channel data is expanded to RGBA on upload since wgpu has no
    /// packed 24-bit format.
    pub fn from_pixels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
        channels: u32,
    ) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidArguments(format!(
                "texture dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = (width * height * channels) as usize;
        if pixels.len() < expected {
            return Err(RenderError::InvalidArguments(format!(
                "pixel buffer holds {} bytes, {expected} required",
                pixels.len()
            )));
        }

        let rgba: Vec<u8> = match channels {
            4 => pixels[..expected].to_vec(),
            3 => pixels[..expected]
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            1 => pixels[..expected]
                .iter()
                .flat_map(|&g| [g, g, g, 255])
                .collect(),
            n => {
                return Err(RenderError::InvalidArguments(format!(
                    "unsupported channel count {n} (expected 1, 3 or 4)"
                )));
            }
        };

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("quill texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            texture.as_image_copy(),
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            view,
            texture,
            width,
            height,
            channels,
        })
    }

    /// Decodes compressed image bytes (PNG/JPEG) and uploads the result.
    pub fn from_encoded(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
    ) -> RenderResult<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| RenderError::ResourceCreation(format!("image decode failed: {e}")))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_pixels(device, queue, rgba.as_raw(), width, height, 4)
    }

    /// The 1x1 opaque white texture bound to every slot by default.
    pub(crate) fn default_white(device: &wgpu::Device, queue: &wgpu::Queue) -> RenderResult<Self> {
        Self::from_pixels(device, queue, &[255, 255, 255, 255], 1, 1, 4)
    }

    /// Process-unique identity, used for idempotent slot registration.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn size(&self) -> wgpu::Extent3d {
        self.texture.size()
    }
}
