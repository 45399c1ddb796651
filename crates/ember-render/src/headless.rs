//! Offscreen particle canvas
//!
//! Renders one prepared particle frame into a texture and reads it back as an
//! RGBA image. Nothing is presented; the CLI saves the image as a PNG.

use crate::error::RenderError;
use crate::gpu_buffers::WgpuParticleGraphics;
use crate::particle_renderer::ParticleRenderer;
use ember_scene::Camera;
use std::sync::Arc;

/// Colour target format. The pipelines are built against it.
pub const CANVAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

const CANVAS_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Transparent, so the saved image only carries what the particles cover
pub const PARTICLE_CLEAR: wgpu::Color = wgpu::Color::TRANSPARENT;

const BYTES_PER_PIXEL: u32 = 4;

/// Pixel dimensions of the canvas. Both sides are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    width: u32,
    height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyCanvas { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Match the camera's viewport to the canvas so particles keep their shape
    pub fn fit_camera(self, camera: &mut Camera) {
        camera.set_aspect(self.aspect());
    }

    fn extent(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }

    fn row_bytes(self) -> u32 {
        self.width * BYTES_PER_PIXEL
    }

    /// Texture-to-buffer copies need rows aligned to 256 bytes
    fn padded_row_bytes(self) -> u32 {
        self.row_bytes().next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
    }
}

/// Drop the copy alignment padding at the end of each row
fn unpad_rows(data: &[u8], size: CanvasSize) -> Vec<u8> {
    let row = size.row_bytes() as usize;
    data.chunks(size.padded_row_bytes() as usize)
        .take(size.height as usize)
        .flat_map(|padded| &padded[..row])
        .copied()
        .collect()
}

fn canvas_texture(
    device: &wgpu::Device,
    label: &str,
    size: CanvasSize,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: size.extent(),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}

/// GPU device plus the colour and depth targets particles are drawn into.
///
/// Device and queue are shared with [`WgpuParticleGraphics`], which writes
/// emitter buffers from the simulation side.
pub struct HeadlessContext {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    size: CanvasSize,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

impl HeadlessContext {
    /// Pick an adapter and allocate the canvas, blocking until both are ready
    pub fn new(size: CanvasSize) -> Result<Self, RenderError> {
        pollster::block_on(Self::create(size))
    }

    async fn create(size: CanvasSize) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterNotFound)?;
        let info = adapter.get_info();

        let descriptor = wgpu::DeviceDescriptor {
            label: Some("Ember Particle Canvas"),
            ..Default::default()
        };
        let (device, queue) = adapter
            .request_device(&descriptor, None)
            .await
            .map_err(|e| RenderError::DeviceCreation(e.to_string()))?;

        let color = canvas_texture(
            &device,
            "Particle Canvas Color",
            size,
            CANVAS_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let depth = canvas_texture(
            &device,
            "Particle Canvas Depth",
            size,
            CANVAS_DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let color_view = color.create_view(&Default::default());
        let depth_view = depth.create_view(&Default::default());

        tracing::info!(
            adapter = %info.name,
            backend = ?info.backend,
            width = size.width,
            height = size.height,
            "particle canvas ready"
        );

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            size,
            color,
            color_view,
            depth_view,
        })
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    /// Buffer backend on this context's device
    pub fn particle_graphics(&self) -> WgpuParticleGraphics {
        WgpuParticleGraphics::new(self.device.clone(), self.queue.clone())
    }

    /// Renderer whose pipelines target the canvas format
    pub fn particle_renderer(&self) -> ParticleRenderer {
        ParticleRenderer::new(&self.device, CANVAS_FORMAT)
    }

    /// Draw the renderer's prepared frame and read the result back
    pub fn capture(
        &self,
        renderer: &ParticleRenderer,
        graphics: &WgpuParticleGraphics,
    ) -> Result<image::RgbaImage, RenderError> {
        renderer.render_to_view(
            &self.device,
            &self.queue,
            &self.color_view,
            &self.depth_view,
            graphics,
            PARTICLE_CLEAR,
        );
        let pixels = self.read_back()?;
        image::RgbaImage::from_raw(self.size.width, self.size.height, pixels)
            .ok_or_else(|| RenderError::BufferReadFailed("pixel buffer does not match canvas size".into()))
    }

    fn read_back(&self) -> Result<Vec<u8>, RenderError> {
        let padded_row_bytes = self.size.padded_row_bytes();
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Canvas Readback"),
            size: u64::from(padded_row_bytes) * u64::from(self.size.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Canvas Copy"),
        });
        encoder.copy_texture_to_buffer(
            self.color.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: Some(self.size.height),
                },
            },
            self.size.extent(),
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?
            .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?;

        let pixels = unpad_rows(&slice.get_mapped_range(), self.size);
        staging.unmap();
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_canvas_rejected() {
        assert!(matches!(
            CanvasSize::new(0, 64),
            Err(RenderError::EmptyCanvas { width: 0, height: 64 })
        ));
        assert!(CanvasSize::new(64, 0).is_err());
        assert!(CanvasSize::new(1, 1).is_ok());
    }

    #[test]
    fn test_rows_pad_to_copy_alignment() {
        let narrow = CanvasSize::new(100, 2).unwrap();
        assert_eq!(narrow.row_bytes(), 400);
        assert_eq!(narrow.padded_row_bytes(), 512);

        let aligned = CanvasSize::new(64, 2).unwrap();
        assert_eq!(aligned.padded_row_bytes(), 256);
    }

    #[test]
    fn test_unpad_rows_keeps_pixels_in_order() {
        let size = CanvasSize::new(3, 2).unwrap();
        let padded = size.padded_row_bytes() as usize;
        let mut data = vec![0xEEu8; padded * 2];
        for (row, start) in [0usize, padded].into_iter().enumerate() {
            for i in 0..12 {
                data[start + i] = (row * 12 + i) as u8;
            }
        }

        let pixels = unpad_rows(&data, size);
        assert_eq!(pixels.len(), 24);
        assert_eq!(pixels, (0u8..24).collect::<Vec<_>>());
    }

    #[test]
    fn test_camera_follows_canvas_aspect() {
        let size = CanvasSize::new(512, 1024).unwrap();
        let mut camera = Camera::default();
        size.fit_camera(&mut camera);
        assert_eq!(camera.aspect(), 0.5);
        assert_eq!(size.aspect(), 0.5);
    }

    #[test]
    fn test_clear_is_transparent() {
        assert_eq!(PARTICLE_CLEAR.a, 0.0);
        assert!(CANVAS_FORMAT.is_srgb());
    }
}
