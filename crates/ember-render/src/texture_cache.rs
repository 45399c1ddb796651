//! GPU texture cache keyed by resource id, with a white fallback

use crate::error::RenderError;
use ember_core::{ResourceId, ResourceRegistry};
use std::collections::HashMap;
use std::path::Path;
use wgpu::util::DeviceExt;

/// A GPU-resident texture with its view and sampler
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

pub struct TextureCache {
    textures: HashMap<ResourceId, GpuTexture>,
    /// Bound for `ResourceId::NONE` and for ids that never loaded
    pub default_white: GpuTexture,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            textures: HashMap::new(),
            default_white: Self::create_texture(device, queue, 1, 1, &[255, 255, 255, 255], "Default White"),
        }
    }

    fn create_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        rgba: &[u8],
        label: &str,
    ) -> GpuTexture {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            rgba,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        GpuTexture {
            texture,
            view,
            sampler,
        }
    }

    /// Upload raw RGBA8 pixels under an id. Replaces any previous texture.
    pub fn upload_rgba(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: ResourceId,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) {
        let label = format!("Particle Texture {}", id);
        let texture = Self::create_texture(device, queue, width, height, rgba, &label);
        self.textures.insert(id, texture);
    }

    /// Load a texture from an image file on disk.
    /// Returns Ok(true) if newly loaded, Ok(false) if already cached.
    pub fn load_file(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: ResourceId,
        path: &Path,
    ) -> Result<bool, RenderError> {
        if self.textures.contains_key(&id) {
            return Ok(false);
        }

        let img = image::open(path).map_err(|e| RenderError::TextureLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        self.upload_rgba(device, queue, id, width, height, &rgba);
        tracing::debug!(%id, path = %path.display(), width, height, "loaded particle texture");
        Ok(true)
    }

    /// Load every `.png` resource in the registry, resolved against `base_dir`.
    /// Files that fail to load are logged and left to the white fallback.
    pub fn load_registry(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        registry: &ResourceRegistry,
        base_dir: &Path,
    ) -> usize {
        let mut loaded = 0;
        for (id, path) in registry.iter() {
            if !path.ends_with(".png") {
                continue;
            }
            match self.load_file(device, queue, id, &base_dir.join(path)) {
                Ok(true) => loaded += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!("{}", e),
            }
        }
        loaded
    }

    pub fn get(&self, id: ResourceId) -> Option<&GpuTexture> {
        self.textures.get(&id)
    }

    /// The texture for `id`, or the white fallback
    pub fn get_or_default(&self, id: ResourceId) -> &GpuTexture {
        self.textures.get(&id).unwrap_or(&self.default_white)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
