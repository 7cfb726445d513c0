//! The headless rendering engine.

mod pipelines;
mod readback;
mod rendering;

use std::collections::HashMap;

use depthscope_core::{Camera, PixelRegion, Renderer, RowOrder, SceneGraph, Vec4};

use crate::error::{RenderError, RenderResult};

/// Color format of every target. Unorm (not sRGB) so cleared and shaded
/// values read back as the same bytes they were written with.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Depth format of every target.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Per-draw uniforms for GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x: shading selector, y: near plane, z: far plane, w: unused.
    pub params: [f32; 4],
}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            view: glam::Mat4::IDENTITY.to_cols_array_2d(),
            model: glam::Mat4::IDENTITY.to_cols_array_2d(),
            color: [1.0; 4],
            params: [0.0, 0.1, 1000.0, 0.0],
        }
    }
}

/// Handle to an offscreen target owned by a [`RenderEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHandle {
    id: u32,
    width: u32,
    height: u32,
}

impl TargetHandle {
    /// Target width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Target height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Color + depth textures backing one render destination.
pub(crate) struct TargetTextures {
    pub(crate) color: wgpu::Texture,
    pub(crate) color_view: wgpu::TextureView,
    pub(crate) depth_view: wgpu::TextureView,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl TargetTextures {
    fn new(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("target depth texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            color,
            color_view,
            depth_view,
            width,
            height,
        }
    }
}

/// The rendering engine backed by wgpu, without a window surface.
///
/// The display destination is an internal texture the size of the viewport;
/// offscreen targets are created on request and addressed by [`TargetHandle`].
pub struct RenderEngine {
    /// The wgpu instance.
    pub instance: wgpu::Instance,
    /// The wgpu adapter.
    pub adapter: wgpu::Adapter,
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    /// Mesh render pipeline.
    pub(crate) mesh_pipeline: wgpu::RenderPipeline,
    /// Per-draw bind group layout.
    pub(crate) draw_bind_group_layout: wgpu::BindGroupLayout,
    /// Display destination.
    pub(crate) display: TargetTextures,
    /// Live offscreen targets.
    pub(crate) targets: HashMap<u32, TargetTextures>,
    /// Currently bound offscreen target (`None` = display).
    pub(crate) bound_target: Option<u32>,
    /// Clear color of the next render.
    pub(crate) clear_color: Vec4,
    next_target_id: u32,
}

impl RenderEngine {
    /// Creates a new headless engine whose display destination is `width` x `height`.
    pub async fn new_headless(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTargetSize { width, height });
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::warn!("No hardware adapter ({e}), trying software fallback");
                instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::LowPower,
                        compatible_surface: None,
                        force_fallback_adapter: true,
                    })
                    .await
                    .map_err(|_| RenderError::AdapterCreationFailed)?
            }
        };
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("depthscope device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        let draw_bind_group_layout = pipelines::create_draw_bind_group_layout(&device);
        let mesh_pipeline = pipelines::create_mesh_pipeline(&device, &draw_bind_group_layout);
        let display = TargetTextures::new(&device, width, height, "display texture");

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            mesh_pipeline,
            draw_bind_group_layout,
            display,
            targets: HashMap::new(),
            bound_target: None,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            next_target_id: 1,
        })
    }

    /// Blocking variant of [`Self::new_headless`].
    pub fn new_headless_blocking(width: u32, height: u32) -> RenderResult<Self> {
        pollster::block_on(Self::new_headless(width, height))
    }

    /// Display destination size.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.display.width, self.display.height)
    }

    /// Resizes the display destination. Offscreen targets are unaffected.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("Ignoring display resize to {width}x{height}");
            return;
        }
        self.display = TargetTextures::new(&self.device, width, height, "display texture");
    }

    /// Number of live offscreen targets.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Reads the whole display destination back as RGBA8, top row first.
    pub fn read_display(&self) -> RenderResult<Vec<u8>> {
        let (width, height) = self.dimensions();
        self.read_texture(&self.display, PixelRegion::full(width, height))
    }

    fn lookup(&self, handle: &TargetHandle) -> RenderResult<&TargetTextures> {
        self.targets
            .get(&handle.id)
            .ok_or(RenderError::UnknownTarget(handle.id))
    }
}

impl Renderer for RenderEngine {
    type Target = TargetHandle;
    type Error = RenderError;

    fn create_target(&mut self, width: u32, height: u32) -> RenderResult<TargetHandle> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(RenderError::InvalidTargetSize { width, height });
        }

        let id = self.next_target_id;
        self.next_target_id = self.next_target_id.wrapping_add(1);
        self.targets.insert(
            id,
            TargetTextures::new(&self.device, width, height, "offscreen target texture"),
        );
        log::debug!("Created offscreen target {id} ({width}x{height})");
        Ok(TargetHandle { id, width, height })
    }

    fn destroy_target(&mut self, target: TargetHandle) {
        if self.bound_target == Some(target.id) {
            self.bound_target = None;
        }
        if let Some(textures) = self.targets.remove(&target.id) {
            textures.color.destroy();
            log::debug!("Destroyed offscreen target {}", target.id);
        }
    }

    fn set_render_target(&mut self, target: Option<&TargetHandle>) {
        self.bound_target = target.map(|t| t.id);
    }

    fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> RenderResult<()> {
        self.render_scene(scene, camera)
    }

    fn read_pixels(&mut self, target: &TargetHandle, region: PixelRegion) -> RenderResult<Vec<u8>> {
        let textures = self.lookup(target)?;
        self.read_texture(textures, region)
    }

    fn row_order(&self) -> RowOrder {
        // wgpu textures have a top-left origin
        RowOrder::TopDown
    }

    fn resize_display(&mut self, width: u32, height: u32) {
        self.resize(width, height);
    }
}
