//! CPU renderer used by the integration tests.
//!
//! Each mesh is drawn as the screen-space rectangle of its projected world
//! bounding box. Rows are stored bottom-up, like a GL framebuffer, so the
//! pipeline's flip is exercised.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use depthscope::{
    Camera, DepthRange, Material, MeshGeometry, PixelRegion, Renderer, RowOrder, SceneGraph, SceneNode,
    Shading, Vec3, Vec4,
};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SoftwareError(pub String);

#[derive(Debug, Clone)]
struct Canvas {
    width: u32,
    height: u32,
    /// RGBA8, bottom row first.
    data: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        }
    }

    fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Sets a pixel addressed from the top-left corner.
    fn put(&mut self, x: u32, y_top: u32, rgba: [u8; 4]) {
        let row = self.height - 1 - y_top;
        let i = ((row * self.width + x) * 4) as usize;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub struct SoftwareRenderer {
    display: Canvas,
    targets: HashMap<u32, Canvas>,
    bound: Option<u32>,
    clear: Vec4,
    next_id: u32,
    /// Number of `render` calls.
    pub render_calls: usize,
    /// Number of `render` calls that went to an offscreen target.
    pub offscreen_renders: usize,
    /// Makes every `render` fail.
    pub fail_render: bool,
    /// Drops the last pixel of every readback.
    pub short_readback: bool,
    /// Called at the start of every `render`.
    pub on_render: Option<Box<dyn FnMut()>>,
    /// Material names seen on meshes during the last render.
    pub last_materials: Vec<String>,
    /// Shadow flags seen on meshes during the last render.
    pub last_shadow_flags: Vec<(bool, bool)>,
}

impl SoftwareRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            display: Canvas::new(width, height),
            targets: HashMap::new(),
            bound: None,
            clear: Vec4::new(0.0, 0.0, 0.0, 1.0),
            next_id: 0,
            render_calls: 0,
            offscreen_renders: 0,
            fail_render: false,
            short_readback: false,
            on_render: None,
            last_materials: Vec::new(),
            last_shadow_flags: Vec::new(),
        }
    }

    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    pub fn bound_target(&self) -> Option<u32> {
        self.bound
    }

    fn shade(shading: Shading, camera: &Camera, depth: DepthRange, center: Vec3) -> [u8; 4] {
        match shading {
            Shading::Standard { color } => [to_byte(color.x), to_byte(color.y), to_byte(color.z), 255],
            Shading::Depth => {
                let luma = to_byte(1.0 - depth.normalize(camera.view_depth(center)));
                [luma, luma, luma, 255]
            }
            Shading::Mask => [255, 255, 255, 255],
        }
    }
}

impl Renderer for SoftwareRenderer {
    type Target = u32;
    type Error = SoftwareError;

    fn create_target(&mut self, width: u32, height: u32) -> Result<u32, SoftwareError> {
        self.next_id += 1;
        self.targets.insert(self.next_id, Canvas::new(width, height));
        Ok(self.next_id)
    }

    fn destroy_target(&mut self, target: u32) {
        if self.bound == Some(target) {
            self.bound = None;
        }
        self.targets.remove(&target);
    }

    fn set_render_target(&mut self, target: Option<&u32>) {
        self.bound = target.copied();
    }

    fn clear_color(&self) -> Vec4 {
        self.clear
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.clear = color;
    }

    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), SoftwareError> {
        if let Some(mut hook) = self.on_render.take() {
            hook();
            self.on_render = Some(hook);
        }
        self.render_calls += 1;
        if self.bound.is_some() {
            self.offscreen_renders += 1;
        }

        self.last_materials.clear();
        self.last_shadow_flags.clear();
        scene.for_each_mesh(|_, mesh| {
            self.last_materials.push(mesh.material.name.clone());
            self.last_shadow_flags
                .push((mesh.cast_shadow, mesh.receive_shadow));
        });

        if self.fail_render {
            return Err(SoftwareError("injected render failure".into()));
        }

        let clear = [
            to_byte(self.clear.x),
            to_byte(self.clear.y),
            to_byte(self.clear.z),
            to_byte(self.clear.w),
        ];
        let canvas = match self.bound {
            Some(id) => self
                .targets
                .get_mut(&id)
                .ok_or_else(|| SoftwareError(format!("unknown target {id}")))?,
            None => &mut self.display,
        };
        canvas.fill(clear);

        let view_proj = camera.view_projection_matrix();
        let depth = camera.depth_range(scene.bounding_box());
        let (w, h) = (canvas.width as f32, canvas.height as f32);
        scene.for_each_mesh(|world, mesh| {
            let Some((min, max)) = mesh.geometry.bounding_box() else {
                return;
            };
            let mut lo = glam::Vec2::splat(f32::INFINITY);
            let mut hi = glam::Vec2::splat(f32::NEG_INFINITY);
            for i in 0..8 {
                let corner = Vec3::new(
                    if i & 1 == 0 { min.x } else { max.x },
                    if i & 2 == 0 { min.y } else { max.y },
                    if i & 4 == 0 { min.z } else { max.z },
                );
                let clip = view_proj * world.transform_point3(corner).extend(1.0);
                if clip.w <= 0.0 {
                    return;
                }
                let ndc = clip.truncate() / clip.w;
                // Screen space with y growing downwards
                let screen = glam::Vec2::new((ndc.x * 0.5 + 0.5) * w, (0.5 - ndc.y * 0.5) * h);
                lo = lo.min(screen);
                hi = hi.max(screen);
            }

            let center = world.transform_point3((min + max) * 0.5);
            let rgba = Self::shade(mesh.material.shading, camera, depth, center);
            for y in 0..canvas.height {
                let cy = y as f32 + 0.5;
                if cy < lo.y || cy > hi.y {
                    continue;
                }
                for x in 0..canvas.width {
                    let cx = x as f32 + 0.5;
                    if cx >= lo.x && cx <= hi.x {
                        canvas.put(x, y, rgba);
                    }
                }
            }
        });
        Ok(())
    }

    fn read_pixels(&mut self, target: &u32, region: PixelRegion) -> Result<Vec<u8>, SoftwareError> {
        let canvas = self
            .targets
            .get(target)
            .ok_or_else(|| SoftwareError(format!("unknown target {target}")))?;
        if !region.fits(canvas.width, canvas.height) {
            return Err(SoftwareError("region out of bounds".into()));
        }
        let mut out = Vec::with_capacity(region.byte_len());
        for row in region.y..region.y + region.height {
            let start = ((row * canvas.width + region.x) * 4) as usize;
            out.extend_from_slice(&canvas.data[start..start + (region.width * 4) as usize]);
        }
        if self.short_readback {
            out.truncate(out.len().saturating_sub(4));
        }
        Ok(out)
    }

    fn row_order(&self) -> RowOrder {
        RowOrder::BottomUp
    }
}

/// A mesh node with a standard material named `name`.
pub fn colored_box(name: &str, size: Vec3, at: Vec3, color: Vec3) -> SceneNode {
    SceneNode::mesh(
        name,
        Arc::new(MeshGeometry::cuboid(size)),
        Material::standard(name, color).into_ref(),
    )
    .at(at)
}

/// A camera looking down -Z from `distance` with a square aspect.
pub fn front_camera(distance: f32) -> Camera {
    let mut camera = Camera::new(1.0);
    camera.position = Vec3::new(0.0, 0.0, distance);
    camera.target = Vec3::ZERO;
    camera
}
