//! Scene rendering into the bound destination.

use depthscope_core::{Camera, DepthRange, Mat4, MeshNode, SceneGraph, Shading};

use super::{DrawUniforms, RenderEngine, TargetTextures};
use crate::buffer;
use crate::error::{RenderError, RenderResult};

/// GPU resources for one mesh draw, alive until the pass is submitted.
struct DrawCall {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    bind_group: wgpu::BindGroup,
}

fn shading_params(shading: Shading, depth: DepthRange) -> ([f32; 4], [f32; 4]) {
    let (mode, color) = match shading {
        Shading::Standard { color } => (0.0, [color.x, color.y, color.z, 1.0]),
        Shading::Depth => (1.0, [1.0; 4]),
        Shading::Mask => (2.0, [1.0; 4]),
    };
    (color, [mode, depth.near, depth.far, 0.0])
}

impl RenderEngine {
    fn bound_textures(&self) -> RenderResult<&TargetTextures> {
        match self.bound_target {
            Some(id) => self.targets.get(&id).ok_or(RenderError::UnknownTarget(id)),
            None => Ok(&self.display),
        }
    }

    fn prepare_draw(
        &self,
        world: Mat4,
        mesh: &MeshNode,
        camera: &Camera,
        depth: DepthRange,
    ) -> Option<DrawCall> {
        let geometry = &mesh.geometry;
        if geometry.is_empty() {
            return None;
        }
        let index_count = u32::try_from(geometry.indices.len()).ok()?;

        let (color, params) = shading_params(mesh.material.shading, depth);
        let uniforms = DrawUniforms {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            model: world.to_cols_array_2d(),
            color,
            params,
        };

        let vertices = buffer::interleave(geometry);
        let vertex_buffer =
            buffer::create_vertex_buffer(&self.device, &vertices, Some("mesh vertices"));
        let index_buffer =
            buffer::create_index_buffer(&self.device, &geometry.indices, Some("mesh indices"));
        let uniform_buffer =
            buffer::create_uniform_buffer(&self.device, &uniforms, Some("draw uniforms"));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw bind group"),
            layout: &self.draw_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Some(DrawCall {
            vertex_buffer,
            index_buffer,
            index_count,
            bind_group,
        })
    }

    /// Clears the bound destination and draws every mesh of the scene.
    ///
    /// Depth shading spans the scene's bounds as seen from the camera.
    /// Blocks until the device has finished the pass.
    pub(crate) fn render_scene(&self, scene: &SceneGraph, camera: &Camera) -> RenderResult<()> {
        let textures = self.bound_textures()?;
        let depth = camera.depth_range(scene.bounding_box());

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut draws = Vec::with_capacity(scene.mesh_count());
        scene.for_each_mesh(|world, mesh| {
            if let Some(draw) = self.prepare_draw(world, mesh, camera, depth) {
                draws.push(draw);
            }
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene render encoder"),
            });

        {
            let clear = self.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &textures.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(clear.x),
                            g: f64::from(clear.y),
                            b: f64::from(clear.z),
                            a: f64::from(clear.w),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &textures.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            render_pass.set_pipeline(&self.mesh_pipeline);
            for draw in &draws {
                render_pass.set_bind_group(0, &draw.bind_group, &[]);
                render_pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                render_pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        let polled = self.device.poll(wgpu::PollType::wait_indefinitely());

        // Pop before any early return so scopes never leak across renders
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            log::error!("Render pass failed: {error}");
            return Err(RenderError::Gpu(error.to_string()));
        }
        polled.map_err(|_| RenderError::Timeout)?;

        log::trace!(
            "Rendered {} meshes into {}x{} destination",
            draws.len(),
            textures.width,
            textures.height
        );
        Ok(())
    }
}
