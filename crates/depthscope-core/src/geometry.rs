//! Triangle mesh geometry and a few primitive builders.

use glam::Vec3;

use crate::error::{DepthscopeError, Result};

/// Indexed triangle geometry with per-vertex normals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshGeometry {
    /// Vertex positions in local space.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals, same length as `positions`.
    pub normals: Vec<Vec3>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    /// Creates geometry from positions and triangles, computing smooth normals.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        let mut geometry = Self {
            normals: vec![Vec3::ZERO; positions.len()],
            positions,
            indices,
        };
        geometry.validate()?;
        geometry.compute_normals();
        Ok(geometry)
    }

    /// Checks index bounds, triangle count and normal count.
    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(DepthscopeError::InvalidGeometry(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if self.normals.len() != self.positions.len() {
            return Err(DepthscopeError::InvalidGeometry(format!(
                "{} normals for {} positions",
                self.normals.len(),
                self.positions.len()
            )));
        }
        if let Some(&bad) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.positions.len())
        {
            return Err(DepthscopeError::InvalidGeometry(format!(
                "index {bad} out of range for {} vertices",
                self.positions.len()
            )));
        }
        Ok(())
    }

    /// Recomputes area-weighted vertex normals from the triangles.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let face = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
            .collect();
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns true if there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Local-space bounding box, or `None` for geometry without vertices.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
        )
    }

    /// An axis-aligned box centered on the origin.
    #[must_use]
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        // Each face gets its own four vertices so normals stay flat.
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Y, Vec3::NEG_Z),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::Z, Vec3::NEG_X),
            (Vec3::Z, Vec3::Y, Vec3::NEG_X),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, up, right) in faces {
            let base = u32::try_from(positions.len()).unwrap_or(u32::MAX);
            let center = normal * h;
            let u = right * h;
            let v = up * h;
            for corner in [center - u - v, center + u - v, center + u + v, center - u + v] {
                positions.push(corner);
                normals.push(normal);
            }
            let winding_ok = (u.cross(v)).dot(normal) >= 0.0;
            if winding_ok {
                indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            } else {
                indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
            }
        }

        Self {
            positions,
            normals,
            indices,
        }
    }

    /// A rectangle in the XY plane facing +Z, centered on the origin.
    #[must_use]
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self {
            positions: vec![
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// A latitude/longitude sphere centered on the origin.
    #[must_use]
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        #[allow(clippy::cast_precision_loss)]
        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            for seg in 0..=segments {
                let theta = std::f32::consts::TAU * seg as f32 / segments as f32;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                positions.push(n * radius);
                normals.push(n);
            }
        }

        let stride = segments + 1;
        let mut indices = Vec::new();
        for ring in 0..rings {
            for seg in 0..segments {
                let a = ring * stride + seg;
                let b = a + stride;
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }

        Self {
            positions,
            normals,
            indices,
        }
    }
}
