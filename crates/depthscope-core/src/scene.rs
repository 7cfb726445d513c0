//! Scene graph owned by the scene host.
//!
//! A tree of nodes with local transforms. Leaf meshes bind geometry to a
//! material. Mesh enumeration is depth-first pre-order and stable for an
//! unchanged tree, which is what lets a capture restore bindings by position.

use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::geometry::MeshGeometry;
use crate::material::{Material, MaterialRef};

/// A renderable mesh binding.
#[derive(Debug, Clone)]
pub struct MeshNode {
    /// Shared geometry.
    pub geometry: Arc<MeshGeometry>,
    /// Bound material.
    pub material: MaterialRef,
    /// Whether the mesh casts shadows.
    pub cast_shadow: bool,
    /// Whether the mesh receives shadows.
    pub receive_shadow: bool,
}

impl MeshNode {
    /// Creates a mesh node with shadows enabled.
    pub fn new(geometry: Arc<MeshGeometry>, material: MaterialRef) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: true,
            receive_shadow: true,
        }
    }
}

/// What a node carries besides its children.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Pure transform node.
    Group,
    /// Drawable mesh.
    Mesh(MeshNode),
}

/// A node in the scene graph.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Node name.
    pub name: String,
    /// Transform relative to the parent.
    pub transform: Mat4,
    /// Node payload.
    pub kind: NodeKind,
    /// Child nodes.
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Creates an empty group node.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            kind: NodeKind::Group,
            children: Vec::new(),
        }
    }

    /// Creates a mesh node.
    pub fn mesh(name: impl Into<String>, geometry: Arc<MeshGeometry>, material: MaterialRef) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            kind: NodeKind::Mesh(MeshNode::new(geometry, material)),
            children: Vec::new(),
        }
    }

    /// Sets the local transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the local transform to a translation.
    #[must_use]
    pub fn at(self, translation: Vec3) -> Self {
        self.with_transform(Mat4::from_translation(translation))
    }

    /// Appends a child node.
    #[must_use]
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the mesh payload, if any.
    pub fn as_mesh(&self) -> Option<&MeshNode> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }

    fn visit<F: FnMut(Mat4, &MeshNode)>(&self, parent: Mat4, f: &mut F) {
        let world = parent * self.transform;
        if let NodeKind::Mesh(mesh) = &self.kind {
            f(world, mesh);
        }
        for child in &self.children {
            child.visit(world, f);
        }
    }

    fn visit_mut<F: FnMut(&mut MeshNode)>(&mut self, f: &mut F) {
        if let NodeKind::Mesh(mesh) = &mut self.kind {
            f(mesh);
        }
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }
}

/// The scene: a forest of root nodes.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    /// Root nodes.
    pub roots: Vec<SceneNode>,
}

impl SceneGraph {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scene with a single root.
    pub fn with_root(root: SceneNode) -> Self {
        Self { roots: vec![root] }
    }

    /// The scene shown while a model is loading: a unit orange cube.
    #[must_use]
    pub fn loading_placeholder() -> Self {
        Self::with_root(SceneNode::mesh(
            "loading",
            Arc::new(MeshGeometry::cuboid(Vec3::ONE)),
            Material::loading_placeholder().into_ref(),
        ))
    }

    /// Adds a root node.
    pub fn add(&mut self, node: SceneNode) {
        self.roots.push(node);
    }

    /// Visits every mesh with its world transform, depth-first pre-order.
    pub fn for_each_mesh<F: FnMut(Mat4, &MeshNode)>(&self, mut f: F) {
        for root in &self.roots {
            root.visit(Mat4::IDENTITY, &mut f);
        }
    }

    /// Visits every mesh mutably, in the same order as [`Self::for_each_mesh`].
    pub fn for_each_mesh_mut<F: FnMut(&mut MeshNode)>(&mut self, mut f: F) {
        for root in &mut self.roots {
            root.visit_mut(&mut f);
        }
    }

    /// Number of mesh nodes.
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.for_each_mesh(|_, _| count += 1);
        count
    }

    /// Returns true if the scene has no nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Material handles of every mesh, in enumeration order.
    pub fn material_bindings(&self) -> Vec<MaterialRef> {
        let mut bindings = Vec::new();
        self.for_each_mesh(|_, mesh| bindings.push(Arc::clone(&mesh.material)));
        bindings
    }

    /// World-space bounding box over all meshes.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let mut bounds: Option<(Vec3, Vec3)> = None;
        self.for_each_mesh(|world, mesh| {
            for p in &mesh.geometry.positions {
                let w = world.transform_point3(*p);
                bounds = Some(match bounds {
                    Some((min, max)) => (min.min(w), max.max(w)),
                    None => (w, w),
                });
            }
        });
        bounds
    }
}
