//! Model sources.
//!
//! [`ProceduralModels`] builds stand-in scenes for the default catalog from
//! primitives so the inspector runs without asset files. [`SceneLibrary`]
//! serves prebuilt scenes by id.

use std::collections::HashMap;
use std::sync::Arc;

use depthscope_core::{
    DepthscopeError, Material, MaterialRef, MeshGeometry, Result, SceneGraph, SceneNode, Vec3,
};

use crate::host::ModelSource;

/// Builds a scene for each id of the default catalog.
#[derive(Debug, Default)]
pub struct ProceduralModels;

impl ProceduralModels {
    /// Creates the source.
    pub fn new() -> Self {
        Self
    }
}

impl ModelSource for ProceduralModels {
    fn load(&mut self, model_id: &str) -> Result<SceneGraph> {
        match model_id {
            "/low-poly_test_dummy.glb" => Ok(low_poly_dummy()),
            "/medieval_combat_dummy.glb" => Ok(combat_dummy()),
            "/tunnergp.glb" => Ok(tunner()),
            other => Err(DepthscopeError::ModelLoadFailed {
                model_id: other.to_string(),
                reason: "no procedural stand-in for this model".into(),
            }),
        }
    }
}

fn boxed(name: &str, size: Vec3, at: Vec3, material: &MaterialRef) -> SceneNode {
    SceneNode::mesh(name, Arc::new(MeshGeometry::cuboid(size)), Arc::clone(material)).at(at)
}

fn low_poly_dummy() -> SceneGraph {
    let skin = Material::standard("dummy", Vec3::new(0.85, 0.75, 0.6)).into_ref();
    let body = SceneNode::group("low-poly dummy")
        .with_child(boxed("torso", Vec3::new(1.2, 1.6, 0.6), Vec3::new(0.0, 2.6, 0.0), &skin))
        .with_child(
            SceneNode::mesh(
                "head",
                Arc::new(MeshGeometry::uv_sphere(0.45, 12, 8)),
                Arc::clone(&skin),
            )
            .at(Vec3::new(0.0, 3.9, 0.0)),
        )
        .with_child(boxed("left arm", Vec3::new(0.35, 1.5, 0.35), Vec3::new(-0.85, 2.6, 0.0), &skin))
        .with_child(boxed("right arm", Vec3::new(0.35, 1.5, 0.35), Vec3::new(0.85, 2.6, 0.0), &skin))
        .with_child(boxed("left leg", Vec3::new(0.45, 1.8, 0.45), Vec3::new(-0.35, 0.9, 0.0), &skin))
        .with_child(boxed("right leg", Vec3::new(0.45, 1.8, 0.45), Vec3::new(0.35, 0.9, 0.0), &skin));
    SceneGraph::with_root(body)
}

fn combat_dummy() -> SceneGraph {
    let wood = Material::standard("wood", Vec3::new(0.55, 0.36, 0.2)).into_ref();
    let straw = Material::standard("straw", Vec3::new(0.9, 0.8, 0.45)).into_ref();
    let dummy = SceneNode::group("combat dummy")
        .with_child(boxed("base", Vec3::new(1.6, 0.2, 1.6), Vec3::new(0.0, 0.1, 0.0), &wood))
        .with_child(boxed("post", Vec3::new(0.25, 4.0, 0.25), Vec3::new(0.0, 2.0, 0.0), &wood))
        .with_child(boxed("crossbar", Vec3::new(2.6, 0.25, 0.25), Vec3::new(0.0, 3.0, 0.0), &wood))
        .with_child(boxed("body", Vec3::new(1.1, 1.4, 0.7), Vec3::new(0.0, 2.6, 0.0), &straw))
        .with_child(
            SceneNode::mesh(
                "head",
                Arc::new(MeshGeometry::uv_sphere(0.5, 16, 10)),
                Arc::clone(&straw),
            )
            .at(Vec3::new(0.0, 4.1, 0.0)),
        );
    SceneGraph::with_root(dummy)
}

fn tunner() -> SceneGraph {
    let paint = Material::standard("paint", Vec3::new(0.8, 0.1, 0.1)).into_ref();
    let rubber = Material::standard("rubber", Vec3::splat(0.1)).into_ref();
    let wheel = Arc::new(MeshGeometry::uv_sphere(0.45, 16, 8));

    let mut car = SceneNode::group("tunner")
        .with_child(boxed("chassis", Vec3::new(4.2, 0.7, 1.9), Vec3::new(0.0, 0.8, 0.0), &paint))
        .with_child(boxed("cabin", Vec3::new(2.0, 0.6, 1.6), Vec3::new(-0.2, 1.45, 0.0), &paint));
    for (name, x, z) in [
        ("front left wheel", 1.4, 0.95),
        ("front right wheel", 1.4, -0.95),
        ("rear left wheel", -1.4, 0.95),
        ("rear right wheel", -1.4, -0.95),
    ] {
        car = car.with_child(
            SceneNode::mesh(name, Arc::clone(&wheel), Arc::clone(&rubber)).at(Vec3::new(x, 0.45, z)),
        );
    }
    SceneGraph::with_root(car)
}

/// Serves prebuilt scenes by model id.
#[derive(Debug, Default, Clone)]
pub struct SceneLibrary {
    scenes: HashMap<String, SceneGraph>,
}

impl SceneLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the scene for `model_id`, replacing any previous one.
    pub fn insert(&mut self, model_id: impl Into<String>, scene: SceneGraph) {
        self.scenes.insert(model_id.into(), scene);
    }

    /// Returns true if a scene is registered for `model_id`.
    pub fn contains(&self, model_id: &str) -> bool {
        self.scenes.contains_key(model_id)
    }
}

impl ModelSource for SceneLibrary {
    fn load(&mut self, model_id: &str) -> Result<SceneGraph> {
        self.scenes
            .get(model_id)
            .cloned()
            .ok_or_else(|| DepthscopeError::ModelLoadFailed {
                model_id: model_id.to_string(),
                reason: "not in library".into(),
            })
    }
}
