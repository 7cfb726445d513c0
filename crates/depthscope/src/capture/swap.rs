//! Scoped material substitution.

use std::sync::Arc;

use depthscope_core::{MaterialRef, SceneGraph};

/// Binding state of one mesh before the swap.
#[derive(Debug, Clone)]
struct SavedBinding {
    material: MaterialRef,
    cast_shadow: bool,
    receive_shadow: bool,
}

/// Binds a substitute material to every mesh of a scene and puts the
/// originals back when restored or dropped.
///
/// Shadow casting and receiving are disabled while the swap is held.
/// Bindings are recorded and restored in mesh enumeration order.
pub struct MaterialSwap<'a> {
    scene: &'a mut SceneGraph,
    saved: Vec<SavedBinding>,
    restored: bool,
}

impl<'a> MaterialSwap<'a> {
    /// Records every binding of `scene` and substitutes `material`.
    pub fn apply(scene: &'a mut SceneGraph, material: &MaterialRef) -> Self {
        let mut saved = Vec::with_capacity(scene.mesh_count());
        scene.for_each_mesh_mut(|mesh| {
            saved.push(SavedBinding {
                material: Arc::clone(&mesh.material),
                cast_shadow: mesh.cast_shadow,
                receive_shadow: mesh.receive_shadow,
            });
            mesh.material = Arc::clone(material);
            mesh.cast_shadow = false;
            mesh.receive_shadow = false;
        });
        log::trace!("Swapped {} mesh materials to {}", saved.len(), material.name);
        Self {
            scene,
            saved,
            restored: false,
        }
    }

    /// The scene with the substitute bound.
    pub fn scene(&self) -> &SceneGraph {
        self.scene
    }

    /// Number of swapped meshes.
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    /// Returns true if the scene had no meshes.
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    /// Restores the original bindings now. Returns the number restored.
    pub fn restore(mut self) -> usize {
        self.restore_bindings()
    }

    fn restore_bindings(&mut self) -> usize {
        if self.restored {
            return 0;
        }
        self.restored = true;

        let current = self.scene.mesh_count();
        if current != self.saved.len() {
            log::warn!(
                "Scene changed during capture: {} meshes recorded, {} present",
                self.saved.len(),
                current
            );
        }

        let mut saved = self.saved.drain(..);
        let mut count = 0;
        self.scene.for_each_mesh_mut(|mesh| {
            if let Some(binding) = saved.next() {
                mesh.material = binding.material;
                mesh.cast_shadow = binding.cast_shadow;
                mesh.receive_shadow = binding.receive_shadow;
                count += 1;
            }
        });
        log::trace!("Restored {count} mesh materials");
        count
    }
}

impl Drop for MaterialSwap<'_> {
    fn drop(&mut self) {
        self.restore_bindings();
    }
}
