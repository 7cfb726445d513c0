//! Materials bound to mesh nodes.
//!
//! Materials are shared through [`MaterialRef`] so several meshes can point at
//! the same instance. A capture compares bindings by identity, not by value.

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Shared, identity-comparable handle to a material.
pub type MaterialRef = Arc<Material>;

/// How a material shades the fragments it covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Lit surface color used for regular display rendering.
    Standard { color: Vec3 },
    /// Grayscale intensity that falls off with distance from the camera.
    Depth,
    /// Flat white wherever geometry is present.
    Mask,
}

/// A material definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name.
    pub name: String,
    /// Shading model.
    pub shading: Shading,
}

impl Material {
    /// Creates a lit material with the given base color.
    pub fn standard(name: impl Into<String>, color: Vec3) -> Self {
        Self {
            name: name.into(),
            shading: Shading::Standard { color },
        }
    }

    /// Creates the orange material shown while a model is still loading.
    #[must_use]
    pub fn loading_placeholder() -> Self {
        Self::standard("loading", Vec3::new(1.0, 0.647, 0.0))
    }

    /// Wraps the material in a shareable handle.
    #[must_use]
    pub fn into_ref(self) -> MaterialRef {
        Arc::new(self)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::standard("default", Vec3::splat(0.8))
    }
}

/// How captured pixels are turned into depth values.
///
/// Exactly one mode is active per pipeline; it picks both the substitute
/// material and the normalization rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingMode {
    /// `red / 255` of a grayscale depth rendering.
    RawLuma,
    /// `1.0` where the red channel is nonzero, else `0.0`.
    #[default]
    BinaryMask,
}

impl EncodingMode {
    /// Builds the substitute material bound to every mesh during a capture.
    #[must_use]
    pub fn depth_material(self) -> MaterialRef {
        let material = match self {
            EncodingMode::RawLuma => Material {
                name: "depth-luma".to_string(),
                shading: Shading::Depth,
            },
            EncodingMode::BinaryMask => Material {
                name: "depth-mask".to_string(),
                shading: Shading::Mask,
            },
        };
        material.into_ref()
    }

    /// Returns display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EncodingMode::RawLuma => "raw-luma",
            EncodingMode::BinaryMask => "binary-mask",
        }
    }
}
