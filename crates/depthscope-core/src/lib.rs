//! Core abstractions for depthscope.
//!
//! This crate provides the renderer-agnostic pieces of the inspector:
//! - [`SceneGraph`] of mesh nodes bound to shared [`Material`]s
//! - [`Camera`] parameters
//! - [`ModelSelector`] over a [`ModelCatalog`]
//! - [`CaptureConfig`] for the depth-capture pipeline
//! - [`ExportArtifact`] values and the [`ExportSink`]s that persist them
//! - the [`Renderer`] trait implemented by rendering backends

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod camera;
pub mod error;
pub mod export;
pub mod geometry;
pub mod material;
pub mod options;
pub mod renderer;
pub mod scene;
pub mod selector;

pub use camera::{Camera, DepthRange};
pub use error::{DepthscopeError, Result};
pub use export::{
    decode_numeric_array, encode_numeric_array, ArtifactFormat, ExportArtifact, ExportSink,
    FileSink, MemorySink,
};
pub use geometry::MeshGeometry;
pub use material::{EncodingMode, Material, MaterialRef, Shading};
pub use options::{CaptureConfig, CapturePreset, DEFAULT_ARRAY_FILENAME, DEFAULT_RASTER_FILENAME};
pub use renderer::{PixelRegion, RowOrder, Renderer};
pub use scene::{MeshNode, NodeKind, SceneGraph, SceneNode};
pub use selector::{
    default_catalog, DragPayload, ModelCatalog, ModelEntry, ModelSelector, SelectionChanged,
    DEFAULT_MODELS,
};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec3, Vec4};
