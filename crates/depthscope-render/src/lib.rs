//! Rendering backend for depthscope.
//!
//! This crate provides the wgpu-based implementation of
//! [`depthscope_core::Renderer`], including:
//! - Headless device setup with a software fallback
//! - Offscreen target management
//! - Mesh rendering with standard, depth and mask shading (WGSL)
//! - Synchronous pixel readback
//! - Grayscale raster construction and PNG encoding

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Casts between GPU-facing integer and float types are intentional here
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod buffer;
pub mod engine;
pub mod error;
pub mod raster;

pub use buffer::MeshVertex;
pub use engine::{DrawUniforms, RenderEngine, TargetHandle, DEPTH_FORMAT, TARGET_FORMAT};
pub use error::{RenderError, RenderResult};
pub use raster::{encode_png, grayscale_raster, value_to_byte};
