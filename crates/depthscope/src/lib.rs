//! depthscope: a 3D scene inspector with depth-map capture.
//!
//! Pick a model, look at it, and capture the current view as a depth map:
//! a JSON array of normalized values (`depth-map.json`) and a grayscale
//! PNG (`depth-map.png`).
//!
//! # Quick Start
//!
//! ```no_run
//! use depthscope::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let config = CapturePreset::BinaryMask.config(512, 512);
//!     let mut inspector = headless_inspector(config, "out")?;
//!     inspector.select_model("Medieval Combat Dummy")?;
//!     inspector.tick()?;
//!     let capture = inspector.capture()?;
//!     println!("{} values", capture.values.len());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`ModelSelector`] emits selection changes.
//! - [`SceneHost`] owns the renderer, scene graph and camera, and commits
//!   selection changes when asked.
//! - [`DepthCapturePipeline`] owns the offscreen target and turns the host's
//!   current view into [`ExportArtifact`]s.
//! - [`ExportSink`] persists artifacts.
//! - [`Inspector`] wires them together.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod app;
pub mod capture;
mod headless;
mod host;
mod models;

pub use app::Inspector;
pub use capture::{
    normalize_pixels, CaptureState, CapturedFrame, DepthCapture, DepthCapturePipeline,
    MaterialSwap, OffscreenTarget,
};
pub use headless::{headless_engine, headless_inspector};
pub use host::{ModelSource, SceneHost};
pub use models::{ProceduralModels, SceneLibrary};

// Re-export core types
pub use depthscope_core::{
    default_catalog, decode_numeric_array, encode_numeric_array, ArtifactFormat, Camera,
    CaptureConfig, CapturePreset, DepthRange, DepthscopeError, DragPayload, EncodingMode,
    ExportArtifact, ExportSink, FileSink, Material, MaterialRef, MemorySink, MeshGeometry,
    MeshNode, ModelCatalog, ModelEntry, ModelSelector, NodeKind, PixelRegion, Renderer, Result,
    RowOrder, SceneGraph, SceneNode, SelectionChanged, Shading, DEFAULT_ARRAY_FILENAME,
    DEFAULT_MODELS, DEFAULT_RASTER_FILENAME,
};
pub use depthscope_core::{Mat4, Vec3, Vec4};

// Re-export render types
pub use depthscope_render::{encode_png, grayscale_raster, RenderEngine, RenderError};

/// Initializes logging from `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
