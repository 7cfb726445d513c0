//! Headless bootstrap on the wgpu backend.

use std::path::Path;

use depthscope_core::{default_catalog, CaptureConfig, DepthscopeError, FileSink, Result};
use depthscope_render::RenderEngine;
use pollster::FutureExt;

use crate::app::Inspector;
use crate::models::ProceduralModels;

/// Creates a headless engine whose display matches the capture size.
pub fn headless_engine(config: &CaptureConfig) -> Result<RenderEngine> {
    let (width, height) = config.target_size();
    RenderEngine::new_headless(width.max(1), height.max(1))
        .block_on()
        .map_err(|e| DepthscopeError::RenderFailure(e.to_string()))
}

/// Builds an inspector over the default catalog that saves into `out_dir`.
pub fn headless_inspector(
    config: CaptureConfig,
    out_dir: impl AsRef<Path>,
) -> Result<Inspector<RenderEngine>> {
    let engine = headless_engine(&config)?;
    let viewport = engine.dimensions();
    Inspector::new(
        engine,
        Box::new(ProceduralModels::new()),
        default_catalog(),
        config,
        Box::new(FileSink::new(out_dir.as_ref())),
        viewport,
    )
}
