//! The depth-capture pipeline.
//!
//! A capture renders the host's current scene into an offscreen target with
//! every mesh bound to a single substitute material, reads the pixels back,
//! restores the scene, and turns the pixels into a numeric array and a
//! grayscale raster. Both are then handed to an [`ExportSink`].
//!
//! One capture runs at a time. The pipeline takes `&self` for captures so a
//! re-entrant request (for example from inside a renderer callback) is seen
//! and rejected with [`DepthscopeError::Busy`] instead of being queued.

mod normalize;
mod swap;

use std::cell::{Cell, RefCell};
use std::fmt::Display;

use depthscope_core::{
    encode_numeric_array, ArtifactFormat, CaptureConfig, Camera, DepthscopeError, EncodingMode,
    ExportArtifact, ExportSink, MaterialRef, PixelRegion, Renderer, Result, SceneGraph,
};
use depthscope_render::raster::{encode_png, grayscale_raster};
use image::RgbaImage;

use crate::host::SceneHost;

pub use normalize::normalize_pixels;
pub use swap::MaterialSwap;

/// Progress of the capture in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// No capture in flight.
    #[default]
    Idle,
    /// Substitute material bound to every mesh.
    MaterialSwapped,
    /// Render pass issued into the offscreen target.
    Rendering,
    /// Pixels being read back.
    ReadBack,
    /// Original materials restored.
    Restored,
    /// Building the array, raster and artifacts.
    Encoding,
    /// Finished; the pipeline returns to `Idle` immediately after.
    Done,
}

/// An offscreen render target owned by the pipeline.
#[derive(Debug)]
pub struct OffscreenTarget<T> {
    handle: T,
    width: u32,
    height: u32,
}

impl<T> OffscreenTarget<T> {
    /// Target width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Target height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of a full RGBA8 readback.
    pub fn byte_len(&self) -> usize {
        PixelRegion::full(self.width, self.height).byte_len()
    }
}

/// The result of rendering and normalizing one frame.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Raw RGBA8 readback in the renderer's row order.
    pub pixels: Vec<u8>,
    /// Normalized values, row-major, top row first.
    pub values: Vec<f32>,
    /// Grayscale visualization of `values`.
    pub raster: RgbaImage,
}

/// The outcome of a complete capture.
#[derive(Debug, Clone)]
pub struct DepthCapture {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Normalized values, row-major, top row first.
    pub values: Vec<f32>,
    /// The numeric-array and raster artifacts, in that order.
    pub artifacts: Vec<ExportArtifact>,
}

impl DepthCapture {
    /// The numeric-array artifact.
    pub fn array_artifact(&self) -> Option<&ExportArtifact> {
        self.artifacts
            .iter()
            .find(|a| a.format == ArtifactFormat::NumericArray)
    }

    /// The raster artifact.
    pub fn raster_artifact(&self) -> Option<&ExportArtifact> {
        self.artifacts
            .iter()
            .find(|a| a.format == ArtifactFormat::RasterImage)
    }
}

/// Marks a capture as in flight for as long as it lives.
struct InFlight<'a> {
    state: &'a Cell<CaptureState>,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a Cell<CaptureState>) -> Result<Self> {
        if state.get() != CaptureState::Idle {
            log::warn!("Capture requested while one is in flight ({:?})", state.get());
            return Err(DepthscopeError::Busy);
        }
        Ok(Self { state })
    }

    fn advance(&self, next: CaptureState) {
        log::trace!("Capture state {:?} -> {:?}", self.state.get(), next);
        self.state.set(next);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.set(CaptureState::Idle);
    }
}

fn render_failure(error: impl Display) -> DepthscopeError {
    DepthscopeError::RenderFailure(error.to_string())
}

/// Renders a scene into an offscreen target and turns it into depth artifacts.
pub struct DepthCapturePipeline<R: Renderer> {
    config: CaptureConfig,
    depth_material: MaterialRef,
    target: RefCell<Option<OffscreenTarget<R::Target>>>,
    state: Cell<CaptureState>,
}

impl<R: Renderer> DepthCapturePipeline<R> {
    /// Creates a pipeline and its offscreen target on `renderer`.
    ///
    /// A zero-sized configuration creates no target; captures then fail
    /// with [`DepthscopeError::NotReady`] until [`Self::resize`] is called.
    pub fn new(renderer: &mut R, config: CaptureConfig) -> Result<Self> {
        config.validate()?;
        let depth_material = config.encoding.depth_material();
        let pipeline = Self {
            config,
            depth_material,
            target: RefCell::new(None),
            state: Cell::new(CaptureState::Idle),
        };
        let (width, height) = pipeline.config.target_size();
        pipeline.create_target(renderer, width, height)?;
        log::info!(
            "Depth capture pipeline ready ({} mode, {}x{})",
            pipeline.config.encoding.name(),
            width,
            height
        );
        Ok(pipeline)
    }

    /// The configuration the pipeline was built with.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// The encoding mode of every capture.
    pub fn encoding(&self) -> EncodingMode {
        self.config.encoding
    }

    /// The substitute material bound during captures.
    pub fn depth_material(&self) -> &MaterialRef {
        &self.depth_material
    }

    /// Current capture progress.
    pub fn state(&self) -> CaptureState {
        self.state.get()
    }

    /// Returns true if a capture is in flight.
    pub fn is_busy(&self) -> bool {
        self.state.get() != CaptureState::Idle
    }

    /// Size of the offscreen target, or `None` if there is none.
    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.target
            .try_borrow()
            .ok()
            .and_then(|t| t.as_ref().map(|t| (t.width, t.height)))
    }

    /// Re-creates the offscreen target for a logical `width` x `height`,
    /// scaled by the configured resolution scale.
    ///
    /// A zero dimension releases the target.
    pub fn resize(&self, renderer: &mut R, width: u32, height: u32) -> Result<()> {
        if self.is_busy() {
            return Err(DepthscopeError::Busy);
        }
        self.release_target(renderer);
        let scale = self.config.resolution_scale;
        self.create_target(
            renderer,
            width.saturating_mul(scale),
            height.saturating_mul(scale),
        )
    }

    /// Releases the offscreen target. Later captures fail with `NotReady`.
    pub fn teardown(&self, renderer: &mut R) -> Result<()> {
        if self.is_busy() {
            return Err(DepthscopeError::Busy);
        }
        self.release_target(renderer);
        log::debug!("Depth capture pipeline torn down");
        Ok(())
    }

    fn create_target(&self, renderer: &mut R, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            log::debug!("No offscreen target for {width}x{height}");
            return Ok(());
        }
        let handle = renderer
            .create_target(width, height)
            .map_err(render_failure)?;
        *self.target.borrow_mut() = Some(OffscreenTarget {
            handle,
            width,
            height,
        });
        Ok(())
    }

    fn release_target(&self, renderer: &mut R) {
        if let Some(target) = self.target.borrow_mut().take() {
            renderer.destroy_target(target.handle);
        }
    }

    /// Renders, reads back and normalizes the host's current view.
    ///
    /// The host's materials, shadow flags, clear color and render destination
    /// are left as found, whatever the outcome.
    pub fn capture_frame(&self, host: &mut SceneHost<R>) -> Result<CapturedFrame> {
        let flight = InFlight::begin(&self.state)?;
        let frame = self.run_frame(host, &flight)?;
        flight.advance(CaptureState::Done);
        Ok(frame)
    }

    /// Captures the host's current view and saves both artifacts to `sink`.
    ///
    /// If only persistence fails, the error is
    /// [`DepthscopeError::ExportFailure`] and carries the finished artifacts.
    pub fn capture(&self, host: &mut SceneHost<R>, sink: &mut dyn ExportSink) -> Result<DepthCapture> {
        let flight = InFlight::begin(&self.state)?;
        let frame = self.run_frame(host, &flight)?;
        let artifacts = self.build_artifacts(&frame)?;
        export_all(sink, &artifacts)?;
        flight.advance(CaptureState::Done);
        log::info!(
            "Captured {}x{} depth map ({})",
            frame.width,
            frame.height,
            self.config.encoding.name()
        );
        Ok(DepthCapture {
            width: frame.width,
            height: frame.height,
            values: frame.values,
            artifacts,
        })
    }

    fn run_frame(&self, host: &mut SceneHost<R>, flight: &InFlight<'_>) -> Result<CapturedFrame> {
        let target = self.target.borrow();
        let target = target.as_ref().ok_or_else(|| {
            log::error!("Capture attempted without an offscreen target");
            DepthscopeError::NotReady
        })?;

        let (renderer, scene, camera) = host.parts_mut();
        let row_order = renderer.row_order();

        let readback = {
            let swap = MaterialSwap::apply(scene, &self.depth_material);
            flight.advance(CaptureState::MaterialSwapped);
            let readback = self.render_and_read(renderer, swap.scene(), camera, target, flight);
            swap.restore();
            flight.advance(CaptureState::Restored);
            readback
        };
        let pixels = readback.inspect_err(|e| log::error!("Capture failed: {e}"))?;

        flight.advance(CaptureState::Encoding);
        let values = normalize_pixels(
            &pixels,
            target.width,
            target.height,
            row_order,
            self.config.encoding,
        )?;
        let raster = grayscale_raster(&values, target.width, target.height).map_err(render_failure)?;

        Ok(CapturedFrame {
            width: target.width,
            height: target.height,
            pixels,
            values,
            raster,
        })
    }

    /// Issues the single render pass and reads the target back.
    fn render_and_read(
        &self,
        renderer: &mut R,
        scene: &SceneGraph,
        camera: &Camera,
        target: &OffscreenTarget<R::Target>,
        flight: &InFlight<'_>,
    ) -> Result<Vec<u8>> {
        let previous_clear = renderer.clear_color();

        flight.advance(CaptureState::Rendering);
        renderer.set_render_target(Some(&target.handle));
        renderer.set_clear_color(self.config.clear_color);
        let rendered = renderer.render(scene, camera);
        renderer.set_render_target(None);
        renderer.set_clear_color(previous_clear);
        rendered.map_err(render_failure)?;

        flight.advance(CaptureState::ReadBack);
        let region = PixelRegion::full(target.width, target.height);
        let pixels = renderer
            .read_pixels(&target.handle, region)
            .map_err(render_failure)?;

        let expected = target.byte_len();
        if pixels.len() != expected {
            return Err(DepthscopeError::ReadbackSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(pixels)
    }

    fn build_artifacts(&self, frame: &CapturedFrame) -> Result<Vec<ExportArtifact>> {
        let mut artifacts = Vec::with_capacity(2);

        let array = encode_numeric_array(&frame.values).map_err(|e| {
            DepthscopeError::ExportFailure {
                filename: self.config.array_filename.clone(),
                reason: e.to_string(),
                artifacts: Vec::new(),
            }
        })?;
        artifacts.push(ExportArtifact::new(
            ArtifactFormat::NumericArray,
            array,
            &self.config.array_filename,
        ));

        match encode_png(&frame.raster) {
            Ok(png) => artifacts.push(ExportArtifact::new(
                ArtifactFormat::RasterImage,
                png,
                &self.config.raster_filename,
            )),
            Err(e) => {
                return Err(DepthscopeError::ExportFailure {
                    filename: self.config.raster_filename.clone(),
                    reason: e.to_string(),
                    artifacts,
                })
            }
        }
        Ok(artifacts)
    }
}

/// Saves every artifact, reporting the first failure with all artifacts attached.
fn export_all(sink: &mut dyn ExportSink, artifacts: &[ExportArtifact]) -> Result<()> {
    let mut first_failure = None;
    for artifact in artifacts {
        if let Err(e) = sink.save(artifact) {
            log::error!("Failed to save {}: {e}", artifact.filename);
            first_failure.get_or_insert((artifact.filename.clone(), e.to_string()));
        }
    }
    match first_failure {
        None => Ok(()),
        Some((filename, reason)) => Err(DepthscopeError::ExportFailure {
            filename,
            reason,
            artifacts: artifacts.to_vec(),
        }),
    }
}

impl<R: Renderer> Drop for DepthCapturePipeline<R> {
    fn drop(&mut self) {
        if self.target.get_mut().is_some() {
            log::debug!("Depth capture pipeline dropped without teardown");
        }
    }
}

impl<R: Renderer> std::fmt::Debug for DepthCapturePipeline<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthCapturePipeline")
            .field("config", &self.config)
            .field("target_size", &self.target_size())
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}
