//! The inspector: selection, viewport and capture wired together.

use depthscope_core::{
    CaptureConfig, DepthscopeError, DragPayload, ExportSink, ModelCatalog, ModelSelector,
    Renderer, Result, SelectionChanged,
};

use crate::capture::{DepthCapture, DepthCapturePipeline};
use crate::host::{ModelSource, SceneHost};

/// A model pick-list, a viewport and a depth capture button.
///
/// Selection events go straight to the host; captures go straight to the
/// pipeline. The initially selected model is committed on the first
/// [`Self::tick`].
pub struct Inspector<R: Renderer> {
    selector: ModelSelector,
    host: SceneHost<R>,
    pipeline: DepthCapturePipeline<R>,
    sink: Box<dyn ExportSink>,
}

impl<R: Renderer> Inspector<R> {
    /// Builds an inspector with a viewport of `viewport.0` x `viewport.1`.
    pub fn new(
        renderer: R,
        source: Box<dyn ModelSource>,
        catalog: ModelCatalog,
        config: CaptureConfig,
        sink: Box<dyn ExportSink>,
        viewport: (u32, u32),
    ) -> Result<Self> {
        let selector = ModelSelector::new(catalog);
        let mut host = SceneHost::new(renderer, source, viewport.0, viewport.1);
        if let Some(initial) = selector.current() {
            host.on_selection_changed(&SelectionChanged {
                model_id: initial.to_string(),
            });
        }
        let pipeline = DepthCapturePipeline::new(host.renderer_mut(), config)?;
        Ok(Self {
            selector,
            host,
            pipeline,
            sink,
        })
    }

    /// The model selector.
    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    /// The model selector, mutably (e.g. to subscribe observers).
    pub fn selector_mut(&mut self) -> &mut ModelSelector {
        &mut self.selector
    }

    /// The scene host.
    pub fn host(&self) -> &SceneHost<R> {
        &self.host
    }

    /// The scene host, mutably.
    pub fn host_mut(&mut self) -> &mut SceneHost<R> {
        &mut self.host
    }

    /// The capture pipeline.
    pub fn pipeline(&self) -> &DepthCapturePipeline<R> {
        &self.pipeline
    }

    /// Selects a model by id or display name.
    ///
    /// Returns `true` if a load was queued. Re-selecting a model whose
    /// load failed queues it again.
    pub fn select_model(&mut self, key: &str) -> Result<bool> {
        let model_id = self
            .selector
            .catalog()
            .find(key)
            .map(|entry| entry.model_id.clone())
            .ok_or_else(|| DepthscopeError::ModelNotFound(key.to_string()))?;
        let event = self.selector.select(&model_id)?;
        Ok(self.forward_selection(&model_id, event))
    }

    /// Hands a selection to the host. An unchanged selection is sent again
    /// only while the host has neither committed nor queued it.
    fn forward_selection(&mut self, model_id: &str, event: Option<SelectionChanged>) -> bool {
        let event = match event {
            Some(event) => event,
            None if self.host.active_model() != Some(model_id)
                && self.host.pending_model() != Some(model_id) =>
            {
                log::info!("Retrying load of {model_id}");
                SelectionChanged {
                    model_id: model_id.to_string(),
                }
            }
            None => return false,
        };
        self.host.on_selection_changed(&event);
        true
    }

    /// Starts dragging a pick-list entry.
    pub fn begin_drag(&self, model_id: &str) -> Result<DragPayload> {
        self.selector.begin_drag(model_id)
    }

    /// Drops a payload onto the viewport. Empty payloads are ignored.
    ///
    /// Returns `true` if a load was queued.
    pub fn drop_payload(&mut self, payload: &DragPayload) -> Result<bool> {
        if payload.is_empty() {
            return Ok(false);
        }
        let event = self.selector.drop_payload(payload)?;
        if !self.forward_selection(payload.model_id(), event) {
            return Ok(false);
        }
        // Layout may have shifted under the drop target
        let (width, height) = self.host.viewport();
        self.host.resize_viewport(width, height);
        Ok(true)
    }

    /// Commits any pending selection and renders one display frame.
    pub fn tick(&mut self) -> Result<()> {
        self.host.commit_pending()?;
        self.host.render_frame()
    }

    /// Captures the current view and saves both artifacts.
    pub fn capture(&mut self) -> Result<DepthCapture> {
        self.pipeline.capture(&mut self.host, self.sink.as_mut())
    }

    /// Releases the capture target.
    pub fn shutdown(&mut self) -> Result<()> {
        self.pipeline.teardown(self.host.renderer_mut())
    }
}

impl<R: Renderer> std::fmt::Debug for Inspector<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspector")
            .field("selector", &self.selector)
            .field("host", &self.host)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
