//! The scene host: renderer, committed scene graph and camera.

use depthscope_core::{
    Camera, DepthscopeError, Renderer, Result, SceneGraph, SelectionChanged,
};

/// Produces the scene graph of a catalog model.
///
/// Stands in for the asset loader; file parsing is the implementor's concern.
pub trait ModelSource {
    /// Loads the scene graph for `model_id`.
    fn load(&mut self, model_id: &str) -> Result<SceneGraph>;
}

/// Owns the renderer, the scene shown in the viewport and the camera.
///
/// Selection changes are recorded and committed later by
/// [`Self::commit_pending`]; until then the previous scene stays visible.
pub struct SceneHost<R: Renderer> {
    renderer: R,
    scene: SceneGraph,
    camera: Camera,
    source: Option<Box<dyn ModelSource>>,
    active_model: Option<String>,
    pending: Option<String>,
    viewport: (u32, u32),
}

impl<R: Renderer> SceneHost<R> {
    /// Creates a host showing the loading placeholder.
    pub fn new(renderer: R, source: Box<dyn ModelSource>, width: u32, height: u32) -> Self {
        let mut host = Self::with_scene(renderer, SceneGraph::loading_placeholder(), width, height);
        host.source = Some(source);
        host
    }

    /// Creates a host around a fixed scene with no model source.
    pub fn with_scene(renderer: R, scene: SceneGraph, width: u32, height: u32) -> Self {
        let mut camera = Camera::default();
        camera.set_viewport(width, height);
        Self {
            renderer,
            scene,
            camera,
            source: None,
            active_model: None,
            pending: None,
            viewport: (width, height),
        }
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// The committed scene graph.
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// The committed scene graph, mutably.
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Replaces the committed scene directly.
    pub fn set_scene(&mut self, scene: SceneGraph) {
        self.scene = scene;
    }

    /// The active camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The active camera, mutably.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Id of the model whose scene is committed.
    pub fn active_model(&self) -> Option<&str> {
        self.active_model.as_deref()
    }

    /// Id of a selected model not yet committed.
    pub fn pending_model(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Viewport size in pixels.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Split borrow for a capture: renderer and scene mutably, camera shared.
    pub fn parts_mut(&mut self) -> (&mut R, &mut SceneGraph, &Camera) {
        (&mut self.renderer, &mut self.scene, &self.camera)
    }

    /// Records a selection change; the scene is swapped on the next commit.
    pub fn on_selection_changed(&mut self, event: &SelectionChanged) {
        log::debug!("Model {} pending", event.model_id);
        self.pending = Some(event.model_id.clone());
    }

    /// Loads and commits the pending selection, if any.
    ///
    /// Returns `true` if the scene changed. A failed load keeps the previous
    /// scene and drops the request.
    pub fn commit_pending(&mut self) -> Result<bool> {
        let Some(model_id) = self.pending.take() else {
            return Ok(false);
        };
        if self.active_model.as_deref() == Some(model_id.as_str()) {
            return Ok(false);
        }
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| DepthscopeError::ModelLoadFailed {
                model_id: model_id.clone(),
                reason: "no model source attached".into(),
            })?;

        match source.load(&model_id) {
            Ok(scene) => {
                self.scene = scene;
                log::info!("Current model updated to {model_id}");
                self.active_model = Some(model_id);
                Ok(true)
            }
            Err(e) => {
                log::error!("Failed to load model {model_id}: {e}");
                Err(e)
            }
        }
    }

    /// Resizes the viewport and the display destination.
    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("Ignoring viewport resize to {width}x{height}");
            return;
        }
        self.viewport = (width, height);
        self.camera.set_viewport(width, height);
        self.renderer.resize_display(width, height);
    }

    /// Renders the committed scene to the display destination.
    pub fn render_frame(&mut self) -> Result<()> {
        self.renderer.set_render_target(None);
        self.renderer
            .render(&self.scene, &self.camera)
            .map_err(|e| DepthscopeError::RenderFailure(e.to_string()))
    }
}

impl<R: Renderer> std::fmt::Debug for SceneHost<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneHost")
            .field("active_model", &self.active_model)
            .field("pending", &self.pending)
            .field("viewport", &self.viewport)
            .field("meshes", &self.scene.mesh_count())
            .finish_non_exhaustive()
    }
}
