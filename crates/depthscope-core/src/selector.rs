//! Model catalog and selection.
//!
//! The selector keeps the pick-list of loadable models and turns user
//! gestures (direct pick or drag-and-drop) into `SelectionChanged`
//! notifications. Notifications are fire-and-forget: the selector never
//! waits for the scene host to commit the new model.

use crate::error::{DepthscopeError, Result};

/// One entry in the pick-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    /// Name shown to the user.
    pub display_name: String,
    /// Identifier handed to the model source.
    pub model_id: String,
}

impl ModelEntry {
    /// Creates an entry.
    pub fn new(display_name: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            model_id: model_id.into(),
        }
    }
}

/// The ordered list of selectable models.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
}

impl ModelCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. Returns an error if the id is already present.
    pub fn add(&mut self, entry: ModelEntry) -> Result<()> {
        if self.contains(&entry.model_id) {
            return Err(DepthscopeError::InvalidConfig(format!(
                "duplicate model id '{}'",
                entry.model_id
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Returns true if a model with this id is listed.
    pub fn contains(&self, model_id: &str) -> bool {
        self.entries.iter().any(|e| e.model_id == model_id)
    }

    /// Finds an entry by id, falling back to a case-insensitive display name match.
    pub fn find(&self, key: &str) -> Option<&ModelEntry> {
        self.entries
            .iter()
            .find(|e| e.model_id == key)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.display_name.eq_ignore_ascii_case(key))
            })
    }

    /// All entries in display order.
    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ModelEntry> for ModelCatalog {
    fn from_iter<I: IntoIterator<Item = ModelEntry>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for entry in iter {
            if let Err(e) = catalog.add(entry) {
                log::warn!("Skipping catalog entry: {e}");
            }
        }
        catalog
    }
}

/// The model ids the inspector ships with.
pub const DEFAULT_MODELS: [(&str, &str); 3] = [
    ("Low Poly Dummy", "/low-poly_test_dummy.glb"),
    ("Medieval Combat Dummy", "/medieval_combat_dummy.glb"),
    ("Tunnergp", "/tunnergp.glb"),
];

/// Builds the default catalog from [`DEFAULT_MODELS`].
pub fn default_catalog() -> ModelCatalog {
    DEFAULT_MODELS
        .iter()
        .map(|(name, id)| ModelEntry::new(*name, *id))
        .collect()
}

/// Notification that the selected model changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChanged {
    /// The newly selected model id.
    pub model_id: String,
}

/// Data carried by a drag gesture from the pick-list to the viewport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragPayload {
    model_id: String,
}

impl DragPayload {
    /// Wraps a raw payload string, e.g. one received from a platform drop event.
    pub fn from_raw(data: impl Into<String>) -> Self {
        Self {
            model_id: data.into(),
        }
    }

    /// The carried model id.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Returns true if the payload carries nothing.
    pub fn is_empty(&self) -> bool {
        self.model_id.is_empty()
    }
}

type SelectionListener = Box<dyn FnMut(&SelectionChanged)>;

/// Tracks the current selection and notifies subscribers when it changes.
pub struct ModelSelector {
    catalog: ModelCatalog,
    current: Option<String>,
    listeners: Vec<SelectionListener>,
}

impl ModelSelector {
    /// Creates a selector with the first catalog entry selected.
    pub fn new(catalog: ModelCatalog) -> Self {
        let current = catalog.entries().first().map(|e| e.model_id.clone());
        Self {
            catalog,
            current,
            listeners: Vec::new(),
        }
    }

    /// The catalog being offered.
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// The currently selected model id.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Registers a selection observer.
    pub fn subscribe(&mut self, listener: impl FnMut(&SelectionChanged) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Selects a model by id.
    ///
    /// Returns the emitted notification, or `None` if the model was already
    /// selected.
    pub fn select(&mut self, model_id: &str) -> Result<Option<SelectionChanged>> {
        if !self.catalog.contains(model_id) {
            return Err(DepthscopeError::ModelNotFound(model_id.to_string()));
        }
        if self.current.as_deref() == Some(model_id) {
            return Ok(None);
        }

        self.current = Some(model_id.to_string());
        let event = SelectionChanged {
            model_id: model_id.to_string(),
        };
        log::debug!("Selection changed to {model_id}");
        for listener in &mut self.listeners {
            listener(&event);
        }
        Ok(Some(event))
    }

    /// Starts dragging a pick-list entry.
    pub fn begin_drag(&self, model_id: &str) -> Result<DragPayload> {
        if !self.catalog.contains(model_id) {
            return Err(DepthscopeError::ModelNotFound(model_id.to_string()));
        }
        Ok(DragPayload::from_raw(model_id))
    }

    /// Completes a drop onto the viewport. Empty payloads are ignored.
    pub fn drop_payload(&mut self, payload: &DragPayload) -> Result<Option<SelectionChanged>> {
        if payload.is_empty() {
            return Ok(None);
        }
        self.select(payload.model_id())
    }
}

impl std::fmt::Debug for ModelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSelector")
            .field("catalog", &self.catalog)
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
