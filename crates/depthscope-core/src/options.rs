//! Capture configuration.

use std::path::Path;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::error::{DepthscopeError, Result};
use crate::material::EncodingMode;

/// Default filename of the numeric-array artifact.
pub const DEFAULT_ARRAY_FILENAME: &str = "depth-map.json";

/// Default filename of the raster artifact.
pub const DEFAULT_RASTER_FILENAME: &str = "depth-map.png";

/// Configuration of a depth-capture pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Logical capture width in pixels.
    pub width: u32,

    /// Logical capture height in pixels.
    pub height: u32,

    /// Multiplier applied to both dimensions of the offscreen target.
    pub resolution_scale: u32,

    /// Substitute material and normalization rule.
    pub encoding: EncodingMode,

    /// RGBA value the offscreen target is cleared to before drawing.
    pub clear_color: Vec4,

    /// Filename of the numeric-array artifact.
    pub array_filename: String,

    /// Filename of the raster artifact.
    pub raster_filename: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CapturePreset::default().config(512, 512)
    }
}

impl CaptureConfig {
    /// Offscreen target size after applying `resolution_scale`.
    pub fn target_size(&self) -> (u32, u32) {
        (
            self.width.saturating_mul(self.resolution_scale),
            self.height.saturating_mul(self.resolution_scale),
        )
    }

    /// Sets the logical capture size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the clear color from a single gray byte, alpha 255.
    #[must_use]
    pub fn with_gray_background(mut self, value: u8) -> Self {
        let v = f32::from(value) / 255.0;
        self.clear_color = Vec4::new(v, v, v, 1.0);
        self
    }

    /// Checks value ranges.
    ///
    /// Zero width or height is accepted here; a pipeline built from such a
    /// config simply has no target and reports `NotReady` on capture.
    pub fn validate(&self) -> Result<()> {
        if self.resolution_scale == 0 {
            return Err(DepthscopeError::InvalidConfig(
                "resolution_scale must be at least 1".into(),
            ));
        }
        let in_range = self
            .clear_color
            .to_array()
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c));
        if !in_range {
            return Err(DepthscopeError::InvalidConfig(format!(
                "clear_color components must be within [0, 1], got {}",
                self.clear_color
            )));
        }
        if self.array_filename.is_empty() || self.raster_filename.is_empty() {
            return Err(DepthscopeError::InvalidConfig(
                "artifact filenames must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Loads a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Named capture variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapturePreset {
    /// White geometry on black, presence mask.
    #[default]
    BinaryMask,
    /// Grayscale depth intensity on a white background.
    RawLuma,
    /// Presence mask at twice the requested resolution.
    BinaryMaskDoubled,
}

impl CapturePreset {
    /// Builds a full configuration for this preset.
    pub fn config(self, width: u32, height: u32) -> CaptureConfig {
        let (encoding, clear_color, resolution_scale) = match self {
            CapturePreset::BinaryMask => (EncodingMode::BinaryMask, Vec4::new(0.0, 0.0, 0.0, 1.0), 1),
            CapturePreset::RawLuma => (EncodingMode::RawLuma, Vec4::ONE, 1),
            CapturePreset::BinaryMaskDoubled => {
                (EncodingMode::BinaryMask, Vec4::new(0.0, 0.0, 0.0, 1.0), 2)
            }
        };
        CaptureConfig {
            width,
            height,
            resolution_scale,
            encoding,
            clear_color,
            array_filename: DEFAULT_ARRAY_FILENAME.to_string(),
            raster_filename: DEFAULT_RASTER_FILENAME.to_string(),
        }
    }
}
