//! Export artifacts and the sinks that persist them.

use std::path::{Path, PathBuf};

use crate::error::{DepthscopeError, Result};

/// Kind of payload an artifact carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// JSON array of depth values, row-major, top row first.
    NumericArray,
    /// Lossless grayscale raster image (PNG).
    RasterImage,
}

impl ArtifactFormat {
    /// MIME type of the payload.
    pub fn mime_type(self) -> &'static str {
        match self {
            ArtifactFormat::NumericArray => "application/json",
            ArtifactFormat::RasterImage => "image/png",
        }
    }
}

/// A finished artifact ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Payload format.
    pub format: ArtifactFormat,
    /// Encoded bytes.
    pub payload: Vec<u8>,
    /// Target filename (no directory).
    pub filename: String,
}

impl ExportArtifact {
    /// Creates an artifact.
    pub fn new(format: ArtifactFormat, payload: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            format,
            payload,
            filename: filename.into(),
        }
    }
}

/// Serializes depth values as a flat JSON number array.
///
/// The array carries no width/height; consumers must know the target size.
pub fn encode_numeric_array(values: &[f32]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(values)?)
}

/// Parses a payload written by [`encode_numeric_array`].
pub fn decode_numeric_array(payload: &[u8]) -> Result<Vec<f32>> {
    Ok(serde_json::from_slice(payload)?)
}

/// Destination for finished artifacts.
pub trait ExportSink {
    /// Persists one artifact.
    fn save(&mut self, artifact: &ExportArtifact) -> Result<()>;
}

/// Writes artifacts into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Creates a sink writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path an artifact will be written to.
    pub fn path_for(&self, artifact: &ExportArtifact) -> PathBuf {
        self.dir.join(&artifact.filename)
    }
}

impl ExportSink for FileSink {
    fn save(&mut self, artifact: &ExportArtifact) -> Result<()> {
        if artifact.filename.is_empty() {
            return Err(DepthscopeError::InvalidConfig(
                "artifact has no filename".into(),
            ));
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(artifact);
        std::fs::write(&path, &artifact.payload)?;
        log::info!(
            "Saved {} ({} bytes) to {}",
            artifact.filename,
            artifact.payload.len(),
            path.display()
        );
        Ok(())
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Saved artifacts, in save order.
    pub artifacts: Vec<ExportArtifact>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a saved artifact by filename.
    pub fn get(&self, filename: &str) -> Option<&ExportArtifact> {
        self.artifacts.iter().find(|a| a.filename == filename)
    }
}

impl ExportSink for MemorySink {
    fn save(&mut self, artifact: &ExportArtifact) -> Result<()> {
        self.artifacts.push(artifact.clone());
        Ok(())
    }
}
