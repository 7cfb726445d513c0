//! depthscope CLI - headless depth-map capture
//!
//! Selects a model from the catalog, renders it offscreen and writes
//! `depth-map.json` and `depth-map.png`.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use depthscope::{
    default_catalog, headless_inspector, CaptureConfig, CapturePreset, DepthscopeError,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    /// White geometry on black (default)
    BinaryMask,
    /// Grayscale depth intensity on white
    RawLuma,
    /// Binary mask at twice the requested resolution
    BinaryMaskDoubled,
}

impl From<PresetArg> for CapturePreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::BinaryMask => CapturePreset::BinaryMask,
            PresetArg::RawLuma => CapturePreset::RawLuma,
            PresetArg::BinaryMaskDoubled => CapturePreset::BinaryMaskDoubled,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "depthscope")]
#[command(about = "Capture depth maps of 3D models", long_about = None)]
struct Cli {
    /// List the model catalog and exit
    #[arg(long)]
    list: bool,

    /// JSON capture configuration to start from
    #[arg(long)]
    config: Option<PathBuf>,

    /// Named capture variant (ignored when --config is given)
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,

    /// Capture width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Capture height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Resolution multiplier applied to width and height
    #[arg(long)]
    scale: Option<u32>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Model id or display name (default: first catalog entry)
    #[arg(short, long)]
    model: Option<String>,
}

fn build_config(cli: &Cli) -> Result<CaptureConfig> {
    let mut config = match &cli.config {
        Some(path) => CaptureConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let preset = cli.preset.map(CapturePreset::from).unwrap_or_default();
            preset.config(512, 512)
        }
    };

    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }
    if let Some(scale) = cli.scale {
        config.resolution_scale = scale;
    }
    config.validate()?;
    Ok(config)
}

fn list_models() {
    for entry in default_catalog().entries() {
        println!("{:<24} {}", entry.display_name, entry.model_id);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.list {
        list_models();
        return Ok(());
    }

    let config = build_config(&cli)?;
    let mut inspector =
        headless_inspector(config, &cli.out_dir).context("Failed to create headless renderer")?;

    if let Some(model) = &cli.model {
        inspector.select_model(model)?;
    }
    inspector.tick().context("Failed to load model")?;

    let capture = match inspector.capture() {
        Ok(capture) => capture,
        Err(DepthscopeError::ExportFailure {
            filename, reason, ..
        }) => bail!("Captured, but saving {filename} failed: {reason}"),
        Err(e) => return Err(e).context("Capture failed"),
    };
    inspector.shutdown()?;

    println!(
        "{} {}x{} -> {} ({} values)",
        inspector.host().active_model().unwrap_or("<placeholder>"),
        capture.width,
        capture.height,
        cli.out_dir.display(),
        capture.values.len()
    );
    Ok(())
}
