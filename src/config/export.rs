use super::SessionConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct ExportToolConfig {
    /// Frame images in temporal order.
    pub frames: Vec<PathBuf>,
    /// SWC skeleton providing the branches.
    pub skeleton: PathBuf,
    /// Overrides the percentile-derived initial threshold.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// When set, every branch is split into segments of this path length.
    #[serde(default)]
    pub split_length: Option<f64>,
    #[serde(default)]
    pub session: SessionConfig,
    pub output: ExportOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct ExportOutputConfig {
    pub container_json: PathBuf,
    #[serde(default)]
    pub mask_image: Option<PathBuf>,
    /// Store the raw stack in the container.
    #[serde(default)]
    pub include_data: bool,
}

pub fn load_config(path: &Path) -> Result<ExportToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
