//! Pipeline Configuration
//!
//! Directory layout and report limits. Every field has a default, so a config
//! file only needs the keys it overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: PathBuf,
    #[serde(default = "default_rewrite_out_dir")]
    pub rewrite_out_dir: PathBuf,
    #[serde(default = "default_webp_out_dir")]
    pub webp_out_dir: PathBuf,
    #[serde(default = "default_resized_out_dir")]
    pub resized_out_dir: PathBuf,
    #[serde(default)]
    pub report: ReportLimits,
}

fn default_images_dir() -> PathBuf { PathBuf::from(".") }
fn default_metadata_dir() -> PathBuf { PathBuf::from("metadata") }
fn default_rewrite_out_dir() -> PathBuf { PathBuf::from("new_metadata") }
fn default_webp_out_dir() -> PathBuf { PathBuf::from("webp") }
fn default_resized_out_dir() -> PathBuf { PathBuf::from("resized_png") }

/// How many entries the text report lists before truncating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLimits {
    #[serde(default = "default_missing_preview")]
    pub missing_preview: usize,
    #[serde(default = "default_duplicate_preview")]
    pub duplicate_preview: usize,
}

fn default_missing_preview() -> usize { 50 }
fn default_duplicate_preview() -> usize { 20 }

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            missing_preview: default_missing_preview(),
            duplicate_preview: default_duplicate_preview(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            metadata_dir: default_metadata_dir(),
            rewrite_out_dir: default_rewrite_out_dir(),
            webp_out_dir: default_webp_out_dir(),
            resized_out_dir: default_resized_out_dir(),
            report: ReportLimits::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
