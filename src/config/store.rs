//! Loading individual configuration documents from disk.

use super::model::Configuration;
use crate::error::{LaunchError, Result};
use std::path::Path;
use tracing::debug;

/// Document formats understood by [`load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yml" | "yaml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Load a configuration document from a `.yml`, `.yaml` or `.json` file.
///
/// # Returns
///
/// * `Ok(Configuration)` - Parsed document (an empty document is an empty configuration)
/// * `Err(LaunchError::InvalidPath)` - The file does not exist
/// * `Err(LaunchError::UnsupportedFormat)` - The extension is neither YAML nor JSON
/// * `Err(LaunchError::ConfigParse)` - The file could not be read or parsed
pub fn load<P: AsRef<Path>>(path: P) -> Result<Configuration> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(LaunchError::InvalidPath(path.to_path_buf()));
    }

    let format =
        ConfigFormat::from_path(path).ok_or_else(|| LaunchError::UnsupportedFormat(path.to_path_buf()))?;

    let content = std::fs::read_to_string(path).map_err(|e| LaunchError::ConfigParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    debug!(path = %path.display(), ?format, "loading config document");

    let parsed = match format {
        ConfigFormat::Yaml => serde_yaml::from_str::<Configuration>(&content).map_err(|e| e.to_string()),
        ConfigFormat::Json => {
            // Whitespace-only JSON files are treated like empty YAML documents.
            if content.trim().is_empty() {
                Ok(Configuration::default())
            } else {
                serde_json::from_str::<Configuration>(&content).map_err(|e| e.to_string())
            }
        }
    };

    parsed.map_err(|message| LaunchError::ConfigParse {
        path: path.to_path_buf(),
        message,
    })
}
