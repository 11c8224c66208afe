//! TOML-based user mapping file reader.
//!
//! The mapping file format:
//!
//! ```toml
//! [users]
//! alice = "U012ABCDEF"
//! alice-gh = "U012ABCDEF"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::ConfigError;

/// Wrapper around the TOML mapping file structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MappingFileData {
    /// The `[users]` table mapping handle -> Slack user id.
    #[serde(default)]
    pub users: HashMap<String, String>,
}

/// Utilities for loading the user mapping file.
pub struct MappingFile;

impl MappingFile {
    /// Load the mapping file from disk and return the handle map.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading user mapping file");

        if !path.exists() {
            return Err(ConfigError::MappingFileError {
                path: path.display().to_string(),
                detail: "file not found".into(),
            });
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::MappingFileError {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;
        let data: MappingFileData =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!(count = data.users.len(), "loaded user mappings");
        Ok(data.users)
    }
}
