use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::AnalyticsError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumeVersion {
    pub version_id: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TailoredVersion {
    #[serde(default)]
    pub base_version: String,
    #[serde(default)]
    pub file: String,
}

/// Resume versions maintained by the resume manager. Never written here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumeRegistry {
    #[serde(default)]
    pub versions: Vec<ResumeVersion>,
    #[serde(default)]
    pub tailored_versions: Vec<TailoredVersion>,
}

impl ResumeRegistry {
    /// A missing registry is treated as empty; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, AnalyticsError> {
        if !path.exists() {
            debug!(path = %path.display(), "no resume registry");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| AnalyticsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| AnalyticsError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve a version id, following a tailored file name back to its base.
    pub fn resolve(&self, id: &str) -> Option<&ResumeVersion> {
        self.versions.iter().find(|v| v.version_id == id).or_else(|| {
            self.tailored_versions
                .iter()
                .find(|t| t.file == id)
                .and_then(|t| self.versions.iter().find(|v| v.version_id == t.base_version))
        })
    }
}
