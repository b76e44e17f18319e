use std::path::{Path, PathBuf};

/// Folders under the base directory that never hold a company.
pub const RESERVED_FOLDERS: &[&str] = &["resumes", "interview-intel"];

pub const TRACKING_FILE: &str = "tracking.json";
pub const INTERVIEWS_DIR: &str = "interviews";

/// Resolved locations for one InterviewIntel workspace.
#[derive(Debug, Clone)]
pub struct Config {
    base: PathBuf,
}

impl Config {
    /// Resolve the base directory: explicit path (flag or `INTEL_HOME`),
    /// then `~/InterviewIntel`, then the current directory.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let base = explicit
            .or_else(Self::default_base)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { base }
    }

    #[cfg(test)]
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn default_base() -> Option<PathBuf> {
        directories::UserDirs::new().map(|dirs| dirs.home_dir().join("InterviewIntel"))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn company_dir(&self, company: &str) -> PathBuf {
        self.base.join(company)
    }

    pub fn analytics_dir(&self) -> PathBuf {
        self.base.join(".analytics")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.analytics_dir().join("exports")
    }

    pub fn resume_registry_path(&self) -> PathBuf {
        self.base.join("resumes").join("resume_registry.json")
    }
}

pub fn tracking_path(company_dir: &Path) -> PathBuf {
    company_dir.join(INTERVIEWS_DIR).join(TRACKING_FILE)
}

/// Dot-folders and reserved names are skipped during company discovery.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with('.') || RESERVED_FOLDERS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_reserved() {
        assert!(is_reserved("resumes"));
        assert!(is_reserved("interview-intel"));
        assert!(is_reserved(".analytics"));
        assert!(!is_reserved("Acme"));
    }

    #[test]
    fn test_layout_paths() {
        let config = Config::with_base("/tmp/intel");
        assert_eq!(config.company_dir("Acme"), PathBuf::from("/tmp/intel/Acme"));
        assert_eq!(
            tracking_path(&config.company_dir("Acme")),
            PathBuf::from("/tmp/intel/Acme/interviews/tracking.json")
        );
        assert_eq!(config.exports_dir(), PathBuf::from("/tmp/intel/.analytics/exports"));
    }
}
