//! Project configuration parsing
//!
//! The project document says where the sources live, how many workers to use
//! and how backups are named.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::MutationError;
use crate::mutator::DEFAULT_MAX_PASSES;

/// Top-level project configuration
#[derive(Debug, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub sources: Sources,
}

/// Global settings for a run
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Number of files processed in parallel
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Pass limit for operator groups
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
    /// Suffix appended to backup copies; empty disables backups
    #[serde(default)]
    pub backup_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            max_passes: default_max_passes(),
            backup_extension: String::new(),
        }
    }
}

fn default_worker_threads() -> usize {
    1
}

fn default_max_passes() -> usize {
    DEFAULT_MAX_PASSES
}

/// Which files to instrument
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Sources {
    /// Absolute directories searched recursively, in order
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    /// File name endings to accept, e.g. `*.cpp`
    #[serde(default)]
    pub include_extensions: Vec<String>,
    /// Directories whose path contains any of these are not entered
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// Files whose path contains any of these are skipped
    #[serde(default)]
    pub exclude_files: Vec<String>,
}

impl Sources {
    /// Strip glob stars so the rules become plain suffix/substring checks
    fn normalize(&mut self) {
        fn clean(values: &mut Vec<String>, trim: fn(&str) -> &str) {
            for value in values.iter_mut() {
                *value = trim(value).to_string();
            }
            values.retain(|v| !v.is_empty());
        }

        clean(&mut self.include_extensions, |v| v.trim_start_matches('*'));
        clean(&mut self.exclude_dirs, |v| v.trim_matches('*'));
        clean(&mut self.exclude_files, |v| v.trim_matches('*'));
    }

    /// Whether a subdirectory may be searched
    pub fn directory_allowed(&self, dir: &Path) -> bool {
        let dir = dir.to_string_lossy();
        !self.exclude_dirs.iter().any(|excluded| dir.contains(excluded.as_str()))
    }

    /// Whether a file should be instrumented
    pub fn file_allowed(&self, file: &Path) -> bool {
        let file = file.to_string_lossy();
        self.include_extensions
            .iter()
            .any(|extension| file.ends_with(extension.as_str()))
            && !self
                .exclude_files
                .iter()
                .any(|excluded| file.contains(excluded.as_str()))
    }
}

impl ProjectConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, MutationError> {
        let content = std::fs::read_to_string(path).map_err(|e| MutationError::ConfigError {
            message: format!("Failed to read project file '{}': {}", path.display(), e),
        })?;

        Self::from_yaml(&content).map_err(|e| MutationError::ConfigError {
            message: format!("Failed to parse project file '{}': {}", path.display(), e),
        })
    }

    /// Parse a project document
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let mut config: ProjectConfig = serde_yaml::from_str(content)?;
        config.sources.normalize();
        Ok(config)
    }

    /// Check settings that would make a run meaningless
    pub fn validate(&self) -> Result<(), Vec<MutationError>> {
        let mut errors = Vec::new();

        if self.settings.worker_threads == 0 {
            errors.push(MutationError::ConfigError {
                message: "worker_threads must be at least 1".to_string(),
            });
        }

        if self.settings.max_passes == 0 {
            errors.push(MutationError::ConfigError {
                message: "max_passes must be at least 1".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
