//! Configuration loading and management

mod io;
mod settings;
mod tool;

pub use settings::Settings;
pub use tool::ToolProfile;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::session::{Classifier, SessionOptions};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// External tool profiles, keyed by name
    #[serde(default)]
    pub tool: BTreeMap<String, ToolProfile>,
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Built-in tool profiles are added for any name the file does not define.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.merge_builtin_tools();
        Ok(config)
    }

    /// Load configuration from a directory
    /// Looks for: .promptline/config.toml
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let path = Self::project_config_path(dir);
        if path.exists() {
            return Self::from_file(&path);
        }
        Ok(Self::with_defaults())
    }

    /// Resolve the configuration for a run.
    ///
    /// Order: explicit path, `<work_dir>/.promptline/config.toml`,
    /// `~/.promptline/config.toml`, built-in defaults.
    pub fn resolve(explicit: Option<&Path>, work_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::search_paths(work_dir).into_iter().find(|p| p.exists()) {
            Some(path) => {
                tracing::debug!("Using config {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::with_defaults()),
        }
    }

    /// Create a config with sensible defaults
    pub fn with_defaults() -> Self {
        let mut config = Self::default();
        config.merge_builtin_tools();
        config
    }

    fn merge_builtin_tools(&mut self) {
        self.tool
            .entry("claude".to_string())
            .or_insert_with(ToolProfile::claude);
        self.tool
            .entry("codex".to_string())
            .or_insert_with(ToolProfile::codex);
    }

    /// Get the profile for a tool, falling back to `settings.default_tool`
    pub fn get_tool(&self, name: Option<&str>) -> Result<(String, ToolProfile)> {
        let name = name.unwrap_or(&self.settings.default_tool);
        let profile = self.tool.get(name).cloned().with_context(|| {
            let known: Vec<&str> = self.tool.keys().map(String::as_str).collect();
            format!("Unknown tool '{}' (configured: {})", name, known.join(", "))
        })?;
        Ok((name.to_string(), profile))
    }

    /// Session options derived from the settings and a tool's ready markers
    pub fn session_options(&self, profile: &ToolProfile) -> SessionOptions {
        let mut markers = vec![crate::session::DEFAULT_READY_MARKER.to_string()];
        for marker in &profile.ready_markers {
            if !markers.contains(marker) {
                markers.push(marker.clone());
            }
        }

        SessionOptions {
            interrupt_grace: Duration::from_millis(self.settings.interrupt_grace_ms),
            timeout_grace: Duration::from_millis(self.settings.timeout_grace_ms),
            buffer_lines: self.settings.buffer_lines,
            classifier: Classifier::new(self.settings.tail_lines, markers),
        }
    }
}
