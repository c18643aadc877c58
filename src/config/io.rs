//! Where configuration lives and how it is written

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::Config;

const CONFIG_DIR: &str = ".promptline";
const CONFIG_FILE: &str = "config.toml";

impl Config {
    /// `~/.promptline/`, or `./.promptline/` without a home directory
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
    }

    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join(CONFIG_FILE)
    }

    /// `<work_dir>/.promptline/config.toml`
    pub fn project_config_path(work_dir: &Path) -> PathBuf {
        work_dir.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Config files `resolve` considers, most specific first
    pub(super) fn search_paths(work_dir: &Path) -> [PathBuf; 2] {
        [Self::project_config_path(work_dir), Self::global_config_path()]
    }

    /// Write the configuration as TOML, replacing `path` in one step.
    ///
    /// Writers to the same path are serialized through a sibling lock file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let _lock = WriteLock::acquire(path)?;
        replace_file(path, content.as_bytes())?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }
}

/// Exclusive advisory lock on `<path>.lock`, held until dropped
struct WriteLock {
    file: File,
}

impl WriteLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = sibling(path, "lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock {}", lock_path.display()))?;
        Ok(Self { file })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Write `bytes` next to `path`, flush, then rename over it
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let staging = sibling(path, "tmp");
    let mut file = File::create(&staging)
        .with_context(|| format!("Failed to create {}", staging.display()))?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .with_context(|| format!("Failed to write {}", staging.display()))?;

    if let Err(e) = std::fs::rename(&staging, path) {
        let _ = std::fs::remove_file(&staging);
        return Err(e)
            .with_context(|| format!("Failed to replace config file: {}", path.display()));
    }
    Ok(())
}

/// `config.toml` -> `config.toml.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
