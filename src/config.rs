use crate::schema::Schema;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// JSON model artifact used by `calculate`
    pub model_path: PathBuf,
    /// Table of per-feature `min`/`max` bounds
    pub norm_params_path: PathBuf,
    /// Single-row defaults file loaded at startup, if it exists
    pub defaults_path: Option<PathBuf>,
    /// Overrides the platform log directory
    pub log_dir: Option<PathBuf>,
    pub schema: Schema,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.json"),
            norm_params_path: PathBuf::from("normalization_params.csv"),
            defaults_path: None,
            log_dir: None,
            schema: Schema::standard(),
        }
    }
}

impl AppSettings {
    /// Makes relative resource paths relative to `base` instead of the
    /// working directory.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.model_path);
        resolve(&mut self.norm_params_path);
        if let Some(p) = self.defaults_path.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.log_dir.as_mut() {
            resolve(p);
        }
    }
}

/// `<config dir>/scoretable/config.json`, or `./config.json` when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("scoretable"))
        .unwrap_or_default()
        .join("config.json")
}

/// Reads settings from `path`, falling back to defaults when the file is
/// missing or unreadable. Relative paths inside the file resolve against the
/// file's directory.
pub fn load_app_config(path: &Path) -> AppSettings {
    let mut settings = if path.exists()
        && let Ok(content) = std::fs::read_to_string(path)
        && let Ok(settings) = serde_json::from_str::<AppSettings>(&content)
    {
        settings
    } else {
        if path.exists() {
            tracing::warn!(path = %path.display(), "config file unreadable, using defaults");
        }
        AppSettings::default()
    };

    if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        settings.resolve_paths(base);
    }
    settings
}

pub fn save_app_config(path: &Path, settings: &AppSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config {}", path.display()))?;
    Ok(())
}
