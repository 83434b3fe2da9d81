//! Tool settings: database locations, layer cache and launcher directory.
//!
//! Values come from an optional TOML file, then environment overrides, then
//! defaults derived from `GIMG_DIR`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::build_state::BuildStore;

pub const ENV_DIR: &str = "GIMG_DIR";
pub const ENV_CONFIG: &str = "GIMG_CONFIG";
pub const ENV_BUILD_DB: &str = "GIMG_BUILD_DB";
pub const ENV_FETCH_DB: &str = "GIMG_FETCH_DB";
pub const ENV_CACHE_DIR: &str = "GIMG_DIR_CACHE";
pub const ENV_LAUNCHER_DIR: &str = "GIMG_DIR_LAUNCHER";
pub const ENV_PORTAL: &str = "GIMG_PORTAL";

const CONFIG_FILENAME: &str = "gameimage.toml";
const BUILD_DB_FILENAME: &str = "gameimage.json";
const FETCH_DB_FILENAME: &str = "gameimage.fetch.json";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsToml {
    build_database: Option<PathBuf>,
    fetch_database: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    launcher_dir: Option<PathBuf>,
    portal: Option<PathBuf>,
}

/// Resolved settings. Only the directories that depend on the build
/// database stay optional until [`Settings::cache_dir_for`] /
/// [`Settings::launcher_dir`] are asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub build_database: PathBuf,
    pub fetch_database: PathBuf,
    pub cache_dir: Option<PathBuf>,
    pub launcher_dir: Option<PathBuf>,
    pub portal: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load settings from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let var = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };

        let base_dir = var(ENV_DIR).unwrap_or_else(|| PathBuf::from("."));

        let config_path = match var(ENV_CONFIG) {
            Some(path) => Some(path),
            None => Some(base_dir.join(CONFIG_FILENAME)).filter(|p| p.is_file()),
        };

        let file = match &config_path {
            Some(path) => load_toml(path)?,
            None => SettingsToml::default(),
        };
        let config_dir = config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let from_file = |value: Option<PathBuf>| value.map(|p| resolve_relative(&config_dir, p));

        Ok(Self {
            build_database: var(ENV_BUILD_DB)
                .or_else(|| from_file(file.build_database))
                .unwrap_or_else(|| base_dir.join(BUILD_DB_FILENAME)),
            fetch_database: var(ENV_FETCH_DB)
                .or_else(|| from_file(file.fetch_database))
                .unwrap_or_else(|| base_dir.join(FETCH_DB_FILENAME)),
            cache_dir: var(ENV_CACHE_DIR).or_else(|| from_file(file.cache_dir)),
            launcher_dir: var(ENV_LAUNCHER_DIR).or_else(|| from_file(file.launcher_dir)),
            portal: var(ENV_PORTAL).or_else(|| from_file(file.portal)),
        })
    }

    /// Platform layer cache: explicit setting, then the build database's
    /// cache directory, then the user cache dir, then `<build>/cache`.
    pub fn cache_dir_for(&self, store: &BuildStore) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        if let Some(dir) = store.path_dir_cache() {
            return dir.to_path_buf();
        }
        dirs::cache_dir()
            .map(|dir| dir.join("gameimage"))
            .unwrap_or_else(|| store.path_dir_build().join("cache"))
    }

    /// Directory holding the bundled launcher; defaults to our own install dir.
    pub fn launcher_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.launcher_dir {
            return Ok(dir.clone());
        }
        let exe = std::env::current_exe().context("resolving gameimage-package executable path")?;
        exe.parent()
            .map(Path::to_path_buf)
            .with_context(|| format!("executable '{}' has no parent directory", exe.display()))
    }
}

fn load_toml(path: &Path) -> Result<SettingsToml> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading settings '{}'", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing settings '{}'", path.display()))
}

fn resolve_relative(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
