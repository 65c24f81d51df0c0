//! Configuration for shelf paths and the metadata lookup service.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SHELF_HOME, SHELF_CATALOG)
//! 2. Config file (.shelf/config.yaml)
//! 3. Defaults (~/.shelf, catalog at <home>/catalog.json)
//!
//! Config file discovery:
//! - Searches current directory and parents for .shelf/config.yaml
//! - Paths in config file are relative to the config file's parent directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub lookup: Option<LookupConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to the .shelf/ directory)
    pub home: Option<String>,
    /// Catalog file (relative to home)
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to shelf home (state directory)
    pub home: PathBuf,
    /// Absolute path to the catalog file
    pub catalog: PathBuf,
    /// Metadata lookup settings
    pub lookup: LookupSettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LookupSettings {
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            endpoint: crate::resolver::open_library::DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: 10,
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".shelf").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to a base directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".shelf");

    let config_file = find_config_file();

    let (home, catalog, lookup) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // home is relative to the .shelf/ directory
        let shelf_dir = config_path.parent().unwrap_or(Path::new("."));

        let home = if let Ok(env_home) = std::env::var("SHELF_HOME") {
            PathBuf::from(env_home)
        } else if let Some(ref home_path) = config.paths.home {
            resolve_path(shelf_dir, home_path)
        } else {
            default_home.clone()
        };

        let catalog = if let Ok(env_catalog) = std::env::var("SHELF_CATALOG") {
            PathBuf::from(env_catalog)
        } else if let Some(ref catalog_path) = config.paths.catalog {
            resolve_path(&home, catalog_path)
        } else {
            home.join("catalog.json")
        };

        let defaults = LookupSettings::default();
        let lookup = LookupSettings {
            endpoint: config
                .lookup
                .as_ref()
                .and_then(|l| l.endpoint.clone())
                .unwrap_or(defaults.endpoint),
            timeout_seconds: config
                .lookup
                .as_ref()
                .and_then(|l| l.timeout_seconds)
                .unwrap_or(defaults.timeout_seconds),
        };

        (home, catalog, lookup)
    } else {
        let home = std::env::var("SHELF_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home.clone());

        let catalog = std::env::var("SHELF_CATALOG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join("catalog.json"));

        (home, catalog, LookupSettings::default())
    };

    Ok(ResolvedConfig {
        home,
        catalog,
        lookup,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the shelf home directory
pub fn shelf_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the catalog file path
pub fn catalog_path() -> Result<PathBuf> {
    Ok(config()?.catalog.clone())
}
