//! Root folder resolution and TOML configuration file loading
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. `root_folder` key of the TOML config file
//! 4. OS-dependent compiled default (fallback)

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "SIGNAGE_ROOT_FOLDER";

/// Environment variable naming an explicit config file
pub const CONFIG_FILE_ENV: &str = "SIGNAGE_CONFIG";

const APP_DIR: &str = "signage";
const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "signage.db";
const LOG_FILE_NAME: &str = "signage.log";
const CONTENT_DIR_NAME: &str = "content";

/// Resolves the root folder following the priority order above
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    config_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root folder passed on the command line
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Root folder read from the TOML config file
    pub fn with_config_value(mut self, path: Option<PathBuf>) -> Self {
        self.config_value = path;
        self
    }

    /// Resolve the root folder (never fails: falls back to the compiled default)
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.config_value {
            return path.clone();
        }

        default_root_folder()
    }
}

/// Creates the root folder and names the files inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root folder (and parents) if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root.exists() {
            info!("Creating root folder: {}", self.root.display());
            std::fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    /// Path of the content registry database
    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE_NAME)
    }

    /// Path of the log file
    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE_NAME)
    }

    /// Directory holding stored content files
    pub fn content_dir(&self) -> PathBuf {
        self.root.join(CONTENT_DIR_NAME)
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/signage (or /var/lib/signage for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("/var/lib/signage"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/signage"))
    } else {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("./signage_data"))
    }
}

/// Locate the config file: explicit path, then `SIGNAGE_CONFIG`, then the
/// user config dir, then `/etc/signage/config.toml` on Linux
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load a TOML config file into `T`
///
/// A missing file is not an error: the caller gets `T::default()` and a
/// warning is logged. A file that exists but does not parse is an error.
pub fn load_toml_or_default<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        warn!("No config file found, using defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<T>(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    info!("Loaded config file {}", path.display());
    Ok(config)
}
