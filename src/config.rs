//! Configuration file handling.
//!
//! The config is optional TOML. Lookup order:
//! 1. `$RUSTDOC_IMPLEMENTORS_CONFIG`
//! 2. `<user config dir>/rustdoc-implementors.toml`
//!
//! A missing file yields [`Config::default`].

use crate::error::ConfigError;
use crate::types::MergePolicy;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RUSTDOC_IMPLEMENTORS_CONFIG";

const CONFIG_FILE_NAME: &str = "rustdoc-implementors.toml";
const DEFAULT_SEARCH_LIMIT: usize = 25;
const DEFAULT_CACHE_DIR: &str = ".implementors-cache";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation root (the directory holding `implementors/`).
    /// Discovered from the working directory when unset.
    pub doc_root: Option<PathBuf>,
    /// How pages combine repeated registrations of a group.
    pub merge_policy: MergePolicy,
    /// Where loaded indexes are cached. Defaults to `<doc_root>/.implementors-cache`.
    pub cache_dir: Option<PathBuf>,
    /// Set to `false` to always re-parse fragments.
    pub use_cache: bool,
    /// Default maximum number of search results.
    pub search_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            doc_root: None,
            merge_policy: MergePolicy::default(),
            cache_dir: None,
            use_cache: true,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Config {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load the config from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load the config from the standard locations.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// The config file location: the environment override, else the user config dir.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(explicit));
        }
        dirs::config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
    }

    /// The configured doc root with `~` expanded.
    pub fn doc_root(&self) -> Option<PathBuf> {
        self.doc_root
            .as_deref()
            .map(|path| PathBuf::from(expand_tilde(&path.to_string_lossy()).as_ref()))
    }

    /// The cache directory for a given doc root.
    pub fn cache_dir_for(&self, doc_root: &Path) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => PathBuf::from(expand_tilde(&dir.to_string_lossy()).as_ref()),
            None => doc_root.join(DEFAULT_CACHE_DIR),
        }
    }
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
///
/// Returns `Cow::Borrowed` if no expansion needed, `Cow::Owned` if expanded.
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}
