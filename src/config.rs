//! Configuration file support for adrman
//!
//! Two files are involved:
//! - `.adr.json` in the working directory describes one repository
//!   (language, records directory, index prefix and width, active template)
//! - `~/.adrman.toml` holds per-user settings (default editor, central store)

use crate::error::{AdrError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the repository configuration file.
pub const CONFIG_FILE_NAME: &str = ".adr.json";

/// Name of the user configuration file in the home directory.
pub const USER_CONFIG_FILE_NAME: &str = ".adrman.toml";

/// Repository configuration, stored as JSON:
/// `{"language":"en","path":"docs/adr/","prefix":"","digits":4,"template":"template-short.md"}`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RepoConfig {
    /// Language of the generated templates
    #[serde(default = "default_language")]
    pub language: String,

    /// Directory holding the records, relative to the repository root
    #[serde(default = "default_path")]
    pub path: String,

    /// Literal string put in front of every index in filenames
    #[serde(default)]
    pub prefix: String,

    /// Width of the zero-padded index
    #[serde(default = "default_digits")]
    pub digits: usize,

    /// Template file (inside `path`) used by `new` when none is given
    #[serde(default = "default_template", rename = "template")]
    pub template_name: String,

    /// Keep a `.bak` copy of a record before its status section is rewritten
    #[serde(default, skip_serializing_if = "is_false")]
    pub backup: bool,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_path() -> String {
    "docs/adr/".to_string()
}

fn default_digits() -> usize {
    4
}

fn default_template() -> String {
    "template-short.md".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            path: default_path(),
            prefix: String::new(),
            digits: default_digits(),
            template_name: default_template(),
            backup: false,
        }
    }
}

impl RepoConfig {
    /// Location of the configuration file for a repository rooted at `root`.
    pub fn file_path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE_NAME)
    }

    /// Load `.adr.json` from `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::file_path(root);
        if !path.is_file() {
            return Err(AdrError::ConfigNotFound { path });
        }
        let contents = fs::read_to_string(&path).map_err(|e| AdrError::io(&path, e))?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| AdrError::InvalidConfig {
            path: path.clone(),
            source,
        })?;
        config.validate(&path)?;
        Ok(config)
    }

    /// Reject values no record filename could be built from.
    pub fn validate(&self, path: &Path) -> Result<()> {
        if self.digits == 0 {
            return Err(AdrError::InvalidConfigValue {
                path: path.to_path_buf(),
                reason: "digits must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Write `.adr.json` into `root`.
    pub fn store(&self, root: &Path) -> Result<()> {
        let path = Self::file_path(root);
        let json = serde_json::to_string_pretty(self).map_err(|source| AdrError::InvalidConfig {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|e| AdrError::io(&path, e))
    }

    /// Absolute records directory for a repository rooted at `root`.
    pub fn documents_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.path)
    }
}

/// Per-user settings
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct UserConfig {
    /// Editor command used by `adrman edit` when `--editor` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    /// Path of a central record store shared between projects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_store: Option<String>,
}

impl UserConfig {
    /// Load `~/.adrman.toml`.
    /// Returns the default config if the file doesn't exist or can't be parsed
    pub fn load() -> Self {
        Self::path().map(|p| Self::load_from(&p)).unwrap_or_default()
    }

    /// Load from an explicit path, with the same fallback as [`UserConfig::load`].
    pub fn load_from(path: &Path) -> Self {
        if let Ok(contents) = fs::read_to_string(path) {
            if let Ok(config) = toml::from_str(&contents) {
                return config;
            }
        }
        Self::default()
    }

    /// Location of the user configuration file
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(USER_CONFIG_FILE_NAME))
    }

    /// Write to an explicit path.
    pub fn store_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| {
            AdrError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        fs::write(path, contents).map_err(|e| AdrError::io(path, e))
    }
}
