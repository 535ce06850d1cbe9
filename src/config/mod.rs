//! Configuration management.
//!
//! Configuration is read from a TOML file with environment overrides of the
//! form `BIBSHELF__SECTION__KEY` (e.g. `BIBSHELF__MAIN__DOC_ADD=link`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [main]
//! pubsdir = "~/.bibshelf"
//! doc_add = "copy"        # copy | move | link
//! edit_cmd = ""           # empty: $VISUAL, then $EDITOR, then vi
//!
//! [resolvers]
//! doi_url = "https://doi.org"
//! isbn_url = "https://openlibrary.org"
//! arxiv_url = "http://export.arxiv.org/api/query"
//! timeout_secs = 30
//! max_retries = 3
//!
//! [logging]
//! level = "warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sources::{ARXIV_API_URL, DOI_BASE_URL, OPEN_LIBRARY_BASE_URL};
use crate::utils::DEFAULT_TIMEOUT_SECS;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "BIBSHELF_CONFIG";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Repository and document settings
    #[serde(default)]
    pub main: MainConfig,

    /// Identifier resolver settings
    #[serde(default)]
    pub resolvers: ResolversConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How a document file enters the repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocAddMode {
    /// Copy the file into repository storage
    #[default]
    Copy,
    /// Copy the file into repository storage, then delete the original
    Move,
    /// Record a reference to the original file
    Link,
}

/// Repository configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainConfig {
    /// Repository root; a leading `~` is expanded
    #[serde(default = "default_pubsdir")]
    pub pubsdir: PathBuf,

    /// Default document policy when `add` is given no explicit choice
    #[serde(default)]
    pub doc_add: DocAddMode,

    /// Editor command for interactive input
    #[serde(default)]
    pub edit_cmd: String,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            pubsdir: default_pubsdir(),
            doc_add: DocAddMode::default(),
            edit_cmd: String::new(),
        }
    }
}

impl MainConfig {
    /// Repository root with `~` expanded
    pub fn repository_dir(&self) -> PathBuf {
        expand_tilde(&self.pubsdir)
    }

    /// Editor command: configured value, then `$VISUAL`, then `$EDITOR`, then `vi`
    pub fn editor_command(&self) -> String {
        if !self.edit_cmd.trim().is_empty() {
            return self.edit_cmd.clone();
        }
        ["VISUAL", "EDITOR"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|cmd| !cmd.trim().is_empty())
            .unwrap_or_else(|| "vi".to_string())
    }
}

fn default_pubsdir() -> PathBuf {
    PathBuf::from("~/.bibshelf")
}

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolversConfig {
    #[serde(default = "default_doi_url")]
    pub doi_url: String,

    #[serde(default = "default_isbn_url")]
    pub isbn_url: String,

    #[serde(default = "default_arxiv_url")]
    pub arxiv_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ResolversConfig {
    fn default() -> Self {
        Self {
            doi_url: default_doi_url(),
            isbn_url: default_isbn_url(),
            arxiv_url: default_arxiv_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_doi_url() -> String {
    DOI_BASE_URL.to_string()
}

fn default_isbn_url() -> String {
    OPEN_LIBRARY_BASE_URL.to_string()
}

fn default_arxiv_url() -> String {
    ARXIV_API_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    2
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    build(Some(path))
}

/// Configuration from environment overrides and defaults only
pub fn get_config() -> Result<Config, ConfigError> {
    build(None)
}

fn build(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = ::config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(::config::File::from(path).required(true));
    }
    let settings = builder
        .add_source(::config::Environment::with_prefix("BIBSHELF").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Write configuration to a TOML file, creating parent directories
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}

/// Default location of the config file (`~/.config/bibshelf/config.toml` on Linux)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("bibshelf")
        .join("config.toml")
}

/// Config file to use when none is given on the command line
///
/// `$BIBSHELF_CONFIG` wins; otherwise the default location if it exists.
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    let path = default_config_path();
    path.exists().then_some(path)
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
