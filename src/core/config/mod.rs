//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here, see [`Config::with_repository`])
//!
//! # Config Locations
//!
//! Searched in order, the first existing file wins:
//! 1. `--config <path>` (must exist)
//! 2. `$GITBLOG_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/gitblog/config.toml`
//! 4. `~/.gitblog/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use gitblog::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//!
//! println!("Default branch: {}", config.default_branch());
//! println!("Page length: {}", config.page_length());
//! ```

pub mod schema;

pub use schema::{CacheConfig, FileConfig, SiteConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::types::BranchName;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "GITBLOG_CONFIG";

const DEFAULT_BRANCH: &str = "master";
const DEFAULT_RESOLVE_TTL_MS: u64 = 1000;
const DEFAULT_RETENTION_SECS: u64 = 300;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_TITLE: &str = "Git based blogging";
const DEFAULT_LOGO: &str = "BL<br/>OG";
const DEFAULT_PAGE_LENGTH: usize = 20;
const DEFAULT_GIT_URL: &str = "http://localhost/blog.git";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Validated configuration with defaults applied by the accessors.
#[derive(Debug, Clone)]
pub struct Config {
    file: FileConfig,
    default_branch: BranchName,
    repository: Option<PathBuf>,
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` is missing, or if the file found
    /// cannot be read, parsed or validated. No file at all is not an error
    /// (defaults are used).
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(
                std::env::var_os(CONFIG_ENV).map(PathBuf::from),
                std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
                dirs::home_dir(),
                &mut warnings,
            ),
        };

        let config = match path {
            Some(path) => {
                let file = Self::read_file(&path)?;
                let mut config = Self::from_file(file)?;
                config.loaded_from = Some(path);
                config
            }
            None => Self::from_file(FileConfig::default())?,
        };

        Ok(ConfigLoadResult { config, warnings })
    }

    /// Validate parsed file contents into a config.
    pub fn from_file(file: FileConfig) -> Result<Self, ConfigError> {
        file.validate()?;

        let default_branch = BranchName::new(file.default_branch.as_deref().unwrap_or(DEFAULT_BRANCH))
            .map_err(|e| ConfigError::InvalidValue(format!("invalid default branch name: {}", e)))?;

        Ok(Self {
            repository: file.repository.clone(),
            default_branch,
            file,
            loaded_from: None,
        })
    }

    /// Pick the first existing candidate file.
    fn discover(
        env: Option<PathBuf>,
        xdg_home: Option<PathBuf>,
        home: Option<PathBuf>,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Option<PathBuf> {
        // 1. Check $GITBLOG_CONFIG
        if let Some(path) = env {
            if path.exists() {
                return Some(path);
            }
            warnings.push(ConfigWarning {
                message: format!("{CONFIG_ENV} points to a missing file, ignoring it"),
                path,
            });
        }

        // 2. Check $XDG_CONFIG_HOME/gitblog/config.toml
        if let Some(xdg_home) = xdg_home {
            let path = xdg_home.join("gitblog/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.gitblog/config.toml
        if let Some(home) = home {
            let path = home.join(".gitblog/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read and parse a config file.
    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Override the repository path (e.g. from `--repo`).
    pub fn with_repository(mut self, path: impl Into<PathBuf>) -> Self {
        self.repository = Some(path.into());
        self
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Repository path, if configured.
    pub fn repository(&self) -> Option<&Path> {
        self.repository.as_deref()
    }

    /// Branch served for the default reference.
    ///
    /// Defaults to "master".
    pub fn default_branch(&self) -> &BranchName {
        &self.default_branch
    }

    fn cache(&self) -> Option<&CacheConfig> {
        self.file.cache.as_ref()
    }

    fn site(&self) -> Option<&SiteConfig> {
        self.file.site.as_ref()
    }

    /// Validity window of branch resolutions. Zero disables caching.
    ///
    /// Defaults to one second.
    pub fn resolve_ttl(&self) -> Duration {
        Duration::from_millis(
            self.cache()
                .and_then(|c| c.resolve_ttl_ms)
                .unwrap_or(DEFAULT_RESOLVE_TTL_MS),
        )
    }

    /// How long a snapshot stays live.
    ///
    /// Defaults to five minutes.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(
            self.cache()
                .and_then(|c| c.retention_secs)
                .unwrap_or(DEFAULT_RETENTION_SECS),
        )
    }

    /// Period of the background sweep.
    ///
    /// Defaults to five minutes.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.cache()
                .and_then(|c| c.sweep_interval_secs)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        )
    }

    /// Site title.
    pub fn title(&self) -> &str {
        self.site()
            .and_then(|s| s.title.as_deref())
            .unwrap_or(DEFAULT_TITLE)
    }

    /// Logo HTML.
    pub fn logo(&self) -> &str {
        self.site()
            .and_then(|s| s.logo.as_deref())
            .unwrap_or(DEFAULT_LOGO)
    }

    /// Documents per index page.
    ///
    /// Defaults to 20.
    pub fn page_length(&self) -> usize {
        self.site()
            .and_then(|s| s.page_length)
            .unwrap_or(DEFAULT_PAGE_LENGTH)
    }

    /// Clone URL shown in page headers.
    pub fn git_url(&self) -> &str {
        self.site()
            .and_then(|s| s.git_url.as_deref())
            .unwrap_or(DEFAULT_GIT_URL)
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}
