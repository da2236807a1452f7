//! core::config::schema
//!
//! Configuration schema types.
//!
//! Every field is optional in the file; accessors on
//! [`Config`](super::Config) supply the defaults.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., the default branch must be a valid branch name).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Configuration file contents.
///
/// # Example
///
/// ```toml
/// repository = "/srv/git/blog.git"
/// default_branch = "master"
///
/// [cache]
/// resolve_ttl_ms = 1000
/// retention_secs = 300
/// sweep_interval_secs = 300
///
/// [site]
/// title = "Git based blogging"
/// logo = "BL<br/>OG"
/// page_length = 20
/// git_url = "http://localhost/blog.git"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Path to the (possibly bare) repository
    pub repository: Option<PathBuf>,

    /// Branch served when no reference is given
    pub default_branch: Option<String>,

    /// Cache tuning
    pub cache: Option<CacheConfig>,

    /// Site presentation
    pub site: Option<SiteConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(branch) = &self.default_branch {
            BranchName::new(branch).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid default branch name: {}", e))
            })?;
        }

        if let Some(cache) = &self.cache {
            cache.validate()?;
        }

        if let Some(site) = &self.site {
            site.validate()?;
        }

        Ok(())
    }
}

/// Cache windows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// How long a branch resolution is trusted, in milliseconds (0 disables)
    pub resolve_ttl_ms: Option<u64>,

    /// How long a snapshot stays live, in seconds
    pub retention_secs: Option<u64>,

    /// How often expired snapshots are swept, in seconds
    pub sweep_interval_secs: Option<u64>,
}

impl CacheConfig {
    /// Validate the cache configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_interval_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// What the rendered pages show around the documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Page title
    pub title: Option<String>,

    /// Logo HTML, inserted unescaped
    pub logo: Option<String>,

    /// Documents per index page
    pub page_length: Option<usize>,

    /// Clone URL shown in the header
    pub git_url: Option<String>,
}

impl SiteConfig {
    /// Validate the site configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_length == Some(0) {
            return Err(ConfigError::InvalidValue(
                "page_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
