//! core::config::schema
//!
//! Configuration schema types.
//!
//! Both scopes (global and local) share one file format; the local file
//! only needs to set the keys it overrides.
//!
//! # Validation
//!
//! Config values are validated after parsing so that a bad page size or
//! URL is reported at load time, not halfway through a harvest.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Largest page size the issue search API accepts.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Result ceiling enforced by the issue search API.
pub const SERVER_RESULT_CEILING: usize = 10_000;

/// A configuration file.
///
/// # Example
///
/// ```toml
/// base_url = "https://sonarcloud.io"
/// organization = "my-org"
///
/// [harvest]
/// page_delay_ms = 250
/// max_rate_limit_retries = 20
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Server base URL (SonarCloud or a self-hosted SonarQube)
    pub base_url: Option<String>,

    /// Default organization for project listing
    pub organization: Option<String>,

    /// Harvest tuning
    pub harvest: Option<HarvestTuning>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "base_url '{}' must start with http:// or https://",
                    url
                )));
            }
        }

        if let Some(org) = &self.organization {
            if org.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "organization cannot be empty".into(),
                ));
            }
        }

        if let Some(harvest) = &self.harvest {
            harvest.validate()?;
        }

        Ok(())
    }
}

/// Harvest tuning knobs.
///
/// Unset values fall back to the defaults documented on each accessor of
/// [`super::Config`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestTuning {
    /// Issues per page (max 500)
    pub page_size: Option<u32>,

    /// Result ceiling for one query
    pub ceiling: Option<usize>,

    /// Courtesy delay between pages, in milliseconds
    pub page_delay_ms: Option<u64>,

    /// Backoff after a 429 response, in milliseconds
    pub rate_limit_backoff_ms: Option<u64>,

    /// Consecutive 429 retries allowed for one page (unset = unbounded)
    pub max_rate_limit_retries: Option<u32>,

    /// Per-request timeout, in seconds
    pub request_timeout_secs: Option<u64>,

    /// Width of a date segmentation window, in days
    pub window_days: Option<u32>,

    /// Project size at which the severity x type fallback runs
    pub cross_product_threshold: Option<usize>,
}

impl HarvestTuning {
    /// Validate the tuning values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(size) = self.page_size {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(ConfigError::InvalidValue(format!(
                    "harvest.page_size must be between 1 and {}, got {}",
                    MAX_PAGE_SIZE, size
                )));
            }
        }

        if let Some(ceiling) = self.ceiling {
            if ceiling == 0 || ceiling > SERVER_RESULT_CEILING {
                return Err(ConfigError::InvalidValue(format!(
                    "harvest.ceiling must be between 1 and the server limit of {}, got {}",
                    SERVER_RESULT_CEILING, ceiling
                )));
            }
        }

        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "harvest.request_timeout_secs must be at least 1".into(),
            ));
        }

        if self.window_days == Some(0) {
            return Err(ConfigError::InvalidValue(
                "harvest.window_days must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
