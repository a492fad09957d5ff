//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! sonar-harvest has two configuration scopes:
//! - **Global**: User-level settings
//! - **Local**: Overrides for the working directory
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Local config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$SONAR_HARVEST_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/sonar-harvest/config.toml`
//! 3. `~/.sonar-harvest/config.toml`
//!
//! # Local Config Location
//!
//! `.sonar-harvest.toml` in the working directory.
//!
//! The token is never read from config files.
//!
//! # Example
//!
//! ```no_run
//! use sonar_harvest::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("."))).unwrap();
//! let config = result.config;
//!
//! println!("Server: {}", config.base_url());
//! println!("Ceiling: {}", config.ceiling());
//! ```

pub mod schema;

pub use schema::{ConfigFile, HarvestTuning, MAX_PAGE_SIZE, SERVER_RESULT_CEILING};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default server.
pub const DEFAULT_BASE_URL: &str = "https://sonarcloud.io";

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "SONAR_HARVEST_CONFIG";

/// File name of the local config.
pub const LOCAL_CONFIG_FILE: &str = ".sonar-harvest.toml";

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

/// Merged configuration from all sources.
///
/// Accessors apply precedence automatically: local overrides global,
/// global overrides built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// Local configuration (if present)
    pub local: Option<ConfigFile>,
    global_path: Option<PathBuf>,
    local_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `cwd` is provided, also loads `.sonar-harvest.toml` from it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(cwd: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let global_path = Self::find_global();
        Self::load_from(global_path.as_deref(), cwd)
    }

    /// Load configuration from an explicit global file and local directory.
    pub fn load_from(
        global_path: Option<&Path>,
        cwd: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = match global_path {
            Some(path) if path.exists() => (Self::read_config(path)?, Some(path.to_path_buf())),
            _ => (ConfigFile::default(), None),
        };

        let (local, local_path) = match cwd.map(|dir| dir.join(LOCAL_CONFIG_FILE)) {
            Some(path) if path.exists() => (Some(Self::read_config(&path)?), Some(path)),
            _ => (None, None),
        };

        global.validate()?;
        if let Some(ref l) = local {
            l.validate()?;
        }

        for (file, path) in [(Some(&global), &global_path), (local.as_ref(), &local_path)] {
            if let (Some(file), Some(path)) = (file, path) {
                Self::collect_warnings(file, path, &mut warnings);
            }
        }

        let config = Config {
            global,
            local,
            global_path,
            local_path,
        };
        config.validate_effective()?;

        Ok(ConfigLoadResult { config, warnings })
    }

    /// Locate the global config file, if any.
    fn find_global() -> Option<PathBuf> {
        // 1. Check $SONAR_HARVEST_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/sonar-harvest/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("sonar-harvest/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.sonar-harvest/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".sonar-harvest/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn collect_warnings(file: &ConfigFile, path: &Path, warnings: &mut Vec<ConfigWarning>) {
        let Some(harvest) = &file.harvest else {
            return;
        };

        if harvest.page_delay_ms == Some(0) {
            warnings.push(ConfigWarning {
                message: "harvest.page_delay_ms is 0; expect more rate limiting".into(),
                path: path.to_path_buf(),
            });
        }
    }

    /// Validate settings that only make sense together, after global and
    /// local values are merged.
    pub fn validate_effective(&self) -> Result<(), ConfigError> {
        let page_size = self.page_size() as usize;
        let ceiling = self.ceiling();
        if ceiling < page_size {
            return Err(ConfigError::InvalidValue(format!(
                "harvest.ceiling ({}) cannot be smaller than the page size ({})",
                ceiling, page_size
            )));
        }
        Ok(())
    }

    fn tuning<T>(&self, pick: impl Fn(&HarvestTuning) -> Option<T>) -> Option<T> {
        self.local
            .as_ref()
            .and_then(|l| l.harvest.as_ref())
            .and_then(&pick)
            .or_else(|| self.global.harvest.as_ref().and_then(&pick))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Server base URL, without a trailing slash.
    ///
    /// Defaults to `https://sonarcloud.io`.
    pub fn base_url(&self) -> &str {
        self.local
            .as_ref()
            .and_then(|l| l.base_url.as_deref())
            .or(self.global.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// Default organization for project listing.
    pub fn organization(&self) -> Option<&str> {
        self.local
            .as_ref()
            .and_then(|l| l.organization.as_deref())
            .or(self.global.organization.as_deref())
    }

    /// Issues per page. Defaults to 500.
    pub fn page_size(&self) -> u32 {
        self.tuning(|t| t.page_size).unwrap_or(MAX_PAGE_SIZE)
    }

    /// Result ceiling per query. Defaults to 10,000.
    pub fn ceiling(&self) -> usize {
        self.tuning(|t| t.ceiling).unwrap_or(SERVER_RESULT_CEILING)
    }

    /// Delay between pages. Defaults to 100 ms.
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.tuning(|t| t.page_delay_ms).unwrap_or(100))
    }

    /// Backoff after a 429. Defaults to 2000 ms.
    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.tuning(|t| t.rate_limit_backoff_ms).unwrap_or(2000))
    }

    /// Consecutive 429 retries allowed for one page. Defaults to unbounded.
    pub fn max_rate_limit_retries(&self) -> Option<u32> {
        self.tuning(|t| t.max_rate_limit_retries)
    }

    /// Per-request timeout. Defaults to 30 s.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.tuning(|t| t.request_timeout_secs).unwrap_or(30))
    }

    /// Segmentation window width in days. Defaults to 30.
    pub fn window_days(&self) -> u32 {
        self.tuning(|t| t.window_days).unwrap_or(30)
    }

    /// Project size that triggers the severity x type fallback. Defaults to 40,000.
    pub fn cross_product_threshold(&self) -> usize {
        self.tuning(|t| t.cross_product_threshold).unwrap_or(40_000)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded local config file.
    pub fn local_config_loaded_from(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    /// The effective configuration as a single file, with defaults filled in.
    pub fn effective(&self) -> ConfigFile {
        ConfigFile {
            base_url: Some(self.base_url().to_string()),
            organization: self.organization().map(str::to_string),
            harvest: Some(HarvestTuning {
                page_size: Some(self.page_size()),
                ceiling: Some(self.ceiling()),
                page_delay_ms: Some(self.page_delay().as_millis() as u64),
                rate_limit_backoff_ms: Some(self.rate_limit_backoff().as_millis() as u64),
                max_rate_limit_retries: self.max_rate_limit_retries(),
                request_timeout_secs: Some(self.request_timeout().as_secs()),
                window_days: Some(self.window_days()),
                cross_product_threshold: Some(self.cross_product_threshold()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_empty_defaults() {
        let temp = TempDir::new().unwrap();
        let result = Config::load_from(None, Some(temp.path())).unwrap();
        let config = result.config;

        assert_eq!(config.base_url(), "https://sonarcloud.io");
        assert!(config.organization().is_none());
        assert_eq!(config.page_size(), 500);
        assert_eq!(config.ceiling(), 10_000);
        assert_eq!(config.page_delay(), Duration::from_millis(100));
        assert_eq!(config.rate_limit_backoff(), Duration::from_millis(2000));
        assert_eq!(config.max_rate_limit_retries(), None);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.window_days(), 30);
        assert_eq!(config.cross_product_threshold(), 40_000);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn load_global_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            organization = "acme"

            [harvest]
            window_days = 14
            "#,
        )
        .unwrap();

        let result = Config::load_from(Some(&path), None).unwrap();
        let config = result.config;

        assert_eq!(config.organization(), Some("acme"));
        assert_eq!(config.window_days(), 14);
        assert_eq!(config.global_config_loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn local_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        fs::write(
            &global,
            r#"
            base_url = "https://global.example.com/"
            [harvest]
            window_days = 14
            page_delay_ms = 300
            "#,
        )
        .unwrap();
        fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            r#"
            [harvest]
            window_days = 7
            "#,
        )
        .unwrap();

        let config = Config::load_from(Some(&global), Some(temp.path()))
            .unwrap()
            .config;

        assert_eq!(config.window_days(), 7);
        assert_eq!(config.page_delay(), Duration::from_millis(300));
        assert_eq!(config.base_url(), "https://global.example.com");
        assert!(config.local_config_loaded_from().is_some());
    }

    #[test]
    fn ceiling_above_server_limit_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            "[harvest]\nceiling = 20000\n",
        )
        .unwrap();

        let result = Config::load_from(None, Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::InvalidValue(ref m)) if m.contains("server limit")));
    }

    #[test]
    fn merged_ceiling_below_page_size_rejected() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        fs::write(&global, "[harvest]\nceiling = 200\n").unwrap();
        fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            "[harvest]\npage_size = 300\n",
        )
        .unwrap();

        let result = Config::load_from(Some(&global), Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::InvalidValue(ref m)) if m.contains("ceiling (200)")));
    }

    #[test]
    fn split_page_size_and_ceiling_validated_together() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        fs::write(&global, "[harvest]\nceiling = 1000\n").unwrap();
        fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            "[harvest]\npage_size = 300\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&global), Some(temp.path()))
            .unwrap()
            .config;
        assert_eq!(config.page_size(), 300);
        assert_eq!(config.ceiling(), 1000);

        // Global ceiling smaller than the default page size is fine once the
        // local page size is applied
        fs::write(&global, "[harvest]\nceiling = 200\n").unwrap();
        fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            "[harvest]\npage_size = 100\n",
        )
        .unwrap();
        assert!(Config::load_from(Some(&global), Some(temp.path())).is_ok());
    }

    #[test]
    fn invalid_value_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            "[harvest]\npage_size = 1000\n",
        )
        .unwrap();

        let result = Config::load_from(None, Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            "token = \"should-not-live-here\"\n",
        )
        .unwrap();

        let result = Config::load_from(None, Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn effective_fills_defaults() {
        let effective = Config::default().effective();
        let harvest = effective.harvest.unwrap();
        assert_eq!(effective.base_url.as_deref(), Some(DEFAULT_BASE_URL));
        assert_eq!(harvest.page_size, Some(500));
        assert_eq!(harvest.max_rate_limit_retries, None);
        assert!(toml::to_string_pretty(&Config::default().effective()).is_ok());
    }
}
