//! Application configuration management.
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. TOML file: `--config PATH`, or `config.toml` in the platform config
//!    directory (`~/.config/dupecmp` on Linux)
//! 3. Environment variables prefixed with `DUPECMP_` (e.g. `DUPECMP_MAX_OPEN_FILES=4`)
//! 4. Command-line flags
//!
//! # Example
//!
//! ```toml
//! max_buffer = 65536
//! max_open_files = 32
//! min_size = 1
//! same_fs = true
//! output = "json"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, OutputFormat};
use crate::compare::{CompareConfig, DEFAULT_MAX_OPEN_FILES, DEFAULT_TOTAL_BUFFER, MIN_BUFFER_PER_FILE};
use crate::duplicates::FinderConfig;
use crate::scanner::WalkerConfig;

/// Prefix of environment variables read into [`Config`].
pub const ENV_PREFIX: &str = "DUPECMP_";

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly named configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// A configuration source could not be parsed.
    #[error("Invalid configuration{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    Invalid {
        /// File that failed, if the failure came from a file
        path: Option<PathBuf>,
        /// Underlying figment error
        #[source]
        source: Box<figment::Error>,
    },

    /// A setting holds a value the scanner cannot use.
    #[error("Invalid setting: {0}")]
    InvalidValue(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Total comparison buffer per size group, in bytes.
    pub max_buffer: usize,
    /// Maximum number of open files per size group.
    pub max_open_files: usize,
    /// Smallest file size considered, in bytes.
    pub min_size: u64,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Stay on the file system of each root.
    pub same_fs: bool,
    /// Number of size groups compared concurrently.
    pub io_threads: usize,
    /// Report format.
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_buffer: DEFAULT_TOTAL_BUFFER,
            max_open_files: DEFAULT_MAX_OPEN_FILES,
            min_size: 1,
            follow_symlinks: false,
            same_fs: false,
            io_threads: 1,
            output: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Platform-specific default configuration file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupecmp").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Build the layered figment: defaults, then `file` (if any), then env.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load configuration from files and environment.
    ///
    /// With `explicit` set, that file must exist and parse. Otherwise the
    /// default path is tried, and a broken default file is logged and
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the explicit file is missing or invalid,
    /// when the environment holds unparsable values, or when the result
    /// fails [`validate`](Self::validate).
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                log::debug!("Loading configuration from {}", path.display());
                Self::figment(Some(path))
                    .extract()
                    .map_err(|e| ConfigError::Invalid {
                        path: Some(path.to_path_buf()),
                        source: Box::new(e),
                    })?
            }
            None => Self::load_default()?,
        };
        config.validate()?;
        Ok(config)
    }

    fn load_default() -> Result<Self, ConfigError> {
        let default_path = Self::default_path().filter(|p| p.is_file());
        if let Some(ref path) = default_path {
            match Self::figment(Some(path)).extract() {
                Ok(config) => {
                    log::debug!("Loaded configuration from {}", path.display());
                    return Ok(config);
                }
                Err(e) => {
                    log::debug!("Ignoring configuration in {}: {}", path.display(), e);
                }
            }
        }
        Self::figment(None)
            .extract()
            .map_err(|e| ConfigError::Invalid {
                path: None,
                source: Box::new(e),
            })
    }

    /// Override settings with the flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(max_buffer) = cli.max_buffer {
            self.max_buffer = max_buffer;
        }
        if let Some(max_open_files) = cli.max_open_files {
            self.max_open_files = max_open_files;
        }
        if let Some(min_size) = cli.min_size {
            self.min_size = min_size;
        }
        if let Some(io_threads) = cli.io_threads {
            self.io_threads = io_threads;
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        self.follow_symlinks |= cli.follow_symlinks;
        self.same_fs |= cli.same_fs;
    }

    /// Check the settings the command line parser would have rejected.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_buffer < MIN_BUFFER_PER_FILE {
            return Err(ConfigError::InvalidValue(format!(
                "max_buffer must be at least {MIN_BUFFER_PER_FILE} bytes, got {}",
                self.max_buffer
            )));
        }
        if self.max_open_files == 0 {
            return Err(ConfigError::InvalidValue(
                "max_open_files must be at least 1".to_string(),
            ));
        }
        if self.io_threads == 0 {
            return Err(ConfigError::InvalidValue(
                "io_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Comparison limits for each size group.
    #[must_use]
    pub fn compare_config(&self) -> CompareConfig {
        CompareConfig::default()
            .with_total_buffer(self.max_buffer)
            .with_max_open_files(self.max_open_files)
    }

    /// Directory traversal settings.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(self.follow_symlinks, self.same_fs, self.min_size)
    }

    /// Finder settings, without shutdown flag or progress callback.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_compare_config(self.compare_config())
            .with_walker_config(self.walker_config())
            .with_io_threads(self.io_threads)
    }
}
