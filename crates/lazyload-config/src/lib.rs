//! Configuration management for the lazy-load markup filter.
//!
//! Parses `lazyload.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! The hosting application can override file values during load via
//! [`HostSettings`], and obtains an immutable per-invocation [`Policy`]
//! snapshot through [`Config::policy`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "lazyload.toml";

/// Settings supplied by the hosting application that override configuration
/// file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct HostSettings {
    /// Override the master enabled flag.
    pub enabled: Option<bool>,
    /// Override image rewriting.
    pub images: Option<bool>,
    /// Override iframe rewriting.
    pub iframes: Option<bool>,
    /// Override the eligible content-type whitelist.
    pub content_types: Option<Vec<String>>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter behavior configuration.
    pub filter: FilterConfig,
    /// Emitted-markup marker configuration.
    pub markers: MarkerConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Filter behavior configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Master switch for the whole filter.
    pub enabled: bool,
    /// Whether `img` elements are rewritten.
    pub images: bool,
    /// Whether `iframe` elements are rewritten.
    pub iframes: bool,
    /// Content types eligible for whole-body rewriting.
    pub content_types: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            images: true,
            iframes: true,
            content_types: vec!["post".to_owned()],
        }
    }
}

/// Emitted-markup marker configuration.
///
/// These names are an integration contract with the client-side observer
/// library that consumes the transformed markup; the defaults match the
/// Lozad conventions.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MarkerConfig {
    /// Class token appended to rewritten elements.
    pub lazy_class: String,
    /// Class token that excludes an element from rewriting.
    pub skip_class: String,
    /// Class carried by the script placeholder element.
    pub placeholder_class: String,
    /// Per-document metadata key for the opt-out flag.
    pub opt_out_key: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            lazy_class: "lazy-load".to_owned(),
            skip_class: "no-lazy".to_owned(),
            placeholder_class: "lozad".to_owned(),
            opt_out_key: "lazyload_disable".to_owned(),
        }
    }
}

/// Immutable per-invocation rewrite policy.
///
/// A borrow-free snapshot of [`Config`] handed to the transformation
/// functions. Cheap to clone; safe to share across request-handling threads.
#[derive(Clone, Debug)]
pub struct Policy {
    /// Master switch for the whole filter.
    pub enabled: bool,
    /// Whether `img` elements are rewritten.
    pub images: bool,
    /// Whether `iframe` elements are rewritten.
    pub iframes: bool,
    /// Content types eligible for whole-body rewriting.
    pub content_types: Vec<String>,
    /// Emitted-markup markers.
    pub markers: MarkerConfig,
}

impl Default for Policy {
    fn default() -> Self {
        Config::default().policy()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a class-token field to be a single token.
///
/// Marker values are emitted inside `class` attributes, so embedded
/// whitespace would split them into multiple tokens.
fn require_class_token(value: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(value, field)?;
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "{field} cannot contain whitespace"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional host-application settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `lazyload.toml` in current directory and
    /// parents, falling back to defaults when no file exists.
    ///
    /// Host settings are applied after loading, allowing the hosting
    /// application to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        host_settings: Option<&HostSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = host_settings {
            config.apply_host_settings(settings);
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply host-application settings to the configuration.
    fn apply_host_settings(&mut self, settings: &HostSettings) {
        if let Some(enabled) = settings.enabled {
            self.filter.enabled = enabled;
        }
        if let Some(images) = settings.images {
            self.filter.images = images;
        }
        if let Some(iframes) = settings.iframes {
            self.filter.iframes = iframes;
        }
        if let Some(content_types) = &settings.content_types {
            self.filter.content_types.clone_from(content_types);
        }
    }

    /// Snapshot the loaded configuration into an immutable [`Policy`].
    #[must_use]
    pub fn policy(&self) -> Policy {
        Policy {
            enabled: self.filter.enabled,
            images: self.filter.images,
            iframes: self.filter.iframes,
            content_types: self.filter.content_types.clone(),
            markers: self.markers.clone(),
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks that marker tokens are usable as class tokens / metadata keys
    /// and that the whitelist contains no empty entries. Called automatically
    /// by [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_class_token(&self.markers.lazy_class, "markers.lazy_class")?;
        require_class_token(&self.markers.skip_class, "markers.skip_class")?;
        require_class_token(&self.markers.placeholder_class, "markers.placeholder_class")?;
        require_non_empty(&self.markers.opt_out_key, "markers.opt_out_key")?;

        for content_type in &self.filter.content_types {
            require_non_empty(content_type, "filter.content_types entries")?;
        }

        Ok(())
    }
}
