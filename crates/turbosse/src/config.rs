//! Emission configuration.
//!
//! [`EmitConfig`] is the typed, per-response configuration. [`EmitSettings`]
//! is its loosely typed counterpart, loaded from files or the environment and
//! checked when converted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use turbosse_encoding::EventId;

use crate::error::ConfigError;
use crate::policy::{EventNamePolicy, IdPolicy};

/// Default capacity of the channel between emitter and HTTP body.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Configuration for one emission.
pub struct EmitConfig<T> {
    /// Id policy for data frames
    pub id: IdPolicy<T>,
    /// Event-name policy for data frames
    pub event: EventNamePolicy<T>,
    /// Frames buffered between the emitter and a channel-backed sink.
    ///
    /// Default: 16
    pub channel_capacity: usize,
}

impl<T> Default for EmitConfig<T> {
    fn default() -> Self {
        Self {
            id: IdPolicy::Auto,
            event: EventNamePolicy::None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl<T> Clone for EmitConfig<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            event: self.event.clone(),
            channel_capacity: self.channel_capacity,
        }
    }
}

impl<T> std::fmt::Debug for EmitConfig<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmitConfig")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

impl<T> EmitConfig<T> {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive ids from each value.
    ///
    /// Returning `None` suppresses the id for that value only.
    pub fn with_id_generator<F, I>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Option<I> + Send + Sync + 'static,
        I: Into<EventId>,
    {
        self.id = IdPolicy::derived(f);
        self
    }

    /// Suppress ids on every frame.
    pub fn without_ids(mut self) -> Self {
        self.id = IdPolicy::Suppressed;
        self
    }

    /// Set the id policy.
    pub fn with_id_policy(mut self, policy: IdPolicy<T>) -> Self {
        self.id = policy;
        self
    }

    /// Use one event name for every data frame.
    pub fn with_event(mut self, name: impl Into<String>) -> Self {
        self.event = EventNamePolicy::Static(name.into());
        self
    }

    /// Derive the event name from each value.
    pub fn with_event_fn<F, S>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Option<S> + Send + Sync + 'static,
        S: Into<String>,
    {
        self.event = EventNamePolicy::derived(f);
        self
    }

    /// Set the channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a static event name is empty or contains a line
    /// break, or if the channel capacity is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let EventNamePolicy::Static(ref name) = self.event {
            validate_event_name(name)?;
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

fn validate_event_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyEventName);
    }
    if name.contains(['\r', '\n']) {
        return Err(ConfigError::InvalidEventName(name.to_owned()));
    }
    Ok(())
}

/// Id assignment selectable from configuration files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdMode {
    /// Auto-incrementing ids
    #[default]
    Auto,
    /// No ids
    #[serde(rename = "none", alias = "suppressed")]
    Suppressed,
}

/// Loosely typed emission settings.
///
/// ```toml
/// ids = "auto"          # or "none"
/// event = "update"      # optional static event name
/// channel_capacity = 32
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitSettings {
    /// Id assignment
    pub ids: IdMode,
    /// Static event name for every data frame
    pub event: Option<String>,
    /// Channel capacity for channel-backed sinks
    pub channel_capacity: usize,
}

impl Default for EmitSettings {
    fn default() -> Self {
        Self {
            ids: IdMode::Auto,
            event: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl EmitSettings {
    /// Load settings from a file (TOML, YAML, or JSON).
    ///
    /// Environment variables with the `TURBOSSE_` prefix override file
    /// settings, e.g. `TURBOSSE_CHANNEL_CAPACITY=64`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist, has an unsupported
    /// extension, or contains invalid settings.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        use config::{Config, File};

        let path = path.as_ref();
        let format = file_format(path)?;
        let path_str = path.to_str().ok_or(ConfigError::UnsupportedFormat)?;

        let config = Config::builder()
            .add_source(File::new(path_str, format))
            .add_source(
                config::Environment::with_prefix("TURBOSSE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load settings from environment variables with the given prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Convert into a typed configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings would produce an invalid
    /// configuration.
    pub fn into_config<T>(self) -> Result<EmitConfig<T>, ConfigError> {
        let config = EmitConfig {
            id: match self.ids {
                IdMode::Auto => IdPolicy::Auto,
                IdMode::Suppressed => IdPolicy::Suppressed,
            },
            event: self
                .event
                .map_or(EventNamePolicy::None, EventNamePolicy::Static),
            channel_capacity: self.channel_capacity,
        };
        config.validate()?;
        Ok(config)
    }
}

/// File format for a configuration path, from its extension.
///
/// # Errors
///
/// Returns an error if the file doesn't exist or has an unsupported extension.
pub fn file_format(path: &Path) -> Result<config::FileFormat, ConfigError> {
    use config::FileFormat;

    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => Ok(FileFormat::Toml),
        Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
        Some("json") => Ok(FileFormat::Json),
        _ => Err(ConfigError::UnsupportedFormat),
    }
}
