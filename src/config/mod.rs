//! Configuration module for Convert Studio
//!
//! Settings are read from a TOML file. Every section and field has a
//! default, so a partial (or empty) file is valid.
//!
//! # App Data Location
//!
//! Saved pipelines and the default config file live in the
//! platform-appropriate data directory:
//! - **Linux**: `~/.local/share/dev.convert-studio/`
//! - **macOS**: `~/Library/Application Support/dev.convert-studio/`
//! - **Windows**: `%APPDATA%\dev.convert-studio\`
//!
//! # Example
//!
//! ```toml
//! [history]
//! capacity = 100
//!
//! [execution]
//! tick_interval_ms = 50
//! order = "dependency"
//!
//! [editor]
//! parameter_policy = "clamp"
//! ```

use crate::error::{Result, StudioError};
use crate::execution::ExecutionOrder;
use crate::pipeline::editor::DEFAULT_PIPELINE_NAME;
use crate::pipeline::history::DEFAULT_HISTORY_CAPACITY;
use crate::pipeline::parameters::ParameterPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.convert-studio";

/// Config filename inside the app data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Save-slot filename inside the data directory
pub const DEFAULT_SLOTS_FILE: &str = "saved_pipelines.json";

/// Default delay between execution steps
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 200;

pub const DEFAULT_MIN_PROGRESS_STEP: f64 = 5.0;
pub const DEFAULT_MAX_PROGRESS_STEP: f64 = 20.0;

pub const DEFAULT_LOG_FILTER: &str = "info,convert_studio=debug";

/// Channel capacity for commands (UI → backend)
pub const DEFAULT_COMMAND_CHANNEL_CAPACITY: usize = 256;

/// Channel capacity for events (backend → UI)
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 10_000;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        StudioError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            StudioError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Sections ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo steps
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Delay between progress steps on the backend thread
    pub tick_interval_ms: u64,

    /// Lower bound of a randomized progress increment
    pub min_progress_step: f64,

    /// Upper bound of a randomized progress increment
    pub max_progress_step: f64,

    pub order: ExecutionOrder,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            min_progress_step: DEFAULT_MIN_PROGRESS_STEP,
            max_progress_step: DEFAULT_MAX_PROGRESS_STEP,
            order: ExecutionOrder::List,
        }
    }
}

impl ExecutionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub parameter_policy: ParameterPolicy,

    /// Name given by "new pipeline"
    pub default_pipeline_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            parameter_policy: ParameterPolicy::Reject,
            default_pipeline_name: DEFAULT_PIPELINE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the platform data directory
    pub data_dir: Option<PathBuf>,

    pub slots_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            slots_file: DEFAULT_SLOTS_FILE.to_string(),
        }
    }
}

impl StorageConfig {
    /// Full path of the save-slot document
    pub fn slots_path(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(app_data_dir)
            .map(|dir| dir.join(&self.slots_file))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,

    /// Also write logs to this file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub command_channel_capacity: usize,
    pub event_channel_capacity: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command_channel_capacity: DEFAULT_COMMAND_CHANNEL_CAPACITY,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

// ==================== App Config ====================

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub history: HistoryConfig,
    pub execution: ExecutionConfig,
    pub editor: EditorConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub backend: BackendConfig,
}

impl AppConfig {
    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StudioError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            StudioError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save config as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StudioError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| StudioError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| StudioError::Config(format!("Failed to write config: {}", e)))
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.history.capacity == 0 {
            return Err(StudioError::Config(
                "history.capacity must be at least 1".to_string(),
            ));
        }

        let exec = &self.execution;
        if !(exec.min_progress_step.is_finite() && exec.min_progress_step > 0.0) {
            return Err(StudioError::Config(format!(
                "execution.min_progress_step must be positive, got {}",
                exec.min_progress_step
            )));
        }
        if !exec.max_progress_step.is_finite() || exec.max_progress_step < exec.min_progress_step
        {
            return Err(StudioError::Config(format!(
                "execution.max_progress_step ({}) must be >= min_progress_step ({})",
                exec.max_progress_step, exec.min_progress_step
            )));
        }

        if self.backend.command_channel_capacity == 0 || self.backend.event_channel_capacity == 0 {
            return Err(StudioError::Config(
                "backend channel capacities must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
