//! Error handling for Convert Studio
//!
//! Each subsystem has its own error enum next to its code. This module
//! defines the crate-level umbrella error and a Result alias for
//! operations that cross subsystem boundaries.

use crate::execution::ExecutionError;
use crate::pipeline::error::PipelineError;
use crate::registry::RegistryError;
use crate::storage::StorageError;
use thiserror::Error;

/// Main error type for Convert Studio operations
#[derive(Error, Debug)]
pub enum StudioError {
    /// Graph validation and connection admission errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Errors building the node registry
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A run could not be started
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Import, export and save-slot errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StudioError>,
    },
}

impl StudioError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        StudioError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for Convert Studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<StudioError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
