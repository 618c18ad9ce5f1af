//! Error types for the HUFF viewer pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for HUFF pipeline operations
#[derive(Debug, Error)]
pub enum HuffError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Preference store read/write errors
    #[error("Preference store error: {message}")]
    StoreError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Conversion engine failures (initialization, process spawn, protocol)
    #[error("Conversion engine error: {message}")]
    EngineError { message: String },

    /// DOM surface errors (unknown element, malformed carrier)
    #[error("Page error: {message}")]
    PageError { message: String },

    /// Resource fetch failures (stylesheets, remote documents)
    #[error("Fetch error for '{resource}': {message}")]
    FetchError { resource: String, message: String },

    /// JSON/YAML/TOML (de)serialization errors
    #[error("Serialization error: {message}")]
    SerializationError { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Store,
    Io,
    Engine,
    Page,
    Fetch,
    Serialization,
    Internal,
}

impl HuffError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            HuffError::ConfigError { .. } => ErrorKind::Config,
            HuffError::StoreError { .. } => ErrorKind::Store,
            HuffError::IoError { .. } => ErrorKind::Io,
            HuffError::EngineError { .. } => ErrorKind::Engine,
            HuffError::PageError { .. } => ErrorKind::Page,
            HuffError::FetchError { .. } => ErrorKind::Fetch,
            HuffError::SerializationError { .. } => ErrorKind::Serialization,
            HuffError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error only affects its own scope (one element, one
    /// resource) so the rest of the pipeline can carry on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Store
                | ErrorKind::Engine
                | ErrorKind::Page
                | ErrorKind::Fetch
                | ErrorKind::Serialization
        )
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a preference store error
    pub fn store_error(message: impl Into<String>) -> Self {
        Self::StoreError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create a conversion engine error
    pub fn engine_error(message: impl Into<String>) -> Self {
        Self::EngineError {
            message: message.into(),
        }
    }

    /// Create a page error
    pub fn page_error(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Create a fetch error
    pub fn fetch_error(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchError {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for HuffError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for HuffError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            message: err.to_string(),
        }
    }
}
