//! Error types for the resource monitor

use crate::resource::ResourceId;
use std::fmt;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug)]
pub enum MonitorError {
    /// No resource is registered under this id
    NotFound(ResourceId),

    /// Caller supplied metadata that cannot be applied
    InvalidInput(String),

    /// Configuration error
    Config(String),

    /// HTTP client could not be built
    Http(reqwest::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::NotFound(id) => write!(f, "Resource {} not found", id),
            MonitorError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            MonitorError::Config(msg) => write!(f, "Configuration error: {}", msg),
            MonitorError::Http(err) => write!(f, "HTTP error: {}", err),
            MonitorError::Io(err) => write!(f, "IO error: {}", err),
            MonitorError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::Http(err) => Some(err),
            MonitorError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::Io(err)
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        MonitorError::Http(err)
    }
}
