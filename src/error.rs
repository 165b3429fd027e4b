//! Error types and handling for the City Explorer backend

use thiserror::Error;

/// Message sent to clients for every internal failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, something went wrong";

/// Main error type for the City Explorer backend
#[derive(Error, Debug)]
pub enum ExplorerError {
    /// Upstream provider call failed, returned a bad status or an unexpected shape
    #[error("Provider '{provider}' unavailable: {message}")]
    ProviderUnavailable {
        provider: &'static str,
        message: String,
    },

    /// Persistence layer failed or could not be reached
    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Missing or invalid request parameters
    #[error("Malformed request: {message}")]
    MalformedRequest { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ExplorerError {
    /// Create a new provider error
    pub fn provider<S: Into<String>>(provider: &'static str, message: S) -> Self {
        Self::ProviderUnavailable {
            provider,
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Create a new malformed request error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status code this error maps to at the handler boundary
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            ExplorerError::MalformedRequest { .. } => 400,
            _ => 500,
        }
    }

    /// Get a client-facing error message
    ///
    /// Only request validation failures are described to the client; every
    /// other kind collapses into the generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ExplorerError::MalformedRequest { message } => format!("Invalid request: {message}"),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<rusqlite::Error> for ExplorerError {
    fn from(err: rusqlite::Error) -> Self {
        ExplorerError::store(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ExplorerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ExplorerError::store(format!("store task failed: {err}"))
    }
}
