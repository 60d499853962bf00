//! Error types for the reporting client.

use thiserror::Error;

/// Returned by `Client::new` when the client cannot be configured.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("appName is required")]
    MissingAppName,

    #[error("apiKey is required")]
    MissingApiKey,
}

/// Why a report could not be delivered.
///
/// Only produced by synchronous, non-silent submissions. Asynchronous
/// submissions log their outcome instead and silent mode cannot fail.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The payload could not be encoded as JSON.
    #[error("unable to convert payload to JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request never produced a response.
    #[error("unable to reach the error-tracking endpoint: {0}")]
    Transport(#[from] ureq::Error),

    /// The endpoint answered with something other than 202 Accepted.
    #[error("unexpected answer from the error-tracking endpoint: HTTP {status}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
    },
}

impl DeliveryError {
    /// The HTTP status, if the endpoint answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::UnexpectedStatus { status } => Some(*status),
            _ => None,
        }
    }
}
