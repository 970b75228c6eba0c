//! Error taxonomy for a report cycle and for the backup flush.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a place name into coordinates.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding service timed out")]
    Timeout,
    #[error("geocoding service error: {0}")]
    ServiceError(String),
    #[error("could not geocode location '{0}'")]
    NotFound(String),
}

/// Failure talking to the weather provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to weather provider timed out")]
    Timeout,
    #[error("weather provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("could not decode weather provider response: {0}")]
    MalformedResponse(String),
    #[error("weather provider request failed: {0}")]
    Request(String),
}

/// Failure to build a report out of a provider payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("unexpected payload format: {0}")]
    MalformedPayload(String),
    #[error("could not extract '{0}' from observation")]
    FieldExtraction(&'static str),
}

/// Failure to write the dated backup file.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write backup {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize reports: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Any failure of a single fetch-normalize-store cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

impl ProviderError {
    /// Classify a transport-level reqwest failure.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::Request(err.to_string())
        }
    }
}

impl GeocodeError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeocodeError::Timeout
        } else {
            GeocodeError::ServiceError(err.to_string())
        }
    }
}
