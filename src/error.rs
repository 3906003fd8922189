//! Error types shared by providers and the planner.

use thiserror::Error;

/// A genuine failure from a distance or geocoding provider.
///
/// Distinct from "unavailable", which providers report as `Ok(None)`.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("empty response: {0}")]
    EmptyResponse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::EmptyResponse(message.into())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Failure of a single planning invocation.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Nothing to plan. Callers should treat this as a normal outcome.
    #[error("no candidate points to plan")]
    NoCandidates,

    #[error("invalid coordinate for {subject}: ({latitude}, {longitude})")]
    InvalidCoordinate {
        subject: String,
        latitude: f64,
        longitude: f64,
    },

    #[error("fill threshold must be within 0..=100, got {0}")]
    InvalidThreshold(f64),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl PlanError {
    pub fn is_provider(&self) -> bool {
        matches!(self, PlanError::Provider(_))
    }
}
