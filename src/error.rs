use thiserror::Error;

use crate::models::route_data::ShapeError;

/// Library-wide error types.
///
/// A blocked hide is not an error: see [`crate::services::lifecycle::HideOutcome`].
#[derive(Debug, Error)]
pub enum AppError {
    /// Transport or server failure. Never retried automatically.
    #[error("Network error: {0}")]
    Network(String),

    /// The caller is not authenticated.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The caller lacks rights to edit or hide the route.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The route was removed or hidden elsewhere.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid route data: {0}")]
    InvalidRouteData(#[from] ShapeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<::config::ConfigError> for AppError {
    fn from(err: ::config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
