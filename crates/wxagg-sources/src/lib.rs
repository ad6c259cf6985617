//! Weather provider adapters
//!
//! Each provider's response is normalised to the canonical metric set and
//! units at this boundary. An adapter never fails past [`Source::fetch`]:
//! every [`SourceError`] ends up in `PartialObservation::error`.
//!
//! [`Source::fetch`]: wxagg_core::Source::fetch

pub mod adapter;
pub mod codes;
pub mod provider;
pub mod providers;
pub mod registry;

pub use adapter::*;
pub use provider::*;
pub use registry::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider returned HTTP {0}")]
    Status(u16),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Timeout waiting for provider")]
    Timeout,

    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),
}

pub type SourceResult<T> = Result<T, SourceError>;

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_decode() {
            SourceError::InvalidPayload(err.without_url().to_string())
        } else {
            // Request URLs carry API keys
            SourceError::Transport(err.without_url().to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::InvalidPayload(err.to_string())
    }
}
