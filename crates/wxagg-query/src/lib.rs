//! Read-only queries over stored canonical observations

pub mod engine;
pub mod health;
pub mod window;

pub use engine::*;
pub use health::*;
pub use window::*;

use thiserror::Error;
use wxagg_core::StoreError;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Store reachable but holds no observation for the location
    #[error("No weather data available for {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl QueryError {
    /// Stable error kind exposed to API callers
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::NotFound(_) => "not_found",
            QueryError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
