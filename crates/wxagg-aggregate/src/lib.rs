//! Collection-cycle aggregation
//!
//! Fans out to every configured source, merges the partial observations
//! into one canonical record with a quality score, and persists it.

pub mod cycle;
pub mod fanout;
pub mod merge;
pub mod quality;

pub use cycle::*;
pub use fanout::*;
pub use merge::*;
pub use quality::*;

use thiserror::Error;
use wxagg_core::StoreError;

/// Why a non-contributing source was excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source_id: String,
    pub reason: String,
}

/// A cycle with zero usable sources; nothing is written to the store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Collection failed: no usable sources ({attempted} attempted)")]
pub struct CollectionFailure {
    pub attempted: usize,
    pub failures: Vec<SourceFailure>,
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Collection(#[from] CollectionFailure),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PolicyError {
    #[error("Invalid weight {name}: {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("Expected interval must be positive")]
    ZeroInterval,
}

pub type CycleResult<T> = Result<T, CycleError>;
