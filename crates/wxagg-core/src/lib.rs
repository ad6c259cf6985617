//! Canonical data model, units, and statistics for wxagg
//!
//! Shared by the collection path (adapters, aggregator) and the read path
//! (query engine). The two paths meet only through [`CanonicalObservation`]
//! and the [`ObservationStore`] contract.

pub mod pipeline;
pub mod stats;
pub mod types;
pub mod units;

pub use pipeline::*;
pub use stats::*;
pub use types::*;
pub use units::*;
