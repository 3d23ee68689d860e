//! Samplers of the coverage distribution.
//!
//! The coverage distribution is the distribution of transitions on which reward functions
//! are compared. Anything implementing [`CoverageSampler`] can be used; two samplers are
//! provided:
//!
//! * [`ProductSampler`] draws states, actions and next states independently from
//!   [`BoxSpace`]s.
//! * [`DatasetSampler`] draws rows of a fixed set of transitions.
mod box_space;
mod dataset;
mod product;
use crate::CoverageSample;
use anyhow::Result;
pub use box_space::BoxSpace;
pub use dataset::DatasetSampler;
pub use product::ProductSampler;

/// Draws batches of transitions from a coverage distribution.
///
/// Implementations are shared between threads; concurrent calls of
/// [`sample()`](Self::sample) must return independent batches.
pub trait CoverageSampler: Send + Sync {
    /// Draws `n` transitions.
    fn sample(&self, n: usize) -> Result<CoverageSample>;

    /// Returns `true` for samplers over a fixed dataset.
    ///
    /// Such samplers are always given an explicit sample count; default counts are
    /// never applied to them.
    fn is_dataset(&self) -> bool {
        false
    }
}
