#![warn(missing_docs)]
//! Core types for the divergence-free reward distance.
//!
//! The distance compares two reward functions while ignoring differences that are
//! explained by potential-based shaping. This crate holds the pieces that do not depend
//! on a neural-network backend:
//!
//! * [`CoverageSample`] and the [`CoverageSampler`] contract, with [`ProductSampler`] and
//!   [`DatasetSampler`] as reference samplers.
//! * [`RewardFunction`], the calling convention shared by original and canonical rewards.
//! * [`TransitionsDataset`], the store that serves shuffled minibatches during
//!   canonicalization.
//! * [`LossHistory`], the per-minibatch losses of one canonicalization run.
//! * [`PearsonAggregator`] and the [`Distance`] orchestrator, which combines a
//!   [`Canonicalizer`] with an [`Aggregator`].
pub mod error;
pub mod sampler;

mod distance;
mod loss_history;
mod pearson;
mod reward;
mod sample;
mod transitions;

pub use distance::{Canonicalizer, Distance};
pub use error::DivfreeError;
pub use loss_history::LossHistory;
pub use pearson::{
    pearson_correlation, pearson_distance, population_variance, Aggregator, PearsonAggregator,
    DEFAULT_SAMPLES_COV, ONE_DEGENERATE_DISTANCE, VARIANCE_THRESHOLD,
};
pub use reward::{RewardFunction, SharedReward};
pub use sample::CoverageSample;
pub use sampler::{BoxSpace, CoverageSampler, DatasetSampler, ProductSampler};
pub use transitions::TransitionsDataset;
