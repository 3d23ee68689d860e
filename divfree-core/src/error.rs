//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum DivfreeError {
    /// The four components of a transition batch have different lengths.
    #[error(
        "Batch length mismatch: state {state}, action {action}, next_state {next_state}, done {done}"
    )]
    BatchLengthMismatch {
        /// Rows of the state batch.
        state: usize,
        /// Rows of the action batch.
        action: usize,
        /// Rows of the next state batch.
        next_state: usize,
        /// Number of done flags.
        done: usize,
    },

    /// The reward function was broadcast to a rank other than the shaping term's.
    #[error("Reward function output shouldn't be broadcasted: rank {reward_rank}, expected {shaping_rank}")]
    RewardRankMismatch {
        /// Rank of the reward function output.
        reward_rank: usize,
        /// Rank of the shaping term.
        shaping_rank: usize,
    },

    /// The reward function returned a number of rows other than the batch size.
    #[error("Reward function returned {actual} rows for a batch of {expected}")]
    RewardLengthMismatch {
        /// Rows of the input batch.
        expected: usize,
        /// Rows of the reward output.
        actual: usize,
    },

    /// `state` and `next_state` have different ranks.
    #[error("Asymmetric state ranks: state {state_rank}, next_state {next_state_rank}")]
    AsymmetricStateRank {
        /// Rank of the state batch.
        state_rank: usize,
        /// Rank of the next state batch.
        next_state_rank: usize,
    },

    /// The flattened state does not match the input dimension of the potential network.
    #[error("State dimension mismatch: expected {expected}, got {actual}")]
    StateDimMismatch {
        /// Input dimension of the network.
        expected: usize,
        /// Flattened dimension of the given states.
        actual: usize,
    },

    /// A row window lies outside of the stored batch.
    #[error("Slice [{start}, {end}) out of bounds for a batch of {len}")]
    SliceOutOfBounds {
        /// First row of the window.
        start: usize,
        /// One past the last row of the window.
        end: usize,
        /// Rows in the batch.
        len: usize,
    },

    /// A fixed-dataset sampler was asked for more rows than it holds.
    #[error("Dataset sampler holds {available} transitions, {requested} requested")]
    DatasetExhausted {
        /// Rows requested.
        requested: usize,
        /// Rows held by the dataset.
        available: usize,
    },

    /// A fixed-dataset sampler was used without an explicit sample count.
    #[error("Fixed-dataset samplers require an explicit number of samples")]
    MissingSampleCount,

    /// An input of the correlation contains NaN or infinity.
    #[error("Non-finite value in correlation input")]
    NonFiniteCorrelationInput,

    /// A coverage batch without rows.
    #[error("Empty coverage batch")]
    EmptyCoverage,

    /// Invalid hyperparameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
