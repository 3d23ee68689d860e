//! Divergence-free canonicalization.
mod config;
mod trainer;
use crate::{util::state_dim, CanonicalReward, LrScheduler, PotentialNet};
use anyhow::Result;
pub use config::{DivergenceFreeConfig, TrainingConfig};
use divfree_core::{
    Canonicalizer, CoverageSampler, Distance, DivfreeError, PearsonAggregator, SharedReward,
    TransitionsDataset,
};
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use std::{convert::TryFrom, sync::Arc};
use trainer::PotentialTrainer;

/// Number of transitions drawn for a canonicalization when none is given.
pub const DEFAULT_SAMPLES_CAN: usize = 500;

/// Why the training of a potential network stopped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StopReason {
    /// The losses plateaued at `epoch` (counted from 0).
    EarlyStopped { epoch: usize },

    /// `max_epochs` epochs were run.
    MaxEpochsReached,
}

/// Canonicalizer fitting a potential network `V` so that the shaped reward
/// `r(s, a, s', d) + discount_factor * V(s') - V(s)` has minimal L2 norm on the coverage
/// distribution.
///
/// Every call of [`canonicalize()`](Canonicalizer::canonicalize) draws its own transitions
/// from the sampler and trains a fresh network; nothing is shared between calls except the
/// sampler.
pub struct DivergenceFree {
    discount_factor: f64,
    sampler: Arc<dyn CoverageSampler>,
    config: DivergenceFreeConfig,
    state_dim: usize,
}

impl DivergenceFree {
    /// Creates a canonicalizer.
    ///
    /// The configuration is validated, and one transition is drawn from `sampler` to
    /// find the number of state features.
    pub fn new(
        discount_factor: f64,
        sampler: Arc<dyn CoverageSampler>,
        config: DivergenceFreeConfig,
    ) -> Result<Self> {
        config.training.validate()?;
        if !discount_factor.is_finite() {
            let msg = "discount_factor must be finite".to_string();
            return Err(DivfreeError::InvalidConfig(msg).into());
        }
        let state_dim = state_dim(sampler.sample(1)?.state_shape());

        Ok(Self {
            discount_factor,
            sampler,
            config,
            state_dim,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DivergenceFreeConfig {
        &self.config
    }

    /// Returns the discount factor.
    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Returns the number of features of a flattened state.
    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    fn n_samples(&self, n_samples_can: Option<usize>) -> Result<usize> {
        let n = match (n_samples_can, self.sampler.is_dataset()) {
            (Some(n), _) => n,
            (None, true) => return Err(DivfreeError::MissingSampleCount.into()),
            (None, false) => DEFAULT_SAMPLES_CAN,
        };
        match n {
            0 => {
                let msg = "n_samples_can must be positive".to_string();
                Err(DivfreeError::InvalidConfig(msg).into())
            }
            n => Ok(n),
        }
    }
}

impl Canonicalizer for DivergenceFree {
    type Canonical = CanonicalReward;

    fn canonicalize(
        &self,
        reward: SharedReward,
        n_samples_can: Option<usize>,
    ) -> Result<CanonicalReward> {
        let training = &self.config.training;
        let n_samples = self.n_samples(n_samples_can)?;
        let batch_size = training.batch_size_for(n_samples);
        let device = candle_core::Device::try_from(training.device)?;
        info!(
            "Start canonicalization: n_samples = {}, batch_size = {}, max_epochs = {}",
            n_samples, batch_size, training.max_epochs
        );

        let dataset = TransitionsDataset::new(self.sampler.sample(n_samples)?)?;
        let potential =
            PotentialNet::build(self.state_dim, &self.config.potential, &device, training.seed)?;
        let opt = training.optimizer_config().build(potential.vars())?;
        let scheduler = LrScheduler::new(training.learning_rate, training.lr_schedule());
        let patience = match training.early_stopping {
            true => Some(training.early_stopping_patience),
            false => None,
        };

        let trainer = PotentialTrainer::new(
            CanonicalReward::new(potential, reward, self.discount_factor),
            opt,
            scheduler,
            dataset,
            StdRng::seed_from_u64(training.seed),
            batch_size,
            training.max_epochs,
            patience,
            training.log_interval,
        );
        trainer.run()
    }
}

/// Distance of divergence-free canonical rewards compared with the Pearson distance.
pub type DivergenceFreeDistance = Distance<DivergenceFree, PearsonAggregator>;

/// Computes the divergence-free distance between `x` and `y` with the default
/// configuration.
///
/// `sampler` provides both the transitions of the canonicalizations and the coverage
/// batch of the aggregation.
pub fn divergence_free_distance(
    x: SharedReward,
    y: SharedReward,
    sampler: Arc<dyn CoverageSampler>,
    discount_factor: f64,
    n_samples_cov: Option<usize>,
    n_samples_can: Option<usize>,
) -> Result<f64> {
    let canonicalizer =
        DivergenceFree::new(discount_factor, sampler.clone(), DivergenceFreeConfig::default())?;
    let distance: DivergenceFreeDistance =
        Distance::new(canonicalizer, PearsonAggregator::new(sampler));
    distance.distance(x, y, n_samples_cov, n_samples_can)
}
