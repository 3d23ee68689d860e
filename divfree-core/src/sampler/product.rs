use super::{BoxSpace, CoverageSampler};
use crate::CoverageSample;
use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Mutex;

/// Coverage distribution given by the product of state and action distributions.
///
/// States and next states are drawn independently from `state_space`, actions from
/// `action_space`. No transition is terminal.
pub struct ProductSampler {
    state_space: BoxSpace,
    action_space: BoxSpace,
    rng: Mutex<StdRng>,
}

impl ProductSampler {
    /// Creates a sampler with a seeded random number generator.
    ///
    /// Both spaces are validated, so spaces read from a configuration file are checked
    /// here.
    pub fn new(state_space: BoxSpace, action_space: BoxSpace, seed: u64) -> Result<Self> {
        state_space.validate()?;
        action_space.validate()?;
        Ok(Self {
            state_space,
            action_space,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }
}

impl CoverageSampler for ProductSampler {
    fn sample(&self, n: usize) -> Result<CoverageSample> {
        let mut rng = self.rng.lock().unwrap();
        let state = self.state_space.sample(n, &mut *rng);
        let action = self.action_space.sample(n, &mut *rng);
        let next_state = self.state_space.sample(n, &mut *rng);
        CoverageSample::new(state, action, next_state, vec![0; n])
    }
}
