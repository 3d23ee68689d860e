//! Reward functions.
use crate::CoverageSample;
use anyhow::Result;
use ndarray::ArrayD;
use std::sync::Arc;

/// A reward function over batches of transitions.
///
/// Given batches of states, actions, next states and done flags, it returns one reward
/// per row. The output must have rank 1; a reward function that broadcasts to a higher
/// rank is rejected when it is canonicalized.
///
/// Any closure with the signature
/// `Fn(&ArrayD<f32>, &ArrayD<f32>, &ArrayD<f32>, &[i8]) -> ArrayD<f32>` is a reward
/// function:
///
/// ```
/// use divfree_core::{RewardFunction, SharedReward};
/// use ndarray::{array, ArrayD};
/// use std::sync::Arc;
///
/// let r: SharedReward = Arc::new(
///     |s: &ArrayD<f32>, _a: &ArrayD<f32>, s_next: &ArrayD<f32>, _d: &[i8]| s_next - s,
/// );
/// let s = array![0f32, 1.].into_dyn();
/// let a = array![0f32, 0.].into_dyn();
/// let s_next = array![1f32, 3.].into_dyn();
/// let out = r.evaluate(&s, &a, &s_next, &[0, 0]).unwrap();
/// assert_eq!(out, array![1f32, 2.].into_dyn());
/// ```
pub trait RewardFunction: Send + Sync {
    /// Evaluates the rewards of a batch of transitions.
    fn evaluate(
        &self,
        state: &ArrayD<f32>,
        action: &ArrayD<f32>,
        next_state: &ArrayD<f32>,
        done: &[i8],
    ) -> Result<ArrayD<f32>>;

    /// Evaluates the rewards of the transitions in `sample`.
    fn evaluate_sample(&self, sample: &CoverageSample) -> Result<ArrayD<f32>> {
        self.evaluate(&sample.state, &sample.action, &sample.next_state, &sample.done)
    }
}

impl<F> RewardFunction for F
where
    F: Fn(&ArrayD<f32>, &ArrayD<f32>, &ArrayD<f32>, &[i8]) -> ArrayD<f32> + Send + Sync,
{
    fn evaluate(
        &self,
        state: &ArrayD<f32>,
        action: &ArrayD<f32>,
        next_state: &ArrayD<f32>,
        done: &[i8],
    ) -> Result<ArrayD<f32>> {
        Ok(self(state, action, next_state, done))
    }
}

/// A reward function shared between threads and canonical reward functions.
pub type SharedReward = Arc<dyn RewardFunction>;
