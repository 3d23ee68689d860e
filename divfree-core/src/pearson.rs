//! Pearson distance between canonical reward functions.
use crate::{error::DivfreeError, CoverageSampler, RewardFunction};
use anyhow::Result;
use log::trace;
use ndarray::{ArrayD, ArrayView1, Ix1};
use std::sync::Arc;

/// Variance under which the samples of a reward function are treated as constant.
pub const VARIANCE_THRESHOLD: f64 = 1e-5;

/// Distance returned when exactly one of the two reward functions is constant.
///
/// This is a fixed policy value, not derived from the correlation.
pub const ONE_DEGENERATE_DISTANCE: f64 = 0.5;

/// Number of coverage samples used when none is given.
pub const DEFAULT_SAMPLES_COV: usize = 500;

/// Reduces two canonical reward functions to a distance.
pub trait Aggregator {
    /// Computes the distance between `x` and `y` on `n_samples_cov` coverage samples.
    fn aggregate(
        &self,
        x: &dyn RewardFunction,
        y: &dyn RewardFunction,
        n_samples_cov: Option<usize>,
    ) -> Result<f64>;
}

/// Population variance.
pub fn population_variance(x: ArrayView1<f32>) -> f64 {
    let n = x.len() as f64;
    if x.is_empty() {
        return 0.0;
    }
    let mean = x.iter().map(|&v| v as f64).sum::<f64>() / n;
    x.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n
}

fn check_finite(x: ArrayView1<f32>, y: ArrayView1<f32>) -> Result<(), DivfreeError> {
    match x.iter().chain(y.iter()).all(|v| v.is_finite()) {
        true => Ok(()),
        false => Err(DivfreeError::NonFiniteCorrelationInput),
    }
}

/// Pearson correlation coefficient of two samples of equal length.
///
/// Returns an error if either sample contains a non-finite value.
pub fn pearson_correlation(x: ArrayView1<f32>, y: ArrayView1<f32>) -> Result<f64> {
    check_finite(x, y)?;
    if x.len() != y.len() {
        return Err(DivfreeError::RewardLengthMismatch {
            expected: x.len(),
            actual: y.len(),
        }
        .into());
    }
    if x.is_empty() {
        return Err(DivfreeError::EmptyCoverage.into());
    }

    let n = x.len() as f64;
    let mean_x = x.iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_y = y.iter().map(|&v| v as f64).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0f64, 0f64, 0f64);
    for (&a, &b) in x.iter().zip(y.iter()) {
        let dx = a as f64 - mean_x;
        let dy = b as f64 - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    Ok(cov / (var_x * var_y).sqrt())
}

/// Pearson distance between two samples of reward values.
///
/// * Both samples constant: `0.0`.
/// * Exactly one sample constant: [`ONE_DEGENERATE_DISTANCE`].
/// * Otherwise `sqrt(1 - pearson_correlation(x, y))`.
pub fn pearson_distance(x: ArrayView1<f32>, y: ArrayView1<f32>) -> Result<f64> {
    check_finite(x, y)?;
    let x_const = population_variance(x) < VARIANCE_THRESHOLD;
    let y_const = population_variance(y) < VARIANCE_THRESHOLD;

    match (x_const, y_const) {
        (true, true) => Ok(0.0),
        (true, false) | (false, true) => Ok(ONE_DEGENERATE_DISTANCE),
        (false, false) => {
            let corr = pearson_correlation(x, y)?.max(-1.0).min(1.0);
            Ok((1.0 - corr).sqrt())
        }
    }
}

fn into_rank1(rewards: ArrayD<f32>) -> Result<ndarray::Array1<f32>> {
    let rank = rewards.ndim();
    rewards.into_dimensionality::<Ix1>().map_err(|_| {
        anyhow::Error::from(DivfreeError::RewardRankMismatch {
            reward_rank: rank,
            shaping_rank: 1,
        })
    })
}

/// Aggregator computing the Pearson distance on a shared coverage batch.
pub struct PearsonAggregator {
    sampler: Arc<dyn CoverageSampler>,
    default_samples_cov: usize,
}

impl PearsonAggregator {
    /// Creates an aggregator drawing coverage batches from `sampler`.
    pub fn new(sampler: Arc<dyn CoverageSampler>) -> Self {
        Self {
            sampler,
            default_samples_cov: DEFAULT_SAMPLES_COV,
        }
    }

    /// Sets the number of coverage samples used when none is given.
    pub fn default_samples_cov(mut self, v: usize) -> Self {
        self.default_samples_cov = v;
        self
    }

    fn n_samples(&self, n_samples_cov: Option<usize>) -> Result<usize> {
        match (n_samples_cov, self.sampler.is_dataset()) {
            (Some(n), _) => Ok(n),
            (None, true) => Err(DivfreeError::MissingSampleCount.into()),
            (None, false) => Ok(self.default_samples_cov),
        }
    }
}

impl Aggregator for PearsonAggregator {
    fn aggregate(
        &self,
        x: &dyn RewardFunction,
        y: &dyn RewardFunction,
        n_samples_cov: Option<usize>,
    ) -> Result<f64> {
        let n = self.n_samples(n_samples_cov)?;
        let cov = self.sampler.sample(n)?;
        let x_samples = into_rank1(x.evaluate_sample(&cov)?)?;
        let y_samples = into_rank1(y.evaluate_sample(&cov)?)?;
        trace!(
            "Pearson aggregation on {} samples, var_x = {}, var_y = {}",
            n,
            population_variance(x_samples.view()),
            population_variance(y_samples.view())
        );

        pearson_distance(x_samples.view(), y_samples.view())
    }
}
