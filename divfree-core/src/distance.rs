//! Distance between reward functions.
use crate::{Aggregator, RewardFunction, SharedReward};
use anyhow::{anyhow, Result};
use log::info;

/// Maps a reward function to the canonical member of its shaping-equivalence class.
pub trait Canonicalizer {
    /// The canonical reward function.
    type Canonical: RewardFunction;

    /// Canonicalizes `reward` using `n_samples_can` transitions.
    ///
    /// `None` lets the canonicalizer choose the number of transitions.
    fn canonicalize(
        &self,
        reward: SharedReward,
        n_samples_can: Option<usize>,
    ) -> Result<Self::Canonical>;
}

/// Distance between reward functions.
///
/// Both reward functions are canonicalized independently with `C`, then the canonical
/// functions are compared with the aggregator `G`.
pub struct Distance<C, G> {
    canonicalizer: C,
    aggregator: G,
    parallel: bool,
}

impl<C, G> Distance<C, G>
where
    C: Canonicalizer + Sync,
    C::Canonical: Send,
    G: Aggregator,
{
    /// Creates a distance from a canonicalizer and an aggregator.
    pub fn new(canonicalizer: C, aggregator: G) -> Self {
        Self {
            canonicalizer,
            aggregator,
            parallel: false,
        }
    }

    /// If `true`, the two canonicalizations run on separate threads.
    pub fn parallel(mut self, v: bool) -> Self {
        self.parallel = v;
        self
    }

    /// Returns the canonicalizer.
    pub fn canonicalizer(&self) -> &C {
        &self.canonicalizer
    }

    /// Canonicalizes `x` and `y`.
    pub fn canonicalize_pair(
        &self,
        x: SharedReward,
        y: SharedReward,
        n_samples_can: Option<usize>,
    ) -> Result<(C::Canonical, C::Canonical)> {
        match self.parallel {
            false => {
                let x_can = self.canonicalizer.canonicalize(x, n_samples_can)?;
                let y_can = self.canonicalizer.canonicalize(y, n_samples_can)?;
                Ok((x_can, y_can))
            }
            true => {
                let canonicalizer = &self.canonicalizer;
                std::thread::scope(|s| {
                    let hx = s.spawn(move || canonicalizer.canonicalize(x, n_samples_can));
                    let hy = s.spawn(move || canonicalizer.canonicalize(y, n_samples_can));
                    let x_can = hx
                        .join()
                        .map_err(|_| anyhow!("Canonicalization thread panicked"))??;
                    let y_can = hy
                        .join()
                        .map_err(|_| anyhow!("Canonicalization thread panicked"))??;
                    Ok::<_, anyhow::Error>((x_can, y_can))
                })
            }
        }
    }

    /// Computes the distance between `x` and `y`.
    ///
    /// * `n_samples_cov` - The number of coverage samples used by the aggregator.
    /// * `n_samples_can` - The number of transitions used in each canonicalization.
    pub fn distance(
        &self,
        x: SharedReward,
        y: SharedReward,
        n_samples_cov: Option<usize>,
        n_samples_can: Option<usize>,
    ) -> Result<f64> {
        let (x_can, y_can) = self.canonicalize_pair(x, y, n_samples_can)?;
        let d = self.aggregator.aggregate(&x_can, &y_can, n_samples_cov)?;
        info!("Distance: {}", d);
        Ok(d)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        BoxSpace, CoverageSampler, PearsonAggregator, ProductSampler, ONE_DEGENERATE_DISTANCE,
    };
    use ndarray::ArrayD;
    use std::sync::Arc;

    /// Returns reward functions unchanged.
    struct Identity;

    struct Passthrough(SharedReward);

    impl RewardFunction for Passthrough {
        fn evaluate(
            &self,
            state: &ArrayD<f32>,
            action: &ArrayD<f32>,
            next_state: &ArrayD<f32>,
            done: &[i8],
        ) -> Result<ArrayD<f32>> {
            self.0.evaluate(state, action, next_state, done)
        }
    }

    impl Canonicalizer for Identity {
        type Canonical = Passthrough;

        fn canonicalize(&self, reward: SharedReward, _: Option<usize>) -> Result<Passthrough> {
            Ok(Passthrough(reward))
        }
    }

    fn distance(seed: u64) -> Distance<Identity, PearsonAggregator> {
        let sampler: Arc<dyn CoverageSampler> = Arc::new(
            ProductSampler::new(
                BoxSpace::scalar(-1.0, 1.0).unwrap(),
                BoxSpace::scalar(-1.0, 1.0).unwrap(),
                seed,
            )
            .unwrap(),
        );
        Distance::new(Identity, PearsonAggregator::new(sampler))
    }

    fn constant(c: f32) -> SharedReward {
        Arc::new(
            move |s: &ArrayD<f32>, _: &ArrayD<f32>, _: &ArrayD<f32>, _: &[i8]| {
                ArrayD::from_elem(&s.shape()[..1], c)
            },
        )
    }

    fn potential_difference() -> SharedReward {
        Arc::new(|s: &ArrayD<f32>, _: &ArrayD<f32>, s_: &ArrayD<f32>, _: &[i8]| s_ - s)
    }

    #[test]
    fn test_constant_rewards() -> Result<()> {
        let d = distance(0);
        let (c, r) = (constant(2.0), potential_difference());
        assert_eq!(d.distance(c.clone(), r.clone(), Some(100), None)?, ONE_DEGENERATE_DISTANCE);
        assert_eq!(d.distance(r, c.clone(), Some(100), None)?, ONE_DEGENERATE_DISTANCE);
        assert_eq!(d.distance(c, constant(-1.0), Some(100), None)?, 0.0);
        Ok(())
    }

    #[test]
    fn test_identical_rewards() -> Result<()> {
        let r = potential_difference();
        let d = distance(1).distance(r.clone(), r, Some(100), None)?;
        assert!(d < 1e-3);
        Ok(())
    }

    #[test]
    fn test_parallel_matches_sequential() -> Result<()> {
        let x = potential_difference();
        let y: SharedReward = Arc::new(
            |s: &ArrayD<f32>, a: &ArrayD<f32>, s_: &ArrayD<f32>, _: &[i8]| (s_ - s) + a,
        );
        let d_seq = distance(5).distance(x.clone(), y.clone(), Some(300), None)?;
        let d_par = distance(5)
            .parallel(true)
            .distance(x.clone(), y.clone(), Some(300), None)?;
        let d_swap = distance(5).distance(y, x, Some(300), None)?;
        assert_eq!(d_seq, d_par);
        assert!((d_seq - d_swap).abs() < 1e-12);
        Ok(())
    }
}
