use super::CoverageSampler;
use crate::{error::DivfreeError, CoverageSample};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, SeedableRng};
use std::sync::Mutex;

/// Draws transitions from a fixed dataset.
///
/// Each call of [`sample()`](CoverageSampler::sample) returns `n` distinct rows chosen
/// uniformly at random. Asking for more rows than the dataset holds is an error.
pub struct DatasetSampler {
    data: CoverageSample,
    rng: Mutex<StdRng>,
}

impl DatasetSampler {
    /// Creates a sampler over `data`.
    pub fn new(data: CoverageSample, seed: u64) -> Result<Self> {
        data.check_aligned()?;
        Ok(Self {
            data,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }

    /// Returns the number of transitions in the dataset.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl CoverageSampler for DatasetSampler {
    fn sample(&self, n: usize) -> Result<CoverageSample> {
        if n > self.len() {
            return Err(DivfreeError::DatasetExhausted {
                requested: n,
                available: self.len(),
            }
            .into());
        }
        let ixs = {
            let mut rng = self.rng.lock().unwrap();
            index::sample(&mut *rng, self.len(), n).into_vec()
        };
        Ok(self.data.select(&ixs))
    }

    fn is_dataset(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::Array1;

    fn data(n: usize) -> CoverageSample {
        let ids = Array1::from_iter((0..n).map(|i| i as f32)).into_dyn();
        CoverageSample::new(ids.clone(), ids.clone(), &ids + 1f32, vec![0; n]).unwrap()
    }

    #[test]
    fn test_dataset_sampler() -> Result<()> {
        let sampler = DatasetSampler::new(data(20), 0)?;
        assert!(sampler.is_dataset());

        let s = sampler.sample(20)?;
        let mut ids = s.state.iter().map(|&x| x as usize).collect::<Vec<_>>();
        ids.sort_unstable();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
        assert_eq!(&s.state + 1f32, s.next_state);

        let err = sampler.sample(21).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DivfreeError>(),
            Some(&DivfreeError::DatasetExhausted {
                requested: 21,
                available: 20
            })
        );
        Ok(())
    }
}
