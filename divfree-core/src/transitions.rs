//! Store of transitions used during canonicalization.
use crate::CoverageSample;
use anyhow::Result;
use rand::{seq::SliceRandom, Rng};

/// A fixed draw of transitions serving shuffled minibatches.
///
/// The store is filled once with a [`CoverageSample`] and keeps it for the whole
/// canonicalization run. [`shuffle()`](Self::shuffle) reorders all four components with
/// one permutation, so rows stay aligned.
pub struct TransitionsDataset {
    data: CoverageSample,
}

impl TransitionsDataset {
    /// Creates a store from a batch of transitions.
    pub fn new(data: CoverageSample) -> Result<Self> {
        data.check_aligned()?;
        Ok(Self { data })
    }

    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reorders the transitions with a fresh uniformly random permutation.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut ixs = (0..self.len()).collect::<Vec<_>>();
        ixs.shuffle(rng);
        self.data = self.data.select(&ixs);
    }

    /// Returns the transitions in rows `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<CoverageSample> {
        self.data.slice(start, end)
    }

    /// Returns the number of full minibatches of `batch_size` transitions.
    pub fn n_minibatches(&self, batch_size: usize) -> usize {
        match batch_size {
            0 => 0,
            _ => self.len() / batch_size,
        }
    }

    /// Iterates over contiguous minibatches of `batch_size` transitions.
    ///
    /// The trailing rows that do not fill a whole minibatch are skipped.
    pub fn minibatches(
        &self,
        batch_size: usize,
    ) -> impl Iterator<Item = Result<CoverageSample>> + '_ {
        (0..self.n_minibatches(batch_size))
            .map(move |i| self.slice(i * batch_size, (i + 1) * batch_size))
    }

    /// Returns the stored transitions in their current order.
    pub fn data(&self) -> &CoverageSample {
        &self.data
    }
}
