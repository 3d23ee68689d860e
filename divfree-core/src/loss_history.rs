//! Losses recorded during one canonicalization run.
use itertools::{Itertools, MinMaxResult};

/// Append-only sequence of per-minibatch losses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LossHistory {
    losses: Vec<f32>,
}

impl LossHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the loss of one optimization step.
    pub fn push(&mut self, loss: f32) {
        self.losses.push(loss);
    }

    /// Returns the number of recorded losses.
    pub fn len(&self) -> usize {
        self.losses.len()
    }

    /// Returns `true` if no loss has been recorded.
    pub fn is_empty(&self) -> bool {
        self.losses.is_empty()
    }

    /// Returns the most recent loss.
    pub fn last(&self) -> Option<f32> {
        self.losses.last().copied()
    }

    /// Returns all losses in the order they were recorded.
    pub fn as_slice(&self) -> &[f32] {
        &self.losses
    }

    /// Returns `max - min` over the last `window` losses.
    ///
    /// `None` if fewer than `window` losses have been recorded.
    pub fn window_range(&self, window: usize) -> Option<f32> {
        if window == 0 || self.losses.len() < window {
            return None;
        }
        match self.losses[self.losses.len() - window..].iter().minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(_) => Some(0.0),
            MinMaxResult::MinMax(min, max) => Some(max - min),
        }
    }

    /// Returns `true` if the last `window` losses fluctuate less than `tol`.
    pub fn has_plateaued(&self, window: usize, tol: f32) -> bool {
        matches!(self.window_range(window), Some(range) if range < tol)
    }
}

impl From<LossHistory> for Vec<f32> {
    fn from(h: LossHistory) -> Self {
        h.losses
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_plateau() {
        let mut h = LossHistory::new();
        assert!(!h.has_plateaued(3, 1e-6));

        for l in [1.0f32, 0.5, 0.25].iter() {
            h.push(*l);
        }
        assert_eq!(h.window_range(3), Some(0.75));
        assert!(!h.has_plateaued(3, 1e-6));

        for _ in 0..3 {
            h.push(0.1);
        }
        assert_eq!(h.window_range(3), Some(0.0));
        assert!(h.has_plateaued(3, 1e-6));
        assert!(!h.has_plateaued(4, 1e-6));
        assert_eq!(h.len(), 6);
        assert_eq!(h.last(), Some(0.1));
    }
}
