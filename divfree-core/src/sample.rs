//! Batches of transitions drawn from a coverage distribution.
use crate::error::DivfreeError;
use anyhow::Result;
use ndarray::{ArrayD, Axis, Slice};

/// A batch of transitions `(s, a, s', done)`.
///
/// The batch dimension is axis 0 of `state`, `action` and `next_state`, and the index of
/// `done`. Row `i` of all four components describes one transition.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageSample {
    /// States `s`.
    pub state: ArrayD<f32>,

    /// Actions `a`.
    pub action: ArrayD<f32>,

    /// Next states `s'`.
    pub next_state: ArrayD<f32>,

    /// Done flags, `1` for terminal transitions.
    pub done: Vec<i8>,
}

fn rows(a: &ArrayD<f32>) -> usize {
    a.shape().first().copied().unwrap_or(0)
}

impl CoverageSample {
    /// Creates a batch, checking that the four components are aligned.
    pub fn new(
        state: ArrayD<f32>,
        action: ArrayD<f32>,
        next_state: ArrayD<f32>,
        done: Vec<i8>,
    ) -> Result<Self> {
        let sample = Self {
            state,
            action,
            next_state,
            done,
        };
        sample.check_aligned()?;
        Ok(sample)
    }

    /// Returns an error if the components do not share the same number of rows.
    pub fn check_aligned(&self) -> Result<(), DivfreeError> {
        let (state, action, next_state, done) = (
            rows(&self.state),
            rows(&self.action),
            rows(&self.next_state),
            self.done.len(),
        );
        if state == action && state == next_state && state == done {
            Ok(())
        } else {
            Err(DivfreeError::BatchLengthMismatch {
                state,
                action,
                next_state,
                done,
            })
        }
    }

    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.done.len()
    }

    /// Returns `true` if the batch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }

    /// Returns the shape of a single state, without the batch dimension.
    pub fn state_shape(&self) -> &[usize] {
        self.state.shape().get(1..).unwrap_or(&[])
    }

    /// Gathers the rows at `ixs`, in that order.
    pub fn select(&self, ixs: &[usize]) -> Self {
        Self {
            state: self.state.select(Axis(0), ixs),
            action: self.action.select(Axis(0), ixs),
            next_state: self.next_state.select(Axis(0), ixs),
            done: ixs.iter().map(|&i| self.done[i]).collect(),
        }
    }

    /// Copies the rows `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.len() {
            return Err(DivfreeError::SliceOutOfBounds {
                start,
                end,
                len: self.len(),
            }
            .into());
        }
        let window = Slice::from(start..end);

        Ok(Self {
            state: self.state.slice_axis(Axis(0), window).to_owned(),
            action: self.action.slice_axis(Axis(0), window).to_owned(),
            next_state: self.next_state.slice_axis(Axis(0), window).to_owned(),
            done: self.done[start..end].to_vec(),
        })
    }
}
