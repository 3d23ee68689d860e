use crate::error::DivfreeError;
use ndarray::{ArrayD, IxDyn};
use rand::{distributions::Uniform, Rng};
use serde::{Deserialize, Serialize};

/// Uniform distribution over a box `[low, high]^shape`.
///
/// An empty `shape` describes scalar values, sampled as a batch of rank 1.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BoxSpace {
    /// Lower bound of every element.
    pub low: f32,

    /// Upper bound of every element.
    pub high: f32,

    /// Shape of a single value.
    pub shape: Vec<usize>,
}

impl BoxSpace {
    /// Creates a box space.
    ///
    /// Bounds must be finite with `low <= high`.
    pub fn new(low: f32, high: f32, shape: Vec<usize>) -> Result<Self, DivfreeError> {
        let space = Self { low, high, shape };
        space.validate()?;
        Ok(space)
    }

    /// Box of scalars in `[low, high]`.
    pub fn scalar(low: f32, high: f32) -> Result<Self, DivfreeError> {
        Self::new(low, high, vec![])
    }

    /// Returns an error if the bounds do not describe a box.
    ///
    /// Deserialized spaces are not checked until this is called.
    pub fn validate(&self) -> Result<(), DivfreeError> {
        match self.low.is_finite() && self.high.is_finite() && self.low <= self.high {
            true => Ok(()),
            false => Err(DivfreeError::InvalidConfig(format!(
                "BoxSpace bounds must be finite with low <= high, got [{}, {}]",
                self.low, self.high
            ))),
        }
    }

    /// Draws a batch of `n` values; the batch dimension comes first.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> ArrayD<f32> {
        let mut shape = vec![n];
        shape.extend_from_slice(&self.shape);
        let dist = Uniform::new_inclusive(self.low, self.high);
        ArrayD::from_shape_simple_fn(IxDyn(&shape), || rng.sample(&dist))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_invalid_bounds() {
        assert!(BoxSpace::scalar(-1.0, 1.0).is_ok());
        assert!(BoxSpace::scalar(1.0, 1.0).is_ok());
        assert!(matches!(
            BoxSpace::new(1.0, -1.0, vec![2]),
            Err(DivfreeError::InvalidConfig(_))
        ));
        assert!(BoxSpace::scalar(f32::NAN, 1.0).is_err());

        let space: BoxSpace = serde_yaml::from_str("{low: 2.0, high: 0.0, shape: []}").unwrap();
        assert!(space.validate().is_err());
    }
}
