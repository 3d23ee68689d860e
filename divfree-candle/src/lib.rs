//! Divergence-free reward distance implemented with [candle](https://crates.io/crates/candle-core).
//!
//! The distance is invariant to potential-based shaping. Each reward function is
//! canonicalized by fitting a potential network `V` so that
//! `r(s, a, s', d) + discount * V(s') - V(s)` has minimal L2 norm on the coverage
//! distribution; the two canonical reward functions are then compared with the Pearson
//! distance.
//!
//! ```no_run
//! use divfree_candle::divergence_free_distance;
//! use divfree_core::{BoxSpace, CoverageSampler, ProductSampler, SharedReward};
//! use ndarray::ArrayD;
//! use std::sync::Arc;
//!
//! let sampler: Arc<dyn CoverageSampler> = Arc::new(ProductSampler::new(
//!     BoxSpace::scalar(-1.0, 1.0).unwrap(),
//!     BoxSpace::scalar(-1.0, 1.0).unwrap(),
//!     42,
//! ).unwrap());
//! let x: SharedReward = Arc::new(
//!     |s: &ArrayD<f32>, _a: &ArrayD<f32>, s_: &ArrayD<f32>, _d: &[i8]| s_ - s,
//! );
//! let y: SharedReward = Arc::new(
//!     |_s: &ArrayD<f32>, a: &ArrayD<f32>, _s_: &ArrayD<f32>, _d: &[i8]| a.clone(),
//! );
//! let d = divergence_free_distance(x, y, sampler, 0.99, Some(500), Some(500)).unwrap();
//! assert!(d >= 0.0 && d <= 2f64.sqrt());
//! ```
mod canonical;
pub mod canonicalizer;
mod opt;
pub mod potential;
mod scheduler;
pub mod util;
pub use canonical::{CallOptions, CanonicalReward, RewardOutput};
pub use canonicalizer::{
    divergence_free_distance, DivergenceFree, DivergenceFreeConfig, DivergenceFreeDistance,
    StopReason, TrainingConfig, DEFAULT_SAMPLES_CAN,
};
pub use opt::{Optimizer, OptimizerConfig};
pub use potential::{PotentialConfig, PotentialNet};
pub use scheduler::{LrSchedule, LrScheduler};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    /// Fails if the CUDA device is not available.
    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
