//! Canonical reward function.
use crate::{
    canonicalizer::StopReason,
    potential::PotentialNet,
    util::{arrayd_to_tensor, state_tensors, tensor_to_array1},
};
use anyhow::Result;
use candle_core::{Device, Tensor, D};
use divfree_core::{CoverageSample, DivfreeError, LossHistory, RewardFunction, SharedReward};
use ndarray::ArrayD;

/// Options of [`CanonicalReward::call()`].
#[derive(Clone, Debug, Default)]
pub struct CallOptions {
    /// If `true`, the output is a tensor connected to the parameters of the potential
    /// network, so that gradients can flow through it.
    ///
    /// When `device` differs from the device of the network, the tensor is computed with
    /// a copy of the network on that device and is connected to the copy's parameters,
    /// not to those of [`CanonicalReward::potential()`]. Use
    /// [`CanonicalReward::forward_tensor()`] for gradients of the stored network.
    pub differentiable: bool,

    /// Device on which the potential network is evaluated.
    ///
    /// `None` means the device of the network. On any other device the parameters are
    /// copied there first.
    pub device: Option<Device>,
}

impl CallOptions {
    /// Sets the differentiable flag.
    pub fn differentiable(mut self, v: bool) -> Self {
        self.differentiable = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }
}

/// Output of [`CanonicalReward::call()`].
pub enum RewardOutput {
    /// Host array of rank 1.
    Array(ArrayD<f32>),

    /// Tensor of rank 1 on the evaluation device.
    Tensor(Tensor),
}

impl RewardOutput {
    /// Returns the rewards as a host array.
    pub fn into_array(self) -> Result<ArrayD<f32>> {
        match self {
            Self::Array(a) => Ok(a),
            Self::Tensor(t) => Ok(tensor_to_array1(&t)?.into_dyn()),
        }
    }

    /// Returns the rewards as a tensor on `device`.
    pub fn into_tensor(self, device: &Device) -> Result<Tensor> {
        match self {
            Self::Array(a) => arrayd_to_tensor(&a, device),
            Self::Tensor(t) => Ok(t.to_device(device)?),
        }
    }
}

/// Reward function shaped with a trained potential network.
///
/// For a transition `(s, a, s', d)` it returns
/// `r(s, a, s', d) + discount_factor * V(s') - V(s)`, where `r` is the original reward
/// function and `V` the potential network.
///
/// The struct does not change after canonicalization; it can be evaluated repeatedly and
/// from several threads.
pub struct CanonicalReward {
    potential: PotentialNet,
    reward: SharedReward,
    discount_factor: f64,
    loss_history: LossHistory,
    stop_reason: Option<StopReason>,
}

impl CanonicalReward {
    pub(crate) fn new(potential: PotentialNet, reward: SharedReward, discount_factor: f64) -> Self {
        Self {
            potential,
            reward,
            discount_factor,
            loss_history: LossHistory::new(),
            stop_reason: None,
        }
    }

    pub(crate) fn with_history(mut self, loss_history: LossHistory, stop_reason: StopReason) -> Self {
        self.loss_history = loss_history;
        self.stop_reason = Some(stop_reason);
        self
    }

    fn shaped(&self, potential: &PotentialNet, sample: &CoverageSample) -> Result<Tensor> {
        sample.check_aligned()?;
        let reward = self.reward.evaluate_sample(sample)?;
        if reward.ndim() != 1 {
            return Err(DivfreeError::RewardRankMismatch {
                reward_rank: reward.ndim(),
                shaping_rank: 1,
            }
            .into());
        }
        if reward.len() != sample.len() {
            return Err(DivfreeError::RewardLengthMismatch {
                expected: sample.len(),
                actual: reward.len(),
            }
            .into());
        }

        let device = potential.device();
        let (s, s_) = state_tensors(&sample.state, &sample.next_state, device)?;
        let v = potential.forward(&s)?;
        let v_ = potential.forward(&s_)?;
        let shaping = (v_.affine(self.discount_factor, 0.0)? - v)?.squeeze(D::Minus1)?;
        let r = arrayd_to_tensor(&reward, device)?;

        Ok((r + shaping)?)
    }

    /// Evaluates the shaped rewards as a tensor connected to the potential network.
    pub fn forward_tensor(&self, sample: &CoverageSample) -> Result<Tensor> {
        self.shaped(&self.potential, sample)
    }

    /// Evaluates the shaped rewards of `sample`.
    ///
    /// Both output modes compute the same values.
    pub fn call(&self, sample: &CoverageSample, opts: CallOptions) -> Result<RewardOutput> {
        let moved;
        let potential = match &opts.device {
            Some(device) if !device.same_device(self.potential.device()) => {
                moved = self.potential.to_device(device)?;
                &moved
            }
            _ => &self.potential,
        };
        let shaped = self.shaped(potential, sample)?;

        match opts.differentiable {
            true => Ok(RewardOutput::Tensor(shaped)),
            false => Ok(RewardOutput::Array(tensor_to_array1(&shaped)?.into_dyn())),
        }
    }

    /// Returns the potential network.
    pub fn potential(&self) -> &PotentialNet {
        &self.potential
    }

    /// Returns the discount factor of the shaping term.
    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Returns the losses recorded while the potential network was trained.
    pub fn loss_history(&self) -> &LossHistory {
        &self.loss_history
    }

    /// Returns why training stopped, `None` if the network was never trained.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }
}

impl RewardFunction for CanonicalReward {
    fn evaluate(
        &self,
        state: &ArrayD<f32>,
        action: &ArrayD<f32>,
        next_state: &ArrayD<f32>,
        done: &[i8],
    ) -> Result<ArrayD<f32>> {
        let sample = CoverageSample::new(
            state.clone(),
            action.clone(),
            next_state.clone(),
            done.to_vec(),
        )?;
        self.evaluate_sample(&sample)
    }

    fn evaluate_sample(&self, sample: &CoverageSample) -> Result<ArrayD<f32>> {
        self.call(sample, CallOptions::default())?.into_array()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::PotentialConfig;
    use ndarray::array;
    use std::sync::Arc;

    /// Potential network with `V(s) = 1` for all states.
    fn unit_potential() -> Result<PotentialNet> {
        let net = PotentialNet::build(1, &PotentialConfig::default().hidden_dim(8), &Device::Cpu, 0)?;
        for (name, var) in net.get_varmap().data().lock().unwrap().iter() {
            let t = match name.as_str() {
                "output.bias" => var.ones_like()?,
                _ => var.zeros_like()?,
            };
            var.set(&t)?;
        }
        Ok(net)
    }

    fn sample() -> Result<CoverageSample> {
        CoverageSample::new(
            array![0f32, 1., 2.].into_dyn(),
            array![0.5f32, 0.5, 0.5].into_dyn(),
            array![1f32, 3., 2.].into_dyn(),
            vec![0, 0, 1],
        )
    }

    #[test]
    fn test_shaped_reward() -> Result<()> {
        let r: SharedReward =
            Arc::new(|s: &ArrayD<f32>, _: &ArrayD<f32>, s_: &ArrayD<f32>, _: &[i8]| s_ - s);
        let canonical = CanonicalReward::new(unit_potential()?, r, 0.5);
        let sample = sample()?;

        // r + 0.5 * 1 - 1
        let expected = array![0.5f32, 1.5, -0.5].into_dyn();
        let out = canonical.evaluate_sample(&sample)?;
        assert!(out.iter().zip(expected.iter()).all(|(a, b)| (a - b).abs() < 1e-6));

        let opts = CallOptions::default().differentiable(true).device(Device::Cpu);
        let t = canonical.call(&sample, opts)?;
        assert!(matches!(t, RewardOutput::Tensor(_)));
        assert_eq!(t.into_array()?, out);
        assert!(canonical.stop_reason().is_none());
        Ok(())
    }

    #[test]
    fn test_broadcast_reward_rejected() -> Result<()> {
        let r: SharedReward = Arc::new(|s: &ArrayD<f32>, _: &ArrayD<f32>, _: &ArrayD<f32>, _: &[i8]| {
            s.clone().insert_axis(ndarray::Axis(1))
        });
        let canonical = CanonicalReward::new(unit_potential()?, r, 0.9);
        let err = canonical.evaluate_sample(&sample()?).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DivfreeError>(),
            Some(&DivfreeError::RewardRankMismatch {
                reward_rank: 2,
                shaping_rank: 1
            })
        );
        Ok(())
    }

    #[test]
    fn test_misaligned_sample_rejected() -> Result<()> {
        let r: SharedReward =
            Arc::new(|s: &ArrayD<f32>, _: &ArrayD<f32>, s_: &ArrayD<f32>, _: &[i8]| s_ - s);
        let canonical = CanonicalReward::new(unit_potential()?, r, 0.9);
        let s = array![0f32, 1.].into_dyn();
        let err = canonical.evaluate(&s, &s, &s, &[0]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DivfreeError>(),
            Some(DivfreeError::BatchLengthMismatch { .. })
        ));
        Ok(())
    }
}
