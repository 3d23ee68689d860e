use super::PotentialConfig;
use crate::util::{copy_vars, init_linear_uniform};
use anyhow::Result;
use candle_core::{DType, Device, Module, Tensor, Var};
use candle_nn::{layer_norm, linear, LayerNorm, Linear, VarBuilder, VarMap};
use divfree_core::DivfreeError;
use log::info;
use std::path::Path;

/// Residual block `x + ln1(relu(ln0(norm(x))))`.
pub struct ResidualBlock {
    norm: Option<LayerNorm>,
    ln0: Linear,
    ln1: Linear,
}

impl ResidualBlock {
    fn build(vb: VarBuilder, dim: usize, use_norm: bool) -> Result<Self> {
        let norm = match use_norm {
            true => Some(layer_norm(dim, 1e-5, vb.pp("norm"))?),
            false => None,
        };

        Ok(Self {
            norm,
            ln0: linear(dim, dim, vb.pp("ln0"))?,
            ln1: linear(dim, dim, vb.pp("ln1"))?,
        })
    }
}

impl Module for ResidualBlock {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let h = match &self.norm {
            Some(norm) => norm.forward(xs)?,
            None => xs.clone(),
        };
        let h = self.ln1.forward(&self.ln0.forward(&h)?.relu()?)?;
        xs + h
    }
}

/// Network mapping a flattened state to a scalar potential.
///
/// The architecture is
/// `linear(in_dim, hidden) -> relu -> depth x residual block -> relu -> linear(hidden, 1)`,
/// where the last `relu` is omitted when there are no residual blocks.
///
/// The network owns its parameters in a [`VarMap`].
pub struct PotentialNet {
    in_dim: usize,
    hidden_dim: usize,
    config: PotentialConfig,
    device: Device,
    varmap: VarMap,
    input: Linear,
    blocks: Vec<ResidualBlock>,
    output: Linear,
}

impl PotentialNet {
    /// Builds a network for states with `in_dim` features.
    ///
    /// Parameters of linear layers are initialized with a random number generator
    /// seeded by `seed`.
    pub fn build(in_dim: usize, config: &PotentialConfig, device: &Device, seed: u64) -> Result<Self> {
        let net = Self::build_uninit(in_dim, config, device)?;
        init_linear_uniform(&net.varmap, seed)?;
        Ok(net)
    }

    fn build_uninit(in_dim: usize, config: &PotentialConfig, device: &Device) -> Result<Self> {
        let hidden_dim = config.hidden_dim_for(in_dim);
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);

        let input = linear(in_dim, hidden_dim, vb.pp("input"))?;
        let blocks = (0..config.depth)
            .map(|i| ResidualBlock::build(vb.pp(format!("block{}", i)), hidden_dim, config.use_norm))
            .collect::<Result<Vec<_>>>()?;
        let output = linear(hidden_dim, 1, vb.pp("output"))?;

        Ok(Self {
            in_dim,
            hidden_dim,
            config: config.clone(),
            device: device.clone(),
            varmap,
            input,
            blocks,
            output,
        })
    }

    /// Returns a copy of the network with its parameters on `device`.
    pub fn to_device(&self, device: &Device) -> Result<Self> {
        let net = Self::build_uninit(self.in_dim, &self.config, device)?;
        copy_vars(&net.varmap, &self.varmap)?;
        Ok(net)
    }

    /// Returns potentials of shape `(batch_size, 1)` for states of shape
    /// `(batch_size, in_dim)`.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let dim = xs.dims().get(1).copied().unwrap_or(0);
        if xs.rank() != 2 || dim != self.in_dim {
            return Err(DivfreeError::StateDimMismatch {
                expected: self.in_dim,
                actual: dim,
            }
            .into());
        }

        let mut h = self.input.forward(&xs.to_device(&self.device)?)?.relu()?;
        for block in self.blocks.iter() {
            h = block.forward(&h)?;
        }
        if !self.blocks.is_empty() {
            h = h.relu()?;
        }

        Ok(self.output.forward(&h)?)
    }

    /// Returns the number of input features.
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    /// Returns the width of hidden layers.
    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    /// Returns the device of the parameters.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Returns all trainable variables.
    pub fn vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters in safetensors format.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save potential network to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads parameters saved with [`save()`](Self::save).
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load potential network from {:?}", path.as_ref());
        Ok(())
    }
}
