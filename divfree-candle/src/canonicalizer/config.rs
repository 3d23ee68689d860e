//! Configuration of [`DivergenceFree`](super::DivergenceFree).
use crate::{Device, LrSchedule, OptimizerConfig, PotentialConfig};
use anyhow::Result;
use divfree_core::DivfreeError;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Hyperparameters of the training loop of the potential network.
///
/// Fields missing in a YAML file take their default values.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct TrainingConfig {
    /// Learning rate of AdamW at epoch 0.
    pub learning_rate: f64,

    /// Decoupled weight decay of AdamW.
    pub weight_decay: f64,

    /// Maximum number of epochs.
    pub max_epochs: usize,

    /// Number of transitions in a minibatch, clamped to the number of transitions drawn.
    pub batch_size: usize,

    /// Device of the potential network.
    pub device: Device,

    /// If `true`, the learning rate decays with [`LrSchedule::Piecewise`].
    pub use_scheduler: bool,

    /// If `true`, training stops when the losses stop changing.
    pub early_stopping: bool,

    /// Number of most recent losses inspected by early stopping.
    pub early_stopping_patience: usize,

    /// Seed of parameter initialization and shuffling.
    pub seed: u64,

    /// Interval of debug logs in epochs; `0` disables them.
    pub log_interval: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            weight_decay: 0.01,
            max_epochs: 10000,
            batch_size: usize::MAX,
            device: Device::Cpu,
            use_scheduler: true,
            early_stopping: true,
            early_stopping_patience: 1000,
            seed: 42,
            log_interval: 1000,
        }
    }
}

impl TrainingConfig {
    /// Sets the learning rate.
    pub fn learning_rate(mut self, v: f64) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets the weight decay.
    pub fn weight_decay(mut self, v: f64) -> Self {
        self.weight_decay = v;
        self
    }

    /// Sets the maximum number of epochs.
    pub fn max_epochs(mut self, v: usize) -> Self {
        self.max_epochs = v;
        self
    }

    /// Sets the minibatch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Enables or disables the learning-rate schedule.
    pub fn use_scheduler(mut self, v: bool) -> Self {
        self.use_scheduler = v;
        self
    }

    /// Enables or disables early stopping.
    pub fn early_stopping(mut self, v: bool) -> Self {
        self.early_stopping = v;
        self
    }

    /// Sets the patience of early stopping.
    pub fn early_stopping_patience(mut self, v: usize) -> Self {
        self.early_stopping_patience = v;
        self
    }

    /// Sets the seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the interval of debug logs.
    pub fn log_interval(mut self, v: usize) -> Self {
        self.log_interval = v;
        self
    }

    /// Returns an error if a hyperparameter is out of its domain.
    pub fn validate(&self) -> Result<(), DivfreeError> {
        let err = |msg: &str| Err(DivfreeError::InvalidConfig(msg.to_string()));

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return err("learning_rate must be positive");
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return err("weight_decay must be non-negative");
        }
        if self.max_epochs == 0 {
            return err("max_epochs must be positive");
        }
        if self.batch_size == 0 {
            return err("batch_size must be positive");
        }
        if self.early_stopping_patience == 0 {
            return err("early_stopping_patience must be positive");
        }
        Ok(())
    }

    /// Returns the minibatch size for `n_samples` transitions.
    pub fn batch_size_for(&self, n_samples: usize) -> usize {
        self.batch_size.min(n_samples)
    }

    /// Returns the configuration of the optimizer.
    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig::default()
            .learning_rate(self.learning_rate)
            .weight_decay(self.weight_decay)
    }

    /// Returns the learning-rate schedule.
    pub fn lr_schedule(&self) -> LrSchedule {
        match self.use_scheduler {
            true => LrSchedule::Piecewise,
            false => LrSchedule::Constant,
        }
    }

    /// Constructs [`TrainingConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of training from {:?}", path_);
        Ok(b)
    }

    /// Saves [`TrainingConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of training into {:?}", path_);
        Ok(())
    }
}

/// Configuration of [`DivergenceFree`](super::DivergenceFree).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct DivergenceFreeConfig {
    #[serde(default)]
    pub potential: PotentialConfig,

    #[serde(default)]
    pub training: TrainingConfig,
}

impl DivergenceFreeConfig {
    /// Sets the configuration of the potential network.
    pub fn potential(mut self, v: PotentialConfig) -> Self {
        self.potential = v;
        self
    }

    /// Sets the configuration of the training loop.
    pub fn training(mut self, v: TrainingConfig) -> Self {
        self.training = v;
        self
    }

    /// Constructs [`DivergenceFreeConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of divergence-free canonicalizer from {:?}", path_);
        Ok(b)
    }

    /// Saves [`DivergenceFreeConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of divergence-free canonicalizer into {:?}", path_);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_divergence_free_config() -> Result<()> {
        let config = DivergenceFreeConfig::default()
            .potential(PotentialConfig::default().hidden_dim(64).depth(2).use_norm(true))
            .training(
                TrainingConfig::default()
                    .learning_rate(3e-4)
                    .max_epochs(200)
                    .batch_size(64)
                    .device(Device::Cuda(1))
                    .seed(7),
            );

        let dir = TempDir::new("divergence_free_config")?;
        let path = dir.path().join("divergence_free_config.yaml");
        config.save(&path)?;
        let config_ = DivergenceFreeConfig::load(&path)?;
        assert_eq!(config, config_);

        let path = dir.path().join("training_config.yaml");
        config.training.save(&path)?;
        assert_eq!(config.training, TrainingConfig::load(&path)?);
        Ok(())
    }

    #[test]
    fn test_load_partial_config() -> Result<()> {
        let dir = TempDir::new("partial_config")?;
        let path = dir.path().join("divergence_free_config.yaml");
        std::fs::write(
            &path,
            "potential:\n  use_norm: true\ntraining:\n  max_epochs: 50\n  seed: 3\n",
        )?;

        let config = DivergenceFreeConfig::load(&path)?;
        assert_eq!(config.potential, PotentialConfig::default().use_norm(true));
        assert_eq!(
            config.training,
            TrainingConfig::default().max_epochs(50).seed(3)
        );
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(TrainingConfig::default().validate().is_ok());
        assert!(matches!(
            TrainingConfig::default().learning_rate(0.0).validate(),
            Err(DivfreeError::InvalidConfig(_))
        ));
        assert!(TrainingConfig::default().weight_decay(-1.0).validate().is_err());
        assert!(TrainingConfig::default().max_epochs(0).validate().is_err());
        assert!(TrainingConfig::default().batch_size(0).validate().is_err());
        assert!(TrainingConfig::default()
            .early_stopping_patience(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_batch_size_clamped() {
        let config = TrainingConfig::default();
        assert_eq!(config.batch_size_for(500), 500);
        assert_eq!(config.clone().batch_size(64).batch_size_for(500), 64);
        assert_eq!(config.batch_size(64).batch_size_for(10), 10);
    }
}
