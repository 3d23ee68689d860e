use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
/// Configuration of [`PotentialNet`](super::PotentialNet).
///
/// Fields missing in a YAML file take their default values.
pub struct PotentialConfig {
    /// Width of all hidden layers; `max(4 * state_dim, 128)` if `None`.
    pub hidden_dim: Option<usize>,

    /// Number of residual blocks.
    pub depth: usize,

    /// If `true`, each residual block starts with layer normalization.
    pub use_norm: bool,
}

impl Default for PotentialConfig {
    fn default() -> Self {
        Self {
            hidden_dim: None,
            depth: 1,
            use_norm: false,
        }
    }
}

impl PotentialConfig {
    /// Sets the width of hidden layers.
    pub fn hidden_dim(mut self, v: usize) -> Self {
        self.hidden_dim = Some(v);
        self
    }

    /// Sets the number of residual blocks.
    pub fn depth(mut self, v: usize) -> Self {
        self.depth = v;
        self
    }

    /// Sets whether residual blocks use layer normalization.
    pub fn use_norm(mut self, v: bool) -> Self {
        self.use_norm = v;
        self
    }

    /// Returns the width of hidden layers for states with `state_dim` features.
    pub fn hidden_dim_for(&self, state_dim: usize) -> usize {
        self.hidden_dim.unwrap_or_else(|| (4 * state_dim).max(128))
    }

    /// Constructs [`PotentialConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of potential network from {:?}", path_);
        Ok(b)
    }

    /// Saves [`PotentialConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of potential network into {:?}", path_);
        Ok(())
    }
}
