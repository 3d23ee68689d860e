//! Potential network.
mod base;
mod config;
pub use base::{PotentialNet, ResidualBlock};
pub use config::PotentialConfig;
