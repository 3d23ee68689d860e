use super::StopReason;
use crate::{CanonicalReward, LrScheduler, Optimizer};
use anyhow::Result;
use divfree_core::{LossHistory, TransitionsDataset};
use log::{debug, info, trace};
use rand::rngs::StdRng;

/// Early stopping fires when the losses of the patience window vary less than this.
pub(crate) const EARLY_STOPPING_TOL: f32 = 1e-6;

/// Signal returned by [`PotentialTrainer::epoch_step()`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum EpochOutcome {
    Continue,
    Stop(StopReason),
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Trains the potential network of a [`CanonicalReward`].
///
/// The loss of a minibatch is the mean of the squared shaped rewards. Training runs as
/// follows:
///
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Initializing
///     Initializing --> TrainingEpoch
///     TrainingEpoch --> TrainingEpoch: Continue
///     TrainingEpoch --> EarlyStopped: losses plateaued
///     TrainingEpoch --> MaxEpochsReached: epoch == max_epochs
///     EarlyStopped --> [*]
///     MaxEpochsReached --> [*]
/// ```
///
/// In each epoch:
///
/// 1. The transitions are shuffled.
/// 2. For every full minibatch, the loss is computed and one optimization step is done.
///    The loss is appended to the history.
/// 3. If early stopping is enabled and `max - min` of the last `patience` losses is below
///    `1e-6`, training stops.
/// 4. The learning rate scheduler advances one epoch.
pub(crate) struct PotentialTrainer {
    canonical: CanonicalReward,
    opt: Optimizer,
    scheduler: LrScheduler,
    dataset: TransitionsDataset,
    rng: StdRng,
    history: LossHistory,
    batch_size: usize,
    max_epochs: usize,
    patience: Option<usize>,
    log_interval: usize,
    epoch: usize,
}

impl PotentialTrainer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        canonical: CanonicalReward,
        opt: Optimizer,
        scheduler: LrScheduler,
        dataset: TransitionsDataset,
        rng: StdRng,
        batch_size: usize,
        max_epochs: usize,
        patience: Option<usize>,
        log_interval: usize,
    ) -> Self {
        Self {
            canonical,
            opt,
            scheduler,
            dataset,
            rng,
            history: LossHistory::new(),
            batch_size,
            max_epochs,
            patience,
            log_interval,
            epoch: 0,
        }
    }

    /// Runs one epoch.
    pub fn epoch_step(&mut self) -> Result<EpochOutcome> {
        self.dataset.shuffle(&mut self.rng);

        for batch in self.dataset.minibatches(self.batch_size) {
            let loss = self.canonical.forward_tensor(&batch?)?.sqr()?.mean_all()?;
            self.opt.backward_step(&loss)?;
            let loss = loss.to_scalar::<f32>()?;
            trace!("epoch = {}, loss = {}", self.epoch, loss);
            self.history.push(loss);
        }

        if self.log_interval > 0 && self.epoch % self.log_interval == 0 {
            debug!(
                "epoch = {}, loss = {:?}, lr = {}",
                self.epoch,
                self.history.last(),
                self.opt.learning_rate()
            );
        }

        if let Some(patience) = self.patience {
            if self.history.has_plateaued(patience, EARLY_STOPPING_TOL) {
                return Ok(EpochOutcome::Stop(StopReason::EarlyStopped { epoch: self.epoch }));
            }
        }

        let lr = self.scheduler.step();
        self.opt.set_learning_rate(lr);
        self.epoch += 1;

        match self.epoch >= self.max_epochs {
            true => Ok(EpochOutcome::Stop(StopReason::MaxEpochsReached)),
            false => Ok(EpochOutcome::Continue),
        }
    }

    /// Trains until a stop condition holds and returns the trained canonical reward.
    pub fn run(mut self) -> Result<CanonicalReward> {
        loop {
            if let EpochOutcome::Stop(reason) = self.epoch_step()? {
                info!(
                    "Training finished: {:?}, {} losses, final loss = {:?}",
                    reason,
                    self.history.len(),
                    self.history.last()
                );
                return Ok(self.canonical.with_history(self.history, reason));
            }
        }
    }
}
