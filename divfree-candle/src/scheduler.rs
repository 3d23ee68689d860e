//! Scheduling the learning rate over epochs.
use serde::{Deserialize, Serialize};

/// Learning-rate multiplier as a function of the epoch.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub enum LrSchedule {
    /// The multiplier is always 1.
    Constant,

    /// 1 up to epoch 5000, 0.5 up to epoch 7500, 0.25 afterwards.
    Piecewise,
}

impl LrSchedule {
    /// Returns the multiplier of the base learning rate at `epoch`.
    pub fn multiplier(&self, epoch: usize) -> f64 {
        match self {
            Self::Constant => 1.0,
            Self::Piecewise => match epoch {
                0..=5000 => 1.0,
                5001..=7500 => 0.5,
                _ => 0.25,
            },
        }
    }
}

/// Scheduler of the learning rate.
#[derive(Clone, Debug, PartialEq)]
pub struct LrScheduler {
    /// Learning rate at epoch 0.
    pub base_lr: f64,

    /// Schedule of the multiplier.
    pub schedule: LrSchedule,

    /// Current epoch.
    pub epoch: usize,
}

impl LrScheduler {
    /// Creates a scheduler.
    pub fn new(base_lr: f64, schedule: LrSchedule) -> Self {
        Self {
            base_lr,
            schedule,
            epoch: 0,
        }
    }

    /// Gets the learning rate of the current epoch.
    pub fn lr(&self) -> f64 {
        self.base_lr * self.schedule.multiplier(self.epoch)
    }

    /// Advances one epoch and returns the new learning rate.
    pub fn step(&mut self) -> f64 {
        self.epoch += 1;
        self.lr()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_piecewise_schedule() {
        let s = LrSchedule::Piecewise;
        assert_eq!(s.multiplier(0), 1.0);
        assert_eq!(s.multiplier(5000), 1.0);
        assert_eq!(s.multiplier(5001), 0.5);
        assert_eq!(s.multiplier(7500), 0.5);
        assert_eq!(s.multiplier(7501), 0.25);
        assert_eq!(s.multiplier(100_000), 0.25);
        assert_eq!(LrSchedule::Constant.multiplier(100_000), 1.0);
    }

    #[test]
    fn test_scheduler_step() {
        let mut sched = LrScheduler::new(1e-3, LrSchedule::Piecewise);
        assert_eq!(sched.lr(), 1e-3);
        for _ in 0..5000 {
            sched.step();
        }
        assert_eq!(sched.lr(), 1e-3);
        assert_eq!(sched.step(), 5e-4);
    }
}
