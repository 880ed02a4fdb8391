//! Cosmetic progress for a running analysis.
//!
//! The remote analyzer reports nothing until it answers, so the reporter walks
//! a fixed timed schedule instead. Its values are display-only and never decide
//! the outcome of a submission.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tokio::sync::{broadcast, watch};
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub label: String,
}

impl ProgressUpdate {
    pub fn new(percent: u8, label: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            label: label.into(),
        }
    }

    fn idle() -> Self {
        Self::new(0, "")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStage {
    pub percent: u8,
    pub label: String,
    /// Wait before this stage is shown.
    pub delay: Duration,
}

impl ProgressStage {
    pub fn new(percent: u8, label: impl Into<String>, delay: Duration) -> Self {
        Self {
            percent,
            label: label.into(),
            delay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSchedule {
    pub initial_label: String,
    pub stages: Vec<ProgressStage>,
    pub completion_label: String,
    /// How long the 100% state stays up before the result is revealed.
    pub completion_hold: Duration,
}

impl Default for ProgressSchedule {
    fn default() -> Self {
        let ms = Duration::from_millis;
        Self {
            initial_label: "Initializing analysis...".into(),
            stages: vec![
                ProgressStage::new(20, "Uploading document...", ms(1000)),
                ProgressStage::new(40, "Extracting text from PDF...", ms(2000)),
                ProgressStage::new(60, "Analyzing financial data...", ms(3000)),
                ProgressStage::new(80, "Processing with AI...", ms(2000)),
                ProgressStage::new(95, "Finalizing results...", ms(1000)),
            ],
            completion_label: "Analysis complete!".into(),
            completion_hold: ms(500),
        }
    }
}

impl ProgressSchedule {
    /// Same stages with every wait multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = factor.max(0.0);
        let mut scaled = self.clone();
        for stage in &mut scaled.stages {
            stage.delay = stage.delay.mul_f64(factor);
        }
        scaled.completion_hold = scaled.completion_hold.mul_f64(factor);
        scaled
    }

    pub fn instant() -> Self {
        Self::default().scaled(0.0)
    }

    pub fn total_delay(&self) -> Duration {
        self.stages.iter().map(|stage| stage.delay).sum()
    }
}

/// Publishes progress for one session. Within a run, published percentages
/// never decrease; lower values are dropped.
pub struct ProgressReporter {
    current: watch::Sender<ProgressUpdate>,
    events: broadcast::Sender<ProgressUpdate>,
    epoch: AtomicU64,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (current, _) = watch::channel(ProgressUpdate::idle());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            current,
            events,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> ProgressUpdate {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.events.subscribe()
    }

    /// Starts a new run at 0% and returns its epoch.
    pub(crate) fn begin(&self, schedule: &ProgressSchedule) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let initial = ProgressUpdate::new(0, schedule.initial_label.clone());
        self.current.send_replace(initial.clone());
        let _ = self.events.send(initial);
        epoch
    }

    /// Abandons the active run and returns to idle.
    pub(crate) fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.current.send_replace(ProgressUpdate::idle());
    }

    /// Walks the schedule. Stops publishing once `epoch` is no longer current.
    pub(crate) async fn run(&self, epoch: u64, schedule: &ProgressSchedule) {
        for stage in &schedule.stages {
            tokio::time::sleep(stage.delay).await;
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return;
            }
            self.publish(epoch, ProgressUpdate::new(stage.percent, stage.label.clone()));
        }
    }

    pub(crate) async fn complete(&self, epoch: u64, schedule: &ProgressSchedule) {
        self.publish(
            epoch,
            ProgressUpdate::new(100, schedule.completion_label.clone()),
        );
        tokio::time::sleep(schedule.completion_hold).await;
    }

    fn publish(&self, epoch: u64, update: ProgressUpdate) -> bool {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        let accepted = self.current.send_if_modified(|current| {
            if update.percent < current.percent {
                return false;
            }
            *current = update.clone();
            true
        });
        if accepted {
            debug!(percent = update.percent, label = %update.label, "progress");
            let _ = self.events.send(update);
        }
        accepted
    }
}
