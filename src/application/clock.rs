// Simulation clock - drives telemetry, alert and detection ticks at independent cadences
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Something the clock ticks.
#[async_trait]
pub trait TickTarget: Send + Sync {
    async fn telemetry_tick(&self, token: &EpochToken);
    async fn alert_tick(&self, token: &EpochToken);
    async fn detection_tick(&self, token: &EpochToken);
}

/// Proof that a callback was scheduled by the clock's current run.
///
/// `stop` bumps the epoch, so a callback holding an older token must not
/// mutate anything even if it already woke up.
#[derive(Debug, Clone)]
pub struct EpochToken {
    epoch: watch::Receiver<u64>,
    issued: u64,
}

impl EpochToken {
    pub fn is_current(&self) -> bool {
        *self.epoch.borrow() == self.issued
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy)]
pub struct ClockIntervals {
    pub telemetry: Duration,
    pub alert: Duration,
    pub detection: Duration,
}

pub struct SimulationClock {
    intervals: ClockIntervals,
    epoch: watch::Sender<u64>,
    tasks: Vec<JoinHandle<()>>,
}

impl SimulationClock {
    pub fn new(intervals: ClockIntervals) -> Self {
        let (epoch, _) = watch::channel(0);
        Self {
            intervals,
            epoch,
            tasks: Vec::new(),
        }
    }

    pub fn state(&self) -> ClockState {
        if self.tasks.is_empty() {
            ClockState::Stopped
        } else {
            ClockState::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == ClockState::Running
    }

    fn token(&self) -> EpochToken {
        EpochToken {
            epoch: self.epoch.subscribe(),
            issued: *self.epoch.borrow(),
        }
    }

    /// Spawn the tick loops. Returns false if the clock was already running.
    pub fn start(&mut self, target: Arc<dyn TickTarget>) -> bool {
        if self.is_running() {
            tracing::debug!("Simulation clock already running");
            return false;
        }

        let ClockIntervals {
            telemetry,
            alert,
            detection,
        } = self.intervals;
        for (period, kind) in [
            (telemetry, TickKind::Telemetry),
            (alert, TickKind::Alert),
            (detection, TickKind::Detection),
        ] {
            let token = self.token();
            self.tasks.push(spawn_loop(period, token, target.clone(), kind));
        }

        tracing::info!(
            "Simulation clock started (telemetry every {:?}, alerts every {:?}, detection every {:?})",
            telemetry,
            alert,
            detection
        );
        true
    }

    /// Halt the loops. Returns false if the clock was already stopped.
    ///
    /// A tick already past its epoch check runs to completion; the loop exits
    /// right after it, or immediately if it is waiting for the next period.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }

        self.epoch.send_modify(|epoch| *epoch += 1);
        // Detach rather than abort so no tick is cut off between its writes.
        self.tasks.clear();

        tracing::info!("Simulation clock stopped");
        true
    }
}

impl Drop for SimulationClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Copy)]
enum TickKind {
    Telemetry,
    Alert,
    Detection,
}

fn spawn_loop(
    period: Duration,
    mut token: EpochToken,
    target: Arc<dyn TickTarget>,
    kind: TickKind,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // First tick lands one full period after start.
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let closed = tokio::select! {
                _ = interval.tick() => false,
                changed = token.epoch.changed() => changed.is_err(),
            };
            if closed || !token.is_current() {
                break;
            }
            match kind {
                TickKind::Telemetry => target.telemetry_tick(&token).await,
                TickKind::Alert => target.alert_tick(&token).await,
                TickKind::Detection => target.detection_tick(&token).await,
            }
        }
    })
}
