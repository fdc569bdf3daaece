//! Per-question countdown timer.
//!
//! One tick per elapsed second while armed; fires exactly one expiry at
//! zero, then disarms itself. Re-arming always starts from the full
//! duration and cancels any previous pending expiry. Expiry and a manual
//! submit may race; the submit path is idempotent by phase, not by timer
//! state, so a late event is harmless.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining: u32 },
    Expired,
}

pub struct CountdownTimer {
    events: mpsc::UnboundedSender<TimerEvent>,
    task: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    pub fn new(events: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self { events, task: None }
    }

    /// Arm the countdown for the full duration, cancelling any previous
    /// arm.
    pub fn arm(&mut self, seconds: u32) {
        self.cancel();

        let events = self.events.clone();
        self.task = Some(tokio::spawn(async move {
            let mut seconds_left = seconds;
            let mut ticks = interval(Duration::from_secs(1));
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately.
            ticks.tick().await;

            while seconds_left > 0 {
                ticks.tick().await;
                seconds_left -= 1;
                if events
                    .send(TimerEvent::Tick {
                        remaining: seconds_left,
                    })
                    .is_err()
                {
                    return;
                }
            }

            debug!("Answer window elapsed");
            let _ = events.send(TimerEvent::Expired);
        }));
    }

    /// Cancel a pending expiry. Safe to call when not armed.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
