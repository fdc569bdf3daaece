//! Live microphone amplitude monitor.
//!
//! Samples the capture backend's amplitude tap at display-frame cadence
//! while a recording is active and republishes the value for UI display.
//! The sampling task ends the instant the active flag drops; no sample
//! outlives the recording.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::debug;

/// Roughly one sample per drawn frame.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub struct AudioLevelMonitor {
    level_rx: watch::Receiver<u8>,
    task: JoinHandle<()>,
}

impl AudioLevelMonitor {
    /// Start sampling `tap` until `active` becomes false.
    pub fn start(tap: watch::Receiver<u8>, mut active: watch::Receiver<bool>) -> Self {
        let (tx, level_rx) = watch::channel(0u8);

        let task = tokio::spawn(async move {
            let mut frames = interval(FRAME_INTERVAL);
            loop {
                tokio::select! {
                    _ = frames.tick() => {
                        let _ = tx.send(*tap.borrow());
                    }
                    changed = active.changed() => {
                        if changed.is_err() || !*active.borrow() {
                            break;
                        }
                    }
                }
            }
            let _ = tx.send(0);
            debug!("Audio level monitor stopped");
        });

        Self { level_rx, task }
    }

    /// Current amplitude, 0-255.
    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.level_rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AudioLevelMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_monitor_tracks_tap_while_active() {
        let (tap_tx, tap_rx) = watch::channel(0u8);
        let (active_tx, active_rx) = watch::channel(true);

        let monitor = AudioLevelMonitor::start(tap_rx, active_rx);
        let mut level = monitor.subscribe();

        tap_tx.send(180).unwrap();
        sleep(Duration::from_millis(60)).await;
        assert_eq!(*level.borrow_and_update(), 180);

        let _ = active_tx;
    }

    #[tokio::test]
    async fn test_monitor_terminates_when_recording_stops() {
        let (_tap_tx, tap_rx) = watch::channel(42u8);
        let (active_tx, active_rx) = watch::channel(true);

        let monitor = AudioLevelMonitor::start(tap_rx, active_rx);
        sleep(Duration::from_millis(40)).await;
        assert!(!monitor.is_finished());

        active_tx.send(false).unwrap();
        sleep(Duration::from_millis(40)).await;
        assert!(monitor.is_finished());
        assert_eq!(*monitor.subscribe().borrow(), 0);
    }

    #[tokio::test]
    async fn test_monitor_terminates_when_active_sender_dropped() {
        let (_tap_tx, tap_rx) = watch::channel(0u8);
        let (active_tx, active_rx) = watch::channel(true);

        let monitor = AudioLevelMonitor::start(tap_rx, active_rx);
        drop(active_tx);
        sleep(Duration::from_millis(40)).await;
        assert!(monitor.is_finished());
    }
}
