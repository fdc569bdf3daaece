//! Interview session sequencer.
//!
//! Runs as a single task owning the whole question loop: permission
//! gating, per-question recording lifecycle, the countdown timer and the
//! append-only recordings sequence. API handlers drive it through a
//! command channel; manual submits and timer expiries funnel into the
//! same idempotent submit path, guarded by phase.

use crate::config::SessionConfig;
use crate::export::RecordingExporter;
use crate::feedback::FeedbackCollector;
use crate::media::MediaBackend;
use crate::questions::QuestionSet;
use crate::session::gate::PermissionGate;
use crate::session::phase::Phase;
use crate::session::recording::{Recording, RecordingSession};
use crate::session::status::{AudioLevelHandle, SessionState, SessionStatusHandle};
use crate::session::timer::{CountdownTimer, TimerEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

type Reply = oneshot::Sender<Result<SessionState, String>>;

pub enum SessionCommand {
    /// Start the interview; rejected while any required capability is
    /// missing.
    Start(Reply),
    /// Begin recording the current question's answer.
    BeginAnswer(Reply),
    /// Submit the current answer.
    Submit(Reply),
    /// Re-attempt the current question after an error.
    Retry(Reply),
}

/// Cloneable handle for driving the controller task.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl ControllerHandle {
    pub async fn start(&self) -> Result<SessionState, String> {
        self.send(SessionCommand::Start).await
    }

    pub async fn begin_answer(&self) -> Result<SessionState, String> {
        self.send(SessionCommand::BeginAnswer).await
    }

    pub async fn submit(&self) -> Result<SessionState, String> {
        self.send(SessionCommand::Submit).await
    }

    pub async fn retry(&self) -> Result<SessionState, String> {
        self.send(SessionCommand::Retry).await
    }

    async fn send(
        &self,
        make: impl FnOnce(Reply) -> SessionCommand,
    ) -> Result<SessionState, String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .map_err(|_| "Session controller is not running".to_string())?;
        reply_rx
            .await
            .map_err(|_| "Session controller dropped the request".to_string())?
    }
}

pub struct InterviewController {
    config: SessionConfig,
    questions: QuestionSet,
    gate: PermissionGate,
    recording: RecordingSession,
    timer: CountdownTimer,
    timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    status: SessionStatusHandle,
    level: AudioLevelHandle,
    feedback: FeedbackCollector,
    exporter: Option<RecordingExporter>,
    recordings: Vec<Recording>,
    current_question: usize,
    phase: Phase,
}

impl InterviewController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SessionConfig,
        questions: QuestionSet,
        backend: Arc<dyn MediaBackend>,
        gate: PermissionGate,
        status: SessionStatusHandle,
        level: AudioLevelHandle,
        feedback: FeedbackCollector,
        exporter: Option<RecordingExporter>,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Self {
            config,
            questions,
            gate,
            recording: RecordingSession::new(backend),
            timer: CountdownTimer::new(timer_tx),
            timer_rx,
            status,
            level,
            feedback,
            exporter,
            recordings: Vec::new(),
            current_question: 0,
            phase: Phase::Idle,
        }
    }

    /// Spawn the controller task and return the command handle.
    pub fn spawn(mut self) -> (ControllerHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            self.set_phase(Phase::PermissionPending).await;
            loop {
                tokio::select! {
                    command = rx.recv() => match command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    },
                    Some(event) = self.timer_rx.recv() => self.handle_timer(event).await,
                }
            }
            // Releasing media locks on shutdown is unconditional.
            self.recording.teardown();
            self.level.detach();
            info!("Session controller stopped");
        });

        (ControllerHandle { tx }, task)
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start(reply) => {
                let result = self.handle_start().await;
                let _ = reply.send(self.with_state(result).await);
            }
            SessionCommand::BeginAnswer(reply) => {
                let result = match self.phase {
                    Phase::Loading => self.start_answer().await,
                    phase => Err(format!(
                        "Cannot begin an answer while {}",
                        phase.as_str()
                    )),
                };
                let _ = reply.send(self.with_state(result).await);
            }
            SessionCommand::Submit(reply) => {
                let result = match self.phase {
                    Phase::Recording => self.submit_answer().await,
                    // A second submit racing the first is a no-op.
                    Phase::Submitting | Phase::Loading | Phase::Complete => Ok(()),
                    phase => Err(format!("No active answer to submit ({})", phase.as_str())),
                };
                let _ = reply.send(self.with_state(result).await);
            }
            SessionCommand::Retry(reply) => {
                let result = match self.phase {
                    Phase::Errored => {
                        info!("Retrying question {}", self.current_question + 1);
                        self.start_answer().await
                    }
                    phase => Err(format!("Nothing to retry while {}", phase.as_str())),
                };
                let _ = reply.send(self.with_state(result).await);
            }
        }
    }

    async fn handle_start(&mut self) -> Result<(), String> {
        match self.phase {
            Phase::Idle | Phase::PermissionPending => {}
            _ => return Err("Interview already started".to_string()),
        }

        if !self.gate.ready().await {
            self.set_phase(Phase::PermissionPending).await;
            let missing: Vec<&str> = self
                .gate
                .missing()
                .await
                .iter()
                .map(|c| c.as_str())
                .collect();
            return Err(format!(
                "Please ensure all permissions are granted before proceeding (missing: {})",
                missing.join(", ")
            ));
        }

        // The question loop acquires its own stream per question.
        self.gate.release_preview().await;

        self.current_question = 0;
        self.recordings.clear();
        self.phase = Phase::Loading;
        self.status.begin_interview(self.questions.len()).await;
        info!("Interview started: {} questions", self.questions.len());
        Ok(())
    }

    /// Start recording the current question. Shared by the first attempt
    /// and error retries, which re-attempt the same index.
    async fn start_answer(&mut self) -> Result<(), String> {
        // Stale events from a previous arm are void once we re-arm.
        while self.timer_rx.try_recv().is_ok() {}

        match self.recording.start(self.current_question).await {
            Ok(()) => {
                if let Some(level) = self.recording.level() {
                    self.level.attach(level);
                }
                self.phase = Phase::Recording;
                self.status
                    .begin_answer(self.current_question, self.config.answer_seconds)
                    .await;
                self.timer.arm(self.config.answer_seconds);
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to start recording for question {}: {}",
                    self.current_question + 1,
                    e
                );
                self.level.detach();
                self.phase = Phase::Errored;
                self.status.set_error(e.to_string()).await;
                Err(e.to_string())
            }
        }
    }

    /// The single submit path for manual submits and timer expiry.
    async fn submit_answer(&mut self) -> Result<(), String> {
        self.phase = Phase::Submitting;
        self.status.begin_submit().await;
        self.timer.cancel();
        self.level.detach();

        let recording = match self.recording.finalize().await {
            Ok(recording) => recording,
            Err(e) => {
                error!("Failed to finalize recording: {}", e);
                self.phase = Phase::Errored;
                self.status.set_error(e.to_string()).await;
                return Err(e.to_string());
            }
        };

        if let Some(exporter) = &self.exporter {
            // Export is developer convenience; failure never loses the answer.
            if let Err(e) = exporter.export(&recording) {
                warn!("Failed to export recording: {}", e);
            }
        }

        self.recordings.push(recording);
        info!(
            "Question {} submitted ({}/{})",
            self.current_question + 1,
            self.recordings.len(),
            self.questions.len()
        );

        let next = self.current_question + 1;
        if next < self.questions.len() {
            self.current_question = next;
            self.phase = Phase::Loading;
            self.status
                .answer_submitted(self.recordings.len(), Some(next))
                .await;
            // Brief buffer between questions; pacing only.
            tokio::time::sleep(tokio::time::Duration::from_secs(
                self.config.interlude_seconds,
            ))
            .await;
        } else {
            self.phase = Phase::Complete;
            self.status
                .answer_submitted(self.recordings.len(), None)
                .await;
            let recordings = std::mem::take(&mut self.recordings);
            self.feedback.deliver_recordings(recordings).await;
            info!("Interview completed");
        }

        Ok(())
    }

    async fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Tick { remaining } => {
                if self.phase == Phase::Recording {
                    self.status.set_time_remaining(remaining).await;
                }
            }
            TimerEvent::Expired => {
                // Late expiries after a manual submit are phase-guarded out.
                if self.phase == Phase::Recording {
                    info!(
                        "Answer window for question {} elapsed, submitting",
                        self.current_question + 1
                    );
                    let _ = self.submit_answer().await;
                }
            }
        }
    }

    async fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.status.set_phase(phase).await;
    }

    async fn with_state(&self, result: Result<(), String>) -> Result<SessionState, String> {
        match result {
            Ok(()) => Ok(self.status.get().await),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fake::{FakeBackend, FakeOutcome};
    use crate::media::MediaAccessError;
    use std::path::PathBuf;
    use tokio::time::{sleep, Duration};

    struct Fixture {
        backend: FakeBackend,
        gate: PermissionGate,
        status: SessionStatusHandle,
        feedback: FeedbackCollector,
        handle: ControllerHandle,
    }

    async fn fixture(config: SessionConfig) -> Fixture {
        let backend = FakeBackend::new();
        let gate = PermissionGate::new(
            Arc::new(backend.clone()),
            config.require_speaker_check,
            PathBuf::from("voices/One.mp3"),
        );
        let status = SessionStatusHandle::default();
        let feedback = FeedbackCollector::default();
        let controller = InterviewController::new(
            config,
            QuestionSet::builtin(),
            Arc::new(backend.clone()),
            gate.clone(),
            status.clone(),
            AudioLevelHandle::default(),
            feedback.clone(),
            None,
        );
        let (handle, _task) = controller.spawn();

        Fixture {
            backend,
            gate,
            status,
            feedback,
            handle,
        }
    }

    fn quick_config() -> SessionConfig {
        SessionConfig {
            answer_seconds: 60,
            interlude_seconds: 0,
            require_speaker_check: false,
            chunk_interval_ms: 10,
            speaker_clip: None,
        }
    }

    async fn grant_all(fx: &Fixture) {
        fx.gate.request_camera_mic().await.unwrap();
        fx.gate.request_screen_share().await.unwrap();
        fx.gate.start_speaker_test().await.unwrap();
        fx.gate.confirm_speaker(true).await;
    }

    #[tokio::test]
    async fn test_start_rejected_until_gate_ready() {
        let fx = fixture(quick_config()).await;

        let err = fx.handle.start().await.unwrap_err();
        assert!(err.contains("camera"), "{err}");
        assert_eq!(fx.status.get().await.phase, Phase::PermissionPending);

        grant_all(&fx).await;
        let state = fx.handle.start().await.unwrap();
        assert_eq!(state.phase, Phase::Loading);
        assert_eq!(state.current_question, 0);
    }

    #[tokio::test]
    async fn test_mic_denied_then_granted_unlocks() {
        let fx = fixture(quick_config()).await;
        fx.backend
            .script(FakeOutcome::Deny(MediaAccessError::PermissionDenied));

        assert!(fx.gate.request_camera_mic().await.is_err());
        fx.gate.request_screen_share().await.unwrap();
        assert!(fx.handle.start().await.is_err());

        fx.gate.request_camera_mic().await.unwrap();
        assert!(fx.handle.start().await.is_ok());
    }

    #[tokio::test]
    async fn test_full_interview_manual_submits() {
        let fx = fixture(quick_config()).await;
        grant_all(&fx).await;
        fx.handle.start().await.unwrap();

        for question in 0..10 {
            let state = fx.handle.begin_answer().await.unwrap();
            assert_eq!(state.phase, Phase::Recording);
            assert_eq!(state.current_question, question);

            sleep(Duration::from_millis(20)).await;
            fx.handle.submit().await.unwrap();
        }

        let state = fx.status.get().await;
        assert_eq!(state.phase, Phase::Complete);
        assert_eq!(state.recordings_submitted, 10);

        // The full ordered sequence is handed to the feedback collector
        let summary = fx.feedback.recordings_summary().await;
        assert_eq!(summary.len(), 10);
        let order: Vec<usize> = summary.iter().map(|s| s.question_index).collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_double_submit_race_appends_once() {
        let fx = fixture(quick_config()).await;
        grant_all(&fx).await;
        fx.handle.start().await.unwrap();
        fx.handle.begin_answer().await.unwrap();
        sleep(Duration::from_millis(20)).await;

        // Two submits back to back: only the first has effect
        fx.handle.submit().await.unwrap();
        fx.handle.submit().await.unwrap();

        let state = fx.status.get().await;
        assert_eq!(state.recordings_submitted, 1);
        assert_eq!(state.current_question, 1);
        assert_eq!(state.phase, Phase::Loading);
    }

    #[tokio::test]
    async fn test_device_busy_mid_interview_stays_on_same_question() {
        let fx = fixture(quick_config()).await;
        grant_all(&fx).await;
        fx.handle.start().await.unwrap();

        for _ in 0..3 {
            fx.handle.begin_answer().await.unwrap();
            sleep(Duration::from_millis(20)).await;
            fx.handle.submit().await.unwrap();
        }

        // Question 4 (index 3) fails to acquire devices
        fx.backend
            .script(FakeOutcome::Deny(MediaAccessError::DeviceBusy));
        let err = fx.handle.begin_answer().await.unwrap_err();
        assert_eq!(err, MediaAccessError::DeviceBusy.to_string());

        let state = fx.status.get().await;
        assert_eq!(state.phase, Phase::Errored);
        assert_eq!(state.current_question, 3);

        // Retry re-attempts question 4, not question 5
        let state = fx.handle.retry().await.unwrap();
        assert_eq!(state.phase, Phase::Recording);
        assert_eq!(state.current_question, 3);

        sleep(Duration::from_millis(20)).await;
        let state = fx.handle.submit().await.unwrap();
        assert_eq!(state.recordings_submitted, 4);
    }

    #[tokio::test]
    async fn test_retry_rejected_outside_errored() {
        let fx = fixture(quick_config()).await;
        grant_all(&fx).await;
        fx.handle.start().await.unwrap();
        assert!(fx.handle.retry().await.is_err());
    }

    #[tokio::test]
    async fn test_submit_rejected_before_interview_starts() {
        let fx = fixture(quick_config()).await;

        let err = fx.handle.submit().await.unwrap_err();
        assert!(err.contains("No active answer"), "{err}");
    }

    #[tokio::test]
    async fn test_media_released_after_each_submit() {
        let fx = fixture(quick_config()).await;
        grant_all(&fx).await;
        fx.handle.start().await.unwrap();

        fx.handle.begin_answer().await.unwrap();
        sleep(Duration::from_millis(20)).await;
        fx.handle.submit().await.unwrap();

        assert!(fx.backend.all_issued_stopped());
    }

    #[tokio::test]
    async fn test_timer_expiry_auto_submits() {
        let mut config = quick_config();
        config.answer_seconds = 1;
        let fx = fixture(config).await;
        grant_all(&fx).await;
        fx.handle.start().await.unwrap();
        fx.handle.begin_answer().await.unwrap();

        // Wait past the one-second window; expiry submits automatically
        sleep(Duration::from_millis(1500)).await;
        let state = fx.status.get().await;
        assert_eq!(state.recordings_submitted, 1);
        assert_eq!(state.current_question, 1);
    }
}
