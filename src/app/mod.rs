use crate::api::{ApiServer, ApiState};
use crate::config::Config;
use crate::export::RecordingExporter;
use crate::feedback::FeedbackCollector;
use crate::global;
use crate::media::DesktopMediaBackend;
use crate::questions::QuestionSet;
use crate::session::{
    AudioLevelHandle, InterviewController, PermissionGate, SessionStatusHandle,
};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

pub async fn run_service() -> Result<()> {
    info!("Starting rehearse service");

    let config = Config::load()?;
    let questions = QuestionSet::load()?;
    info!("Loaded {} interview question(s)", questions.len());

    let backend = Arc::new(DesktopMediaBackend::new(config.session.chunk_interval_ms));

    let speaker_clip = match &config.session.speaker_clip {
        Some(path) => path.clone(),
        None => PathBuf::from("voices/One.mp3"),
    };
    let gate = PermissionGate::new(
        backend.clone(),
        config.session.require_speaker_check,
        speaker_clip,
    );

    let status = SessionStatusHandle::default();
    let level = AudioLevelHandle::default();
    let feedback = FeedbackCollector::default();

    let exporter = if config.export.enabled {
        let dir = match &config.export.dir {
            Some(dir) => dir.clone(),
            None => global::exports_dir()?,
        };
        let attempt_id = status.get().await.attempt_id;
        info!("Recording export enabled, writing to {:?}", dir);
        Some(RecordingExporter::new(dir, attempt_id))
    } else {
        None
    };

    let controller = InterviewController::new(
        config.session.clone(),
        questions.clone(),
        backend,
        gate.clone(),
        status.clone(),
        level.clone(),
        feedback.clone(),
        exporter,
    );
    let (handle, _task) = controller.spawn();

    let state = ApiState {
        controller: handle,
        status,
        gate,
        level,
        feedback,
        questions,
    };

    let api_server = ApiServer::new(config.server.port, state);

    info!("Rehearse is ready!");
    info!(
        "Grant permissions, then start: curl -X POST http://127.0.0.1:{}/session/start",
        config.server.port
    );

    if let Err(e) = api_server.start().await {
        error!("API server failed: {}", e);
        return Err(e);
    }

    Ok(())
}
