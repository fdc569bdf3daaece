//! Webcam capture via nokhwa.
//!
//! Frames are requested in MJPEG so each frame is already an encoded JPEG;
//! frames captured within one chunk interval are concatenated into a
//! motion-JPEG chunk. The camera handle is not `Send`, so capture runs on
//! its own thread, mirroring the microphone capture.

use crate::media::error::MediaAccessError;
use crate::media::stream::{MediaChunk, MediaTrack, TrackKind};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::{query, Camera, NokhwaError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

pub const WEBCAM_MIME: &str = "video/x-motion-jpeg";

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FRAME_RATE: u32 = 30;

/// Start capturing the first available webcam.
pub fn start_capture(chunk_interval: Duration) -> Result<MediaTrack, MediaAccessError> {
    let devices = query(ApiBackend::Auto).map_err(classify)?;
    if devices.is_empty() {
        return Err(MediaAccessError::DeviceNotFound);
    }

    let (chunk_tx, chunk_rx) = mpsc::unbounded_channel::<MediaChunk>();
    let stopped = Arc::new(AtomicBool::new(false));
    let stopped_for_thread = Arc::clone(&stopped);

    let (ready_tx, ready_rx) = std_mpsc::channel::<Result<String, MediaAccessError>>();

    std::thread::Builder::new()
        .name("webcam-capture".into())
        .spawn(move || {
            capture_thread(chunk_tx, stopped_for_thread, chunk_interval, ready_tx);
        })
        .map_err(|e| MediaAccessError::Unknown(format!("Failed to spawn capture thread: {e}")))?;

    let label = ready_rx
        .recv()
        .map_err(|_| MediaAccessError::Aborted)??;

    info!("Webcam capture started on {}", label);

    let track = MediaTrack::new(TrackKind::Video, label, WEBCAM_MIME, stopped, chunk_rx);
    Ok(track)
}

fn capture_thread(
    chunk_tx: mpsc::UnboundedSender<MediaChunk>,
    stopped: Arc<AtomicBool>,
    chunk_interval: Duration,
    ready_tx: std_mpsc::Sender<Result<String, MediaAccessError>>,
) {
    let mut camera = match open_camera() {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = ready_tx.send(Err(classify(e)));
        return;
    }

    let _ = ready_tx.send(Ok(camera.info().human_name()));

    let mut chunk: MediaChunk = Vec::new();
    let mut chunk_started = Instant::now();

    while !stopped.load(Ordering::SeqCst) {
        match camera.frame_raw() {
            Ok(frame) => chunk.extend_from_slice(&frame),
            Err(e) => {
                error!("Webcam frame error: {}", e);
                break;
            }
        }

        if chunk_started.elapsed() >= chunk_interval {
            if chunk_tx.send(std::mem::take(&mut chunk)).is_err() {
                break;
            }
            chunk_started = Instant::now();
        }
    }

    if !chunk.is_empty() {
        let _ = chunk_tx.send(chunk);
    }

    if let Err(e) = camera.stop_stream() {
        debug!("Webcam stream stop reported: {}", e);
    }
    debug!("Webcam capture thread exited");
}

fn open_camera() -> Result<Camera, MediaAccessError> {
    let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
        CameraFormat::new(
            Resolution::new(WIDTH, HEIGHT),
            FrameFormat::MJPEG,
            FRAME_RATE,
        ),
    ));

    Camera::new(CameraIndex::Index(0), format).map_err(classify)
}

fn classify(err: NokhwaError) -> MediaAccessError {
    match err {
        NokhwaError::OpenDeviceError(_, _) | NokhwaError::OpenStreamError(_) => {
            MediaAccessError::DeviceBusy
        }
        NokhwaError::NotImplementedError(_) | NokhwaError::UnsupportedOperationError(_) => {
            MediaAccessError::ConstraintsUnsatisfiable
        }
        other => MediaAccessError::Unknown(other.to_string()),
    }
}
