//! Microphone capture via cpal.
//!
//! Captures mono f32 samples and delivers them as WAV-encoded segments on
//! the configured chunk cadence. Each callback also feeds the amplitude
//! tap used by the audio level monitor.
//!
//! cpal streams are not `Send`, so the stream lives on a dedicated thread
//! that watches the track's stop flag and closes the chunk channel on exit.

use crate::media::error::MediaAccessError;
use crate::media::stream::{MediaChunk, MediaTrack, TrackKind};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

pub const MIC_MIME: &str = "audio/wav";
const SAMPLE_RATE: u32 = 44_100;

/// Start capturing the default input device.
///
/// Returns the live audio track plus the amplitude tap. Fails without
/// leaving anything capturing.
pub fn start_capture(
    chunk_interval: Duration,
) -> Result<(MediaTrack, watch::Receiver<u8>), MediaAccessError> {
    let (chunk_tx, chunk_rx) = mpsc::unbounded_channel::<MediaChunk>();
    let (level_tx, level_rx) = watch::channel(0u8);
    let stopped = Arc::new(AtomicBool::new(false));
    let stopped_for_thread = Arc::clone(&stopped);

    // Startup handshake: the capture thread reports whether the stream
    // could be built before we hand out the track.
    let (ready_tx, ready_rx) = std_mpsc::channel::<Result<String, MediaAccessError>>();

    std::thread::Builder::new()
        .name("mic-capture".into())
        .spawn(move || {
            capture_thread(chunk_tx, level_tx, stopped_for_thread, chunk_interval, ready_tx);
        })
        .map_err(|e| MediaAccessError::Unknown(format!("Failed to spawn capture thread: {e}")))?;

    let label = ready_rx
        .recv()
        .map_err(|_| MediaAccessError::Aborted)??;

    info!("Microphone capture started on {}", label);

    let track = MediaTrack::new(TrackKind::Audio, label, MIC_MIME, stopped, chunk_rx);
    Ok((track, level_rx))
}

fn capture_thread(
    chunk_tx: mpsc::UnboundedSender<MediaChunk>,
    level_tx: watch::Sender<u8>,
    stopped: Arc<AtomicBool>,
    chunk_interval: Duration,
    ready_tx: std_mpsc::Sender<Result<String, MediaAccessError>>,
) {
    let setup = build_stream(level_tx);
    let (stream, samples, label) = match setup {
        Ok(parts) => parts,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(MediaAccessError::Unknown(format!(
            "Failed to start input stream: {e}"
        ))));
        return;
    }

    let _ = ready_tx.send(Ok(label));

    while !stopped.load(Ordering::SeqCst) {
        std::thread::sleep(chunk_interval);

        let pending = {
            let mut samples = match samples.lock() {
                Ok(guard) => guard,
                Err(_) => break,
            };
            std::mem::take(&mut *samples)
        };

        if pending.is_empty() {
            continue;
        }

        match encode_wav_segment(&pending) {
            Ok(segment) => {
                if chunk_tx.send(segment).is_err() {
                    break;
                }
            }
            Err(e) => error!("Failed to encode audio chunk: {}", e),
        }
    }

    // Flush whatever arrived between the last tick and the stop flag.
    if let Ok(mut samples) = samples.lock() {
        let pending = std::mem::take(&mut *samples);
        if !pending.is_empty() {
            if let Ok(segment) = encode_wav_segment(&pending) {
                let _ = chunk_tx.send(segment);
            }
        }
    }

    drop(stream);
    debug!("Microphone capture thread exited");
}

type StreamParts = (cpal::Stream, Arc<Mutex<Vec<f32>>>, String);

fn build_stream(level_tx: watch::Sender<u8>) -> Result<StreamParts, MediaAccessError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(MediaAccessError::DeviceNotFound)?;

    let label = device.name().unwrap_or_else(|_| "microphone".to_string());

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    let samples = Arc::new(Mutex::new(Vec::new()));
    let samples_clone = Arc::clone(&samples);
    let err_fn = |err| error!("Microphone stream error: {}", err);

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = level_tx.send(amplitude(data));
                if let Ok(mut samples) = samples_clone.lock() {
                    samples.extend_from_slice(data);
                }
            },
            err_fn,
            None,
        )
        .map_err(classify_build_error)?;

    Ok((stream, samples, label))
}

fn classify_build_error(err: cpal::BuildStreamError) -> MediaAccessError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => MediaAccessError::DeviceBusy,
        cpal::BuildStreamError::StreamConfigNotSupported => {
            MediaAccessError::ConstraintsUnsatisfiable
        }
        other => MediaAccessError::Unknown(other.to_string()),
    }
}

/// Average absolute amplitude of a callback buffer, scaled to 0-255.
fn amplitude(data: &[f32]) -> u8 {
    if data.is_empty() {
        return 0;
    }
    let sum: f32 = data.iter().map(|s| s.abs()).sum();
    let average = sum / data.len() as f32;
    (average.min(1.0) * 255.0) as u8
}

/// Encode one chunk's samples as a standalone WAV segment.
fn encode_wav_segment(samples: &[f32]) -> Result<MediaChunk, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
