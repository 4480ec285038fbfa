//! Video frame sampling and audio transcription.
//!
//! Frame and audio extraction shell out to `ffmpeg`/`ffprobe`; the
//! sampled artifacts live in a temp directory for the duration of the
//! call. Transcription goes to an OpenAI-compatible Whisper endpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mnemo_core::{ExtractError, ImageDescriber, Transcriber, VideoDescriber, VideoDescription};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

const FFMPEG: &str = "ffmpeg";
const FFPROBE: &str = "ffprobe";

/// Audio transcriber backed by an OpenAI-compatible Whisper endpoint.
pub struct WhisperTranscriber {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl WhisperTranscriber {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractError::Failed(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        debug!(path = %path.display(), model = %self.model, "transcribing audio");
        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Timeout(self.timeout_secs)
                } else {
                    ExtractError::Failed(format!("transcription request: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(ExtractError::Failed(format!(
                "transcription backend returned {}",
                response.status()
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Parse(format!("transcription response: {e}")))?;
        Ok(parsed.text)
    }
}

/// Video describer that samples frames with ffmpeg, describes each via
/// an [`ImageDescriber`], and transcribes the audio track when a
/// transcriber is configured.
pub struct FfmpegVideoDescriber {
    image: Arc<dyn ImageDescriber>,
    transcriber: Option<Arc<dyn Transcriber>>,
    max_frames: usize,
}

impl FfmpegVideoDescriber {
    pub fn new(
        image: Arc<dyn ImageDescriber>,
        transcriber: Option<Arc<dyn Transcriber>>,
        max_frames: usize,
    ) -> Self {
        Self {
            image,
            transcriber,
            max_frames: max_frames.max(1),
        }
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, ExtractError> {
        let ffprobe = which::which(FFPROBE)
            .map_err(|_| ExtractError::ConverterUnavailable(FFPROBE.to_string()))?;
        let output = Command::new(ffprobe)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "csv=p=0"])
            .arg(path)
            .output()
            .await?;
        if !output.status.success() {
            return Err(ExtractError::Failed(format!(
                "{FFPROBE} exited with {}",
                output.status
            )));
        }
        let raw = String::from_utf8_lossy(&output.stdout);
        raw.trim()
            .parse::<f64>()
            .map_err(|_| ExtractError::Parse(format!("unreadable duration: {}", raw.trim())))
    }

    /// Sample up to `max_frames` evenly spaced frames into `dir`.
    async fn sample_frames(&self, path: &Path, dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
        let ffmpeg = which::which(FFMPEG)
            .map_err(|_| ExtractError::ConverterUnavailable(FFMPEG.to_string()))?;
        let duration = self.probe_duration(path).await?.max(0.1);
        let fps = self.max_frames as f64 / duration;

        let pattern = dir.join("frame_%04d.jpg");
        let output = Command::new(ffmpeg)
            .arg("-i")
            .arg(path)
            .args(["-vf", &format!("fps={fps}")])
            .args(["-frames:v", &self.max_frames.to_string()])
            .arg(&pattern)
            .args(["-y", "-loglevel", "error"])
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Failed(format!(
                "{FFMPEG} frame sampling failed: {}",
                stderr.trim()
            )));
        }

        let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|e| e == "jpg"))
            .collect();
        frames.sort();
        Ok(frames)
    }

    async fn extract_audio(&self, path: &Path, dir: &Path) -> Option<PathBuf> {
        let ffmpeg = which::which(FFMPEG).ok()?;
        let out_path = dir.join("audio.wav");
        let output = Command::new(ffmpeg)
            .arg("-i")
            .arg(path)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
            .arg(&out_path)
            .args(["-y", "-loglevel", "error"])
            .output()
            .await
            .ok()?;
        let has_audio = output.status.success()
            && out_path.metadata().map(|m| m.len() > 0).unwrap_or(false);
        has_audio.then_some(out_path)
    }
}

#[async_trait]
impl VideoDescriber for FfmpegVideoDescriber {
    async fn describe(
        &self,
        path: &Path,
        context: Option<&str>,
    ) -> Result<VideoDescription, ExtractError> {
        let workdir = tempfile::tempdir()?;

        let frames = self.sample_frames(path, workdir.path()).await?;
        debug!(path = %path.display(), frames = frames.len(), "sampled video frames");

        let mut frame_descriptions = Vec::with_capacity(frames.len());
        for frame in &frames {
            match self.image.describe(frame, context).await {
                Ok(description) => frame_descriptions.push(description),
                Err(e) => warn!(frame = %frame.display(), error = %e, "frame description failed"),
            }
        }

        let mut transcript = None;
        if let Some(transcriber) = &self.transcriber {
            if let Some(audio) = self.extract_audio(path, workdir.path()).await {
                match transcriber.transcribe(&audio).await {
                    Ok(text) if !text.trim().is_empty() => transcript = Some(text),
                    Ok(_) => {}
                    Err(e) => warn!(path = %path.display(), error = %e, "transcription failed"),
                }
            }
        }

        Ok(VideoDescription {
            frame_descriptions,
            transcript,
        })
    }
}

/// No-op video describer returning a fixed marker and no transcript.
pub struct PlaceholderVideoDescriber;

#[async_trait]
impl VideoDescriber for PlaceholderVideoDescriber {
    async fn describe(
        &self,
        path: &Path,
        _context: Option<&str>,
    ) -> Result<VideoDescription, ExtractError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("video");
        Ok(VideoDescription {
            frame_descriptions: vec![format!("[video: {name}]")],
            transcript: None,
        })
    }
}
