//! Voice I/O through OpenAI-compatible audio endpoints
//!
//! - `POST {base}/audio/speech` turns a reply into MP3 audio
//! - `POST {base}/audio/transcriptions` turns a recording into text

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const SPEECH_MODEL: &str = "tts-1";
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";

pub const VOICES: [&str; 6] = ["alloy", "echo", "fable", "onyx", "nova", "shimmer"];
pub const DEFAULT_VOICE: &str = "nova";

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("OPENAI_API_KEY is not set; voice features are unavailable")]
    MissingApiKey,

    #[error("Unknown voice '{0}'. Valid voices: alloy, echo, fable, onyx, nova, shimmer")]
    UnknownVoice(String),

    #[error("Audio request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Audio API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Checks a voice name against the supported list
pub fn validate_voice(voice: &str) -> Result<&'static str, SpeechError> {
    VOICES
        .iter()
        .copied()
        .find(|v| v.eq_ignore_ascii_case(voice))
        .ok_or_else(|| SpeechError::UnknownVoice(voice.to_string()))
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub struct SpeechClient {
    http: Client,
    api_base: String,
    api_key: Option<String>,
}

impl SpeechClient {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Whether a key is configured; without one every call fails fast
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn key(&self) -> Result<&str, SpeechError> {
        self.api_key.as_deref().ok_or(SpeechError::MissingApiKey)
    }

    pub async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, SpeechError> {
        let voice = validate_voice(voice)?;
        let key = self.key()?;
        let url = format!("{}/audio/speech", self.api_base);

        debug!("Synthesizing {} chars with voice {}", text.len(), voice);

        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .json(&SpeechRequest {
                model: SPEECH_MODEL,
                voice,
                input: text,
            })
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Synthesizes `text` and writes the MP3 to `output`
    pub async fn synthesize_to_file(
        &self,
        text: &str,
        voice: &str,
        output: &Path,
    ) -> Result<(), SpeechError> {
        let audio = self.synthesize(text, voice).await?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SpeechError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(output, &audio)
            .await
            .map_err(|source| SpeechError::Io {
                path: output.to_path_buf(),
                source,
            })?;

        info!("Wrote {} bytes of audio to {}", audio.len(), output.display());
        Ok(())
    }

    pub async fn transcribe(&self, audio_path: &Path) -> Result<String, SpeechError> {
        let key = self.key()?;
        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|source| SpeechError::Io {
                path: audio_path.to_path_buf(),
                source,
            })?;

        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let form = Form::new()
            .text("model", TRANSCRIPTION_MODEL)
            .part("file", Part::bytes(audio).file_name(file_name));

        let url = format!("{}/audio/transcriptions", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .multipart(form)
            .send()
            .await?;

        let transcript: TranscriptionResponse = check_status(response).await?.json().await?;
        debug!("Transcribed {}: {}", audio_path.display(), transcript.text);
        Ok(transcript.text)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SpeechError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(SpeechError::Api {
        status: status.as_u16(),
        message,
    })
}

impl std::fmt::Debug for SpeechClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechClient")
            .field("api_base", &self.api_base)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}
