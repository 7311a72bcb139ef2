use async_trait::async_trait;
use thiserror::Error;

const WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
pub const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "wav", "m4a"];

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("no transcription text returned")]
    MissingText,
}

/// Speech-to-text for dictated notes. Failures never touch the field the
/// text was meant for.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        language: &str,
    ) -> Result<String, TranscriptionError>;
}

/// Rejects uploads the transcription endpoint would refuse anyway.
pub fn check_audio(file_name: &str, audio: &[u8]) -> Result<(), String> {
    if audio.is_empty() {
        return Err("audio file is empty".to_string());
    }
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        return Err(format!(
            "unsupported audio format '{}', expected one of {}",
            file_name,
            AUDIO_EXTENSIONS.join(", ")
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct WhisperTranscriber {
    http: reqwest::Client,
    api_key: String,
}

impl WhisperTranscriber {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        language: &str,
    ) -> Result<String, TranscriptionError> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let form = reqwest::multipart::Form::new()
            .text("model", "whisper-1")
            .text("language", language.to_string())
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio)
                    .file_name(file_name.to_string())
                    .mime_str(mime.essence_str())?,
            );

        let resp = self
            .http
            .post(WHISPER_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let json: serde_json::Value = resp.json().await?;
        json.get("text")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or(TranscriptionError::MissingText)
    }
}

#[cfg(test)]
pub struct StaticTranscriber(pub Option<String>);

#[cfg(test)]
#[async_trait]
impl Transcriber for StaticTranscriber {
    async fn transcribe(
        &self,
        _audio: Vec<u8>,
        _file_name: &str,
        _language: &str,
    ) -> Result<String, TranscriptionError> {
        self.0.clone().ok_or(TranscriptionError::MissingText)
    }
}
