//! Groq adapter: Implementation of `Transcriber` and `Reasoner`.
//!
//! Both services are reached through Groq's OpenAI-compatible API:
//! - `POST /audio/transcriptions` (multipart, Whisper models)
//! - `POST /chat/completions` (vision-language models, image inlined as a
//!   base64 data URL)
//!
//! Calls are blocking; the router suspends only here. A client built
//! without an API key still constructs, and every call then reports
//! `NotConfigured`, which the router degrades like any other failure.

use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::{AppConfig, GROQ_API_KEY_ENV};
use crate::domain::ImageRef;
use crate::ports::{Reasoner, ReasoningError, Transcriber, TranscriptionError};

/// Language hint sent with every transcription request.
const TRANSCRIPTION_LANGUAGE: &str = "en";

/// HTTP client for Groq's OpenAI-compatible endpoints.
pub struct GroqClient {
    base_url: String,
    api_key: Option<Zeroizing<String>>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GroqClient {
    /// Create a client against `base_url` (e.g. `https://api.groq.com/openai/v1`).
    ///
    /// # Errors
    /// Returns the underlying `reqwest` error if the TLS backend cannot be
    /// initialized.
    pub fn new(
        base_url: &str,
        api_key: Option<Zeroizing<String>>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    /// Build a client from process configuration.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        if config.groq_api_key.is_none() {
            tracing::warn!("{GROQ_API_KEY_ENV} not set: transcription and reasoning requests will degrade");
        }
        Ok(Self::new(
            &config.groq_base_url,
            config.groq_api_key.clone(),
            config.http_timeout,
        )?)
    }

    fn bearer(&self) -> Option<String> {
        self.api_key
            .as_ref()
            .map(|key| format!("Bearer {}", key.as_str()))
    }
}

/// Read an image and inline it as a `data:` URL.
///
/// # Errors
/// Returns `ReasoningError::UnreadableImage` if the file cannot be read.
pub fn encode_image(image: &ImageRef) -> Result<String, ReasoningError> {
    let bytes = std::fs::read(image.path())
        .map_err(|e| ReasoningError::UnreadableImage(format!("{image}: {e}")))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{encoded}", image.mime_type()))
}

/// Request body for `/chat/completions`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// Response body from `/chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Response body from `/audio/transcriptions`.
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

fn build_chat_request<'a>(model: &'a str, prompt: &'a str, image_url: Option<String>) -> ChatRequest<'a> {
    let mut content = vec![ContentPart::Text { text: prompt }];
    if let Some(url) = image_url {
        content.push(ContentPart::ImageUrl {
            image_url: ImageUrl { url },
        });
    }
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content,
        }],
    }
}

fn parse_chat_response(body: &str) -> Result<String, ReasoningError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ReasoningError::InvalidResponse(e.to_string()))?;
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ReasoningError::InvalidResponse("empty completion".to_string()))?;
    Ok(text)
}

impl Reasoner for GroqClient {
    fn reason(
        &self,
        prompt: &str,
        image: Option<&ImageRef>,
        model_id: &str,
    ) -> Result<String, ReasoningError> {
        let bearer = self
            .bearer()
            .ok_or(ReasoningError::NotConfigured(GROQ_API_KEY_ENV))?;
        let image_url = image.map(encode_image).transpose()?;
        let body = build_chat_request(model_id, prompt, image_url);
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(model = model_id, with_image = image.is_some(), "Sending reasoning request");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, bearer)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ReasoningError::Timeout(self.timeout_secs)
                } else {
                    ReasoningError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ReasoningError::InvalidResponse(e.to_string()))?;
        if !status.is_success() {
            return Err(ReasoningError::Service {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_chat_response(&text)
    }
}

impl Transcriber for GroqClient {
    fn transcribe(&self, audio: &Path, model_id: &str) -> Result<String, TranscriptionError> {
        let bearer = self
            .bearer()
            .ok_or(TranscriptionError::NotConfigured(GROQ_API_KEY_ENV))?;
        let bytes = std::fs::read(audio)
            .map_err(|e| TranscriptionError::UnreadableAudio(format!("{}: {e}", audio.display())))?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let form = reqwest::blocking::multipart::Form::new()
            .text("model", model_id.to_string())
            .text("language", TRANSCRIPTION_LANGUAGE)
            .part(
                "file",
                reqwest::blocking::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let url = format!("{}/audio/transcriptions", self.base_url);
        tracing::debug!(model = model_id, "Sending transcription request");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, bearer)
            .multipart(form)
            .send()
            .map_err(|e| TranscriptionError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TranscriptionError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranscriptionResponse = response
            .json()
            .map_err(|e| TranscriptionError::InvalidResponse(e.to_string()))?;
        Ok(parsed.text.trim().to_string())
    }
}
