//! Process-wide configuration.
//!
//! Loaded once at startup from the environment (and a `.env` file, if one
//! exists), then handed to adapters by value. Nothing here is mutated after
//! construction.
//!
//! # Secrets
//!
//! API keys are resolved in this order:
//! - `<NAME>_FILE` (read from a file path, e.g. a Docker secret)
//! - `<NAME>` (plain environment variable)
//!
//! They are held in [`Zeroizing`] buffers and never printed by `Debug`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use zeroize::Zeroizing;

pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";
pub const ELEVENLABS_API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
/// Keyless speech fallback used when no ElevenLabs key is set.
pub const DEFAULT_GOOGLE_TTS_BASE_URL: &str = "https://translate.google.com";
pub const DEFAULT_STT_MODEL: &str = "whisper-large-v3";
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
/// ElevenLabs premade voice "Laura".
pub const DEFAULT_VOICE_ID: &str = "FGY2WhTYpPnrIDTdsKH5";
pub const DEFAULT_VOICE_MODEL: &str = "eleven_turbo_v2";
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_22050_32";
pub const DEFAULT_AUDIO_OUTPUT: &str = "static/final.mp3";
pub const DEFAULT_CLASSIFIER_MODEL: &str = "models/tissue_classifier.onnx";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

/// Errors raised while assembling configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing secret: set {0} or {0}_FILE")]
    MissingSecret(&'static str),

    #[error("Cannot read secret file for {name}: {source}")]
    SecretFile {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Read-only settings shared by every adapter.
#[derive(Clone)]
pub struct AppConfig {
    pub groq_api_key: Option<Zeroizing<String>>,
    pub elevenlabs_api_key: Option<Zeroizing<String>>,
    pub groq_base_url: String,
    pub elevenlabs_base_url: String,
    pub google_tts_base_url: String,
    pub stt_model: String,
    pub vision_model: String,
    pub voice_id: String,
    pub voice_model: String,
    pub output_format: String,
    pub audio_output_path: PathBuf,
    pub classifier_model_path: PathBuf,
    pub http_timeout: Duration,
    pub playback: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            elevenlabs_api_key: None,
            groq_base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            elevenlabs_base_url: DEFAULT_ELEVENLABS_BASE_URL.to_string(),
            google_tts_base_url: DEFAULT_GOOGLE_TTS_BASE_URL.to_string(),
            stt_model: DEFAULT_STT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            voice_model: DEFAULT_VOICE_MODEL.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            audio_output_path: PathBuf::from(DEFAULT_AUDIO_OUTPUT),
            classifier_model_path: PathBuf::from(DEFAULT_CLASSIFIER_MODEL),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            playback: true,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |s: &Option<Zeroizing<String>>| if s.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("AppConfig")
            .field("groq_api_key", &redact(&self.groq_api_key))
            .field("elevenlabs_api_key", &redact(&self.elevenlabs_api_key))
            .field("groq_base_url", &self.groq_base_url)
            .field("elevenlabs_base_url", &self.elevenlabs_base_url)
            .field("google_tts_base_url", &self.google_tts_base_url)
            .field("stt_model", &self.stt_model)
            .field("vision_model", &self.vision_model)
            .field("voice_id", &self.voice_id)
            .field("voice_model", &self.voice_model)
            .field("output_format", &self.output_format)
            .field("audio_output_path", &self.audio_output_path)
            .field("classifier_model_path", &self.classifier_model_path)
            .field("http_timeout", &self.http_timeout)
            .field("playback", &self.playback)
            .finish()
    }
}

impl AppConfig {
    /// Load `.env` (best-effort) and build the config from the environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a secret file cannot be read or a numeric
    /// setting does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {e}");
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    ///
    /// # Errors
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        cfg.groq_api_key = read_secret(GROQ_API_KEY_ENV, &lookup)?;
        cfg.elevenlabs_api_key = read_secret(ELEVENLABS_API_KEY_ENV, &lookup)?;

        if let Some(v) = get("MEDIVOX_GROQ_BASE_URL") {
            cfg.groq_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("MEDIVOX_ELEVENLABS_BASE_URL") {
            cfg.elevenlabs_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("MEDIVOX_GOOGLE_TTS_BASE_URL") {
            cfg.google_tts_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("MEDIVOX_STT_MODEL") {
            cfg.stt_model = v;
        }
        if let Some(v) = get("MEDIVOX_VISION_MODEL") {
            cfg.vision_model = v;
        }
        if let Some(v) = get("MEDIVOX_VOICE_ID") {
            cfg.voice_id = v;
        }
        if let Some(v) = get("MEDIVOX_VOICE_MODEL") {
            cfg.voice_model = v;
        }
        if let Some(v) = get("MEDIVOX_OUTPUT_FORMAT") {
            cfg.output_format = v;
        }
        if let Some(v) = get("MEDIVOX_AUDIO_OUTPUT") {
            cfg.audio_output_path = PathBuf::from(v);
        }
        if let Some(v) = get("MEDIVOX_CLASSIFIER_MODEL") {
            cfg.classifier_model_path = PathBuf::from(v);
        }
        if let Some(v) = get("MEDIVOX_HTTP_TIMEOUT_SECS") {
            let secs = v
                .parse::<u64>()
                .ok()
                .filter(|&s| s > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "MEDIVOX_HTTP_TIMEOUT_SECS",
                    value: v.clone(),
                })?;
            cfg.http_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = get("MEDIVOX_PLAYBACK") {
            cfg.playback = parse_bool(&v);
        }

        Ok(cfg)
    }

    /// ElevenLabs key, or an error naming the variable to set.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingSecret` if the key is unset.
    pub fn require_elevenlabs_key(&self) -> Result<Zeroizing<String>, ConfigError> {
        self.elevenlabs_api_key
            .clone()
            .ok_or(ConfigError::MissingSecret(ELEVENLABS_API_KEY_ENV))
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(v, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}

fn read_secret<F>(name: &'static str, lookup: &F) -> Result<Option<Zeroizing<String>>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(&format!("{name}_FILE")) {
        let content = std::fs::read_to_string(Path::new(path.trim()))
            .map_err(|source| ConfigError::SecretFile { name, source })?;
        let secret = content.trim_end_matches(['\n', '\r']).to_string();
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret(name));
        }
        return Ok(Some(Zeroizing::new(secret)));
    }

    Ok(lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(Zeroizing::new))
}
