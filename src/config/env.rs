//! Environment variable loading.
//!
//! `.env` is applied to the process environment in `main` before this runs,
//! so everything here reads real environment variables only.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ServerConfig, TlsConfig};
use crate::core::realtime::openai::{DEFAULT_OPENAI_REALTIME_MODEL, OPENAI_REALTIME_URL};
use crate::core::realtime::{TranslationProfile, VadSettings};
use crate::core::registry::{DEFAULT_CALL_METADATA_CAPACITY, DEFAULT_CALL_METADATA_TTL};

pub(crate) const DEFAULT_HOST: &str = "0.0.0.0";
pub(crate) const DEFAULT_PORT: u16 = 3000;
pub(crate) const DEFAULT_RATE_LIMIT_RPS: u32 = 60;
pub(crate) const DEFAULT_RATE_LIMIT_BURST: u32 = 10;
pub(crate) const DEFAULT_MAX_CONNECTIONS_PER_IP: u32 = 100;

/// Read a variable, treating empty or whitespace-only values as unset.
pub(crate) fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse a variable; a present but unparsable value is an error.
pub(crate) fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match env_string(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Invalid {key} value: {raw}").into()),
        None => Ok(None),
    }
}

pub(crate) fn env_bool(key: &str) -> Result<Option<bool>, Box<dyn std::error::Error>> {
    match env_string(key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(format!("Invalid {key} value: {raw}").into()),
        },
        None => Ok(None),
    }
}

/// Build the TLS section from an enabled flag and the two paths.
pub(crate) fn tls_from_parts(
    enabled: bool,
    cert_path: Option<String>,
    key_path: Option<String>,
) -> Result<Option<TlsConfig>, Box<dyn std::error::Error>> {
    if !enabled {
        return Ok(None);
    }
    match (cert_path, key_path) {
        (Some(cert), Some(key)) => Ok(Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        })),
        _ => Err("TLS is enabled but TLS_CERT_PATH and TLS_KEY_PATH are not both set".into()),
    }
}

/// Load configuration from environment variables with defaults.
pub(crate) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let profile = TranslationProfile::default();
    let vad = VadSettings::default();

    let tls = tls_from_parts(
        env_bool("TLS_ENABLED")?.unwrap_or(false),
        env_string("TLS_CERT_PATH"),
        env_string("TLS_KEY_PATH"),
    )?;

    // Set-but-empty disables transcription; unset keeps the default model.
    let input_transcription_model = match env::var("INPUT_TRANSCRIPTION_MODEL") {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(value.trim().to_string()),
        Err(_) => profile.transcription_model.clone(),
    };

    Ok(ServerConfig {
        host: env_string("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env_parse("PORT")?.unwrap_or(DEFAULT_PORT),
        tls,
        public_base_url: env_string("PUBLIC_BASE_URL"),
        openai_api_key: env_string("OPENAI_API_KEY"),
        openai_realtime_url: env_string("OPENAI_REALTIME_URL")
            .unwrap_or_else(|| OPENAI_REALTIME_URL.to_string()),
        openai_realtime_model: env_string("OPENAI_REALTIME_MODEL")
            .unwrap_or_else(|| DEFAULT_OPENAI_REALTIME_MODEL.to_string()),
        translation_voice: env_string("TRANSLATION_VOICE").unwrap_or(profile.voice.clone()),
        translation_temperature: env_parse("TRANSLATION_TEMPERATURE")?
            .unwrap_or(profile.temperature),
        translation_max_response_tokens: env_parse("TRANSLATION_MAX_RESPONSE_TOKENS")?
            .unwrap_or(profile.max_response_output_tokens),
        vad_threshold: env_parse("VAD_THRESHOLD")?.unwrap_or(vad.threshold),
        vad_prefix_padding_ms: env_parse("VAD_PREFIX_PADDING_MS")?
            .unwrap_or(vad.prefix_padding_ms),
        vad_silence_duration_ms: env_parse("VAD_SILENCE_DURATION_MS")?
            .unwrap_or(vad.silence_duration_ms),
        input_transcription_model,
        call_metadata_ttl_seconds: env_parse("CALL_METADATA_TTL_SECONDS")?
            .unwrap_or(DEFAULT_CALL_METADATA_TTL.as_secs()),
        call_metadata_max_entries: env_parse("CALL_METADATA_MAX_ENTRIES")?
            .unwrap_or(DEFAULT_CALL_METADATA_CAPACITY),
        rate_limit_requests_per_second: env_parse("RATE_LIMIT_REQUESTS_PER_SECOND")?
            .unwrap_or(DEFAULT_RATE_LIMIT_RPS),
        rate_limit_burst_size: env_parse("RATE_LIMIT_BURST_SIZE")?
            .unwrap_or(DEFAULT_RATE_LIMIT_BURST),
        max_websocket_connections: env_parse("MAX_WEBSOCKET_CONNECTIONS")?,
        max_connections_per_ip: env_parse("MAX_CONNECTIONS_PER_IP")?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS_PER_IP),
    })
}
