//! Configuration validation.

use url::Url;

use super::ServerConfig;
use crate::core::realtime::openai::OpenAIRealtimeVoice;

/// Temperatures the Realtime API accepts.
pub(crate) const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.6..=1.2;

pub(crate) fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_openai_key(config.openai_api_key.as_deref())?;
    validate_realtime_url(&config.openai_realtime_url)?;
    validate_public_base_url(config.public_base_url.as_deref())?;
    validate_translation(config)?;
    validate_registry(config.call_metadata_ttl_seconds, config.call_metadata_max_entries)?;
    Ok(())
}

pub(crate) fn validate_openai_key(key: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    match key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err("OPENAI_API_KEY is required (or providers.openai_api_key in YAML)".into()),
    }
}

pub(crate) fn validate_realtime_url(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Url::parse(url).map_err(|e| format!("Invalid OPENAI_REALTIME_URL '{url}': {e}"))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(format!("OPENAI_REALTIME_URL must use ws or wss, got '{other}'").into()),
    }
}

pub(crate) fn validate_public_base_url(
    url: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(url) = url else {
        return Ok(());
    };
    let parsed = Url::parse(url).map_err(|e| format!("Invalid PUBLIC_BASE_URL '{url}': {e}"))?;
    match parsed.scheme() {
        "http" | "https" | "ws" | "wss" if parsed.host_str().is_some() => Ok(()),
        "http" | "https" | "ws" | "wss" => Err(format!("PUBLIC_BASE_URL has no host: {url}").into()),
        other => Err(format!("PUBLIC_BASE_URL must be http(s) or ws(s), got '{other}'").into()),
    }
}

pub(crate) fn validate_translation(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !TEMPERATURE_RANGE.contains(&config.translation_temperature) {
        return Err(format!(
            "TRANSLATION_TEMPERATURE must be between {} and {}, got {}",
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end(),
            config.translation_temperature
        )
        .into());
    }
    if !(0.0..=1.0).contains(&config.vad_threshold) {
        return Err(format!(
            "VAD_THRESHOLD must be between 0.0 and 1.0, got {}",
            config.vad_threshold
        )
        .into());
    }
    if config.translation_max_response_tokens == 0 {
        return Err("TRANSLATION_MAX_RESPONSE_TOKENS must be greater than 0".into());
    }
    if OpenAIRealtimeVoice::parse(&config.translation_voice).is_none() {
        let voices: Vec<_> = OpenAIRealtimeVoice::all()
            .iter()
            .map(|v| v.as_str())
            .collect();
        return Err(format!(
            "Unsupported TRANSLATION_VOICE '{}'. Supported: {}",
            config.translation_voice,
            voices.join(", ")
        )
        .into());
    }
    Ok(())
}

pub(crate) fn validate_registry(
    ttl_seconds: u64,
    max_entries: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    if ttl_seconds == 0 {
        return Err("CALL_METADATA_TTL_SECONDS must be greater than 0".into());
    }
    if max_entries == 0 {
        return Err("CALL_METADATA_MAX_ENTRIES must be greater than 0".into());
    }
    Ok(())
}
