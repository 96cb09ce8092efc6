//! Merging of environment and YAML configuration.

use super::ServerConfig;
use super::env::{load_from_env, tls_from_parts};
use super::yaml::YamlConfig;

/// Load the environment base and apply YAML overrides on top.
pub(crate) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = load_from_env()?;
    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(url) = server.public_base_url {
            config.public_base_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(tls) = server.tls {
            let enabled = tls.enabled.unwrap_or(config.tls.is_some());
            let cert = tls.cert_path.or_else(|| {
                config
                    .tls
                    .as_ref()
                    .map(|t| t.cert_path.display().to_string())
            });
            let key = tls.key_path.or_else(|| {
                config
                    .tls
                    .as_ref()
                    .map(|t| t.key_path.display().to_string())
            });
            config.tls = tls_from_parts(enabled, cert, key)?;
        }
    }

    if let Some(providers) = yaml.providers {
        if let Some(key) = providers.openai_api_key {
            config.openai_api_key = Some(key);
        }
        if let Some(url) = providers.openai_realtime_url {
            config.openai_realtime_url = url;
        }
        if let Some(model) = providers.openai_realtime_model {
            config.openai_realtime_model = model;
        }
    }

    if let Some(translation) = yaml.translation {
        if let Some(voice) = translation.voice {
            config.translation_voice = voice;
        }
        if let Some(temperature) = translation.temperature {
            config.translation_temperature = temperature;
        }
        if let Some(tokens) = translation.max_response_tokens {
            config.translation_max_response_tokens = tokens;
        }
        if let Some(model) = translation.transcription_model {
            config.input_transcription_model = Some(model).filter(|m| !m.trim().is_empty());
        }
        if let Some(vad) = translation.vad {
            if let Some(threshold) = vad.threshold {
                config.vad_threshold = threshold;
            }
            if let Some(padding) = vad.prefix_padding_ms {
                config.vad_prefix_padding_ms = padding;
            }
            if let Some(silence) = vad.silence_duration_ms {
                config.vad_silence_duration_ms = silence;
            }
        }
    }

    if let Some(registry) = yaml.registry {
        if let Some(ttl) = registry.ttl_seconds {
            config.call_metadata_ttl_seconds = ttl;
        }
        if let Some(max_entries) = registry.max_entries {
            config.call_metadata_max_entries = max_entries;
        }
    }

    if let Some(security) = yaml.security {
        if let Some(rps) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
        if let Some(max) = security.max_websocket_connections {
            config.max_websocket_connections = Some(max);
        }
        if let Some(per_ip) = security.max_connections_per_ip {
            config.max_connections_per_ip = per_ip;
        }
    }

    Ok(config)
}
