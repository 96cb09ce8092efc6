//! Configuration module for the Calldove gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use calldove_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod validation;
mod yaml;

use crate::core::realtime::openai::{DEFAULT_OPENAI_REALTIME_MODEL, OPENAI_REALTIME_URL};
use crate::core::realtime::{TranslationProfile, VadSettings};
use crate::core::registry::{DEFAULT_CALL_METADATA_CAPACITY, DEFAULT_CALL_METADATA_TTL};

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains:
/// - Listener settings (host, port, TLS, public URL)
/// - Translation backend credentials and endpoint
/// - Voice, generation and turn detection parameters
/// - Call metadata registry limits
/// - Security settings (rate limiting, connection limits)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Externally reachable base URL, e.g. `https://gw.example.com`.
    /// When unset the media stream URL is derived from the request Host header.
    pub public_base_url: Option<String>,

    // Translation backend
    pub openai_api_key: Option<String>,
    pub openai_realtime_url: String,
    pub openai_realtime_model: String,

    // Translation parameters
    pub translation_voice: String,
    pub translation_temperature: f32,
    pub translation_max_response_tokens: u32,
    pub vad_threshold: f32,
    pub vad_prefix_padding_ms: u32,
    pub vad_silence_duration_ms: u32,
    /// `None` disables caller transcription on the backend
    pub input_transcription_model: Option<String>,

    // Call metadata registry
    pub call_metadata_ttl_seconds: u64,
    pub call_metadata_max_entries: u64,

    // Rate limiting
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Default: 10
    pub rate_limit_burst_size: u32,

    // Connection limits
    /// Maximum concurrent WebSocket connections
    /// Default: None (unlimited)
    pub max_websocket_connections: Option<usize>,
    /// Maximum connections per IP address
    /// Default: 100
    pub max_connections_per_ip: u32,
}

/// Zeroize the backend key when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

/// Documented defaults. There is no API key, so this does not pass validation.
impl Default for ServerConfig {
    fn default() -> Self {
        let profile = TranslationProfile::default();
        Self {
            host: env::DEFAULT_HOST.to_string(),
            port: env::DEFAULT_PORT,
            tls: None,
            public_base_url: None,
            openai_api_key: None,
            openai_realtime_url: OPENAI_REALTIME_URL.to_string(),
            openai_realtime_model: DEFAULT_OPENAI_REALTIME_MODEL.to_string(),
            translation_voice: profile.voice,
            translation_temperature: profile.temperature,
            translation_max_response_tokens: profile.max_response_output_tokens,
            vad_threshold: profile.vad.threshold,
            vad_prefix_padding_ms: profile.vad.prefix_padding_ms,
            vad_silence_duration_ms: profile.vad.silence_duration_ms,
            input_transcription_model: profile.transcription_model,
            call_metadata_ttl_seconds: DEFAULT_CALL_METADATA_TTL.as_secs(),
            call_metadata_max_entries: DEFAULT_CALL_METADATA_CAPACITY,
            rate_limit_requests_per_second: env::DEFAULT_RATE_LIMIT_RPS,
            rate_limit_burst_size: env::DEFAULT_RATE_LIMIT_BURST,
            max_websocket_connections: None,
            max_connections_per_ip: env::DEFAULT_MAX_CONNECTIONS_PER_IP,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (and defaults), then validate.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env is loaded into the environment by main.rs before this runs.
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;

        validation::validate(&config)?;

        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Per-call voice and generation parameters.
    pub fn translation_profile(&self) -> TranslationProfile {
        TranslationProfile {
            voice: self.translation_voice.clone(),
            temperature: self.translation_temperature,
            max_response_output_tokens: self.translation_max_response_tokens,
            vad: VadSettings {
                threshold: self.vad_threshold,
                prefix_padding_ms: self.vad_prefix_padding_ms,
                silence_duration_ms: self.vad_silence_duration_ms,
            },
            transcription_model: self.input_transcription_model.clone(),
        }
    }

    pub fn call_metadata_ttl(&self) -> Duration {
        Duration::from_secs(self.call_metadata_ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    const ENV_KEYS: &[&str] = &[
        "HOST",
        "PORT",
        "TLS_ENABLED",
        "TLS_CERT_PATH",
        "TLS_KEY_PATH",
        "PUBLIC_BASE_URL",
        "OPENAI_API_KEY",
        "OPENAI_REALTIME_URL",
        "OPENAI_REALTIME_MODEL",
        "TRANSLATION_VOICE",
        "TRANSLATION_TEMPERATURE",
        "TRANSLATION_MAX_RESPONSE_TOKENS",
        "VAD_THRESHOLD",
        "VAD_PREFIX_PADDING_MS",
        "VAD_SILENCE_DURATION_MS",
        "INPUT_TRANSCRIPTION_MODEL",
        "CALL_METADATA_TTL_SECONDS",
        "CALL_METADATA_MAX_ENTRIES",
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        "RATE_LIMIT_BURST_SIZE",
        "MAX_WEBSOCKET_CONNECTIONS",
        "MAX_CONNECTIONS_PER_IP",
    ];

    // Helper to clean up environment variables
    fn cleanup_env_vars() {
        unsafe {
            for key in ENV_KEYS {
                env::remove_var(key);
            }
        }
    }

    fn write_yaml(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.yaml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "sk-env");
        }

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.address(), "0.0.0.0:3000");
        assert!(!config.is_tls_enabled());
        assert!(config.public_base_url.is_none());
        assert_eq!(config.openai_realtime_url, "wss://api.openai.com/v1/realtime");
        assert_eq!(
            config.openai_realtime_model,
            "gpt-4o-realtime-preview-2024-12-17"
        );
        assert_eq!(config.translation_profile(), TranslationProfile::default());
        assert_eq!(config.call_metadata_ttl(), Duration::from_secs(300));
        assert_eq!(config.call_metadata_max_entries, 10_000);
        assert_eq!(config.rate_limit_requests_per_second, 60);
        assert_eq!(config.rate_limit_burst_size, 10);
        assert!(config.max_websocket_connections.is_none());
        assert_eq!(config.max_connections_per_ip, 100);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "sk-env");
            env::set_var("PORT", "8443");
            env::set_var("TRANSLATION_VOICE", "verse");
            env::set_var("TRANSLATION_TEMPERATURE", "1.0");
            env::set_var("VAD_SILENCE_DURATION_MS", "450");
            env::set_var("INPUT_TRANSCRIPTION_MODEL", "");
            env::set_var("MAX_WEBSOCKET_CONNECTIONS", "25");
        }

        let config = ServerConfig::from_env().unwrap();
        let profile = config.translation_profile();

        assert_eq!(config.port, 8443);
        assert_eq!(profile.voice, "verse");
        assert_eq!(profile.temperature, 1.0);
        assert_eq!(profile.vad.silence_duration_ms, 450);
        assert!(profile.transcription_model.is_none());
        assert_eq!(config.max_websocket_connections, Some(25));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_api_key() {
        cleanup_env_vars();

        let result = ServerConfig::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    #[serial]
    fn test_from_env_temperature_out_of_range() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "sk-env");
            env::set_var("TRANSLATION_TEMPERATURE", "0.2");
        }

        let result = ServerConfig::from_env();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("TRANSLATION_TEMPERATURE")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "sk-env");
            env::set_var("PORT", "eighty");
        }

        assert!(ServerConfig::from_env().is_err());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();
        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("OPENAI_API_KEY", "sk-env");
            env::set_var("TRANSLATION_VOICE", "echo");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_path = write_yaml(
            &temp_dir,
            r#"
server:
  host: "127.0.0.1"
  port: 8080
  public_base_url: "https://gw.example.com"

providers:
  openai_api_key: "sk-yaml"

translation:
  voice: "coral"
  transcription_model: ""

registry:
  ttl_seconds: 60
"#,
        );

        let config = ServerConfig::from_file(&config_path).unwrap();

        // YAML overrides ENV
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-yaml"));
        assert_eq!(config.translation_voice, "coral");
        // YAML value
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.public_base_url.as_deref(),
            Some("https://gw.example.com")
        );
        assert!(config.input_transcription_model.is_none());
        assert_eq!(config.call_metadata_ttl_seconds, 60);
        // Untouched defaults survive the merge
        assert_eq!(config.vad_threshold, 0.5);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_supplies_missing_key() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = write_yaml(&temp_dir, "providers:\n  openai_api_key: \"sk-yaml\"\n");

        let config = ServerConfig::from_file(&config_path).unwrap();
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-yaml"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_tls_requires_paths() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "sk-env");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_path = write_yaml(
            &temp_dir,
            "server:\n  tls:\n    enabled: true\n    cert_path: \"/tmp/cert.pem\"\n",
        );

        assert!(ServerConfig::from_file(&config_path).is_err());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_unknown_voice() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "sk-env");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_path = write_yaml(&temp_dir, "translation:\n  voice: \"nova\"\n");

        let result = ServerConfig::from_file(&config_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("TRANSLATION_VOICE"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let config_path = PathBuf::from("/nonexistent/config.yaml");
        let result = ServerConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
