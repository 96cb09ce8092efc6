//! Shared application state.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::core::realtime::{OpenAIConnector, TranslationConnector, TranslationProfile};
use crate::core::registry::CallRegistry;
use crate::core::relay::RelayContext;

/// Why a WebSocket connection was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConnectionLimitError {
    #[error("global WebSocket connection limit reached")]
    GlobalLimitReached,
    #[error("per-IP WebSocket connection limit reached")]
    PerIpLimitReached,
}

pub struct AppState {
    pub config: ServerConfig,
    /// Call identifier → language pair, written by the voice webhook
    pub call_registry: CallRegistry,
    pub connector: Arc<dyn TranslationConnector>,
    pub translation_profile: Arc<TranslationProfile>,

    ws_connections: AtomicUsize,
    ip_connections: DashMap<IpAddr, u32>,
    active_sessions: Arc<AtomicUsize>,
}

impl AppState {
    /// Build state with the OpenAI Realtime connector described by `config`.
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let connector = OpenAIConnector::new(config.openai_api_key.clone().unwrap_or_default())
            .with_url(config.openai_realtime_url.clone())
            .with_model(config.openai_realtime_model.clone());
        Self::with_connector(config, Arc::new(connector))
    }

    /// Build state around an explicit connector.
    pub fn with_connector(
        config: ServerConfig,
        connector: Arc<dyn TranslationConnector>,
    ) -> Arc<Self> {
        let call_registry =
            CallRegistry::new(config.call_metadata_ttl(), config.call_metadata_max_entries);
        let translation_profile = Arc::new(config.translation_profile());

        tracing::info!(
            provider = connector.provider(),
            voice = %translation_profile.voice,
            registry_ttl_secs = config.call_metadata_ttl_seconds,
            "Application state initialized"
        );

        Arc::new(Self {
            config,
            call_registry,
            connector,
            translation_profile,
            ws_connections: AtomicUsize::new(0),
            ip_connections: DashMap::new(),
            active_sessions: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Dependencies handed to each relay task.
    pub fn relay_context(&self) -> RelayContext {
        RelayContext {
            registry: self.call_registry.clone(),
            connector: self.connector.clone(),
            profile: self.translation_profile.clone(),
        }
    }

    /// Reserve a WebSocket slot for `ip`.
    ///
    /// Must be paired with [`AppState::release_connection`].
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        let max_per_ip = self.config.max_connections_per_ip;
        {
            let mut per_ip = self.ip_connections.entry(ip).or_insert(0);
            if *per_ip >= max_per_ip {
                return Err(ConnectionLimitError::PerIpLimitReached);
            }
            *per_ip += 1;
        }

        if let Some(max_global) = self.config.max_websocket_connections {
            let acquired = self
                .ws_connections
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                    (current < max_global).then_some(current + 1)
                })
                .is_ok();
            if !acquired {
                self.decrement_ip(ip);
                return Err(ConnectionLimitError::GlobalLimitReached);
            }
        } else {
            self.ws_connections.fetch_add(1, Ordering::SeqCst);
        }

        Ok(())
    }

    pub fn release_connection(&self, ip: IpAddr) {
        let _ = self
            .ws_connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_sub(1)
            });
        self.decrement_ip(ip);
    }

    fn decrement_ip(&self, ip: IpAddr) {
        self.ip_connections
            .remove_if_mut(&ip, |_, count| {
                *count = count.saturating_sub(1);
                *count == 0
            });
    }

    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }

    pub fn ip_connection_count(&self, ip: &IpAddr) -> u32 {
        self.ip_connections.get(ip).map(|c| *c).unwrap_or(0)
    }

    /// Mark a relay session as running until the guard is dropped.
    pub fn track_session(&self) -> ActiveSessionGuard {
        self.active_sessions.fetch_add(1, Ordering::SeqCst);
        ActiveSessionGuard {
            counter: self.active_sessions.clone(),
        }
    }

    pub fn active_session_count(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }
}

/// Decrements the active session counter on drop.
pub struct ActiveSessionGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for ActiveSessionGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
