//! Engine configuration.

use serde::Deserialize;

/// Tunables for one engine instance.
///
/// All fields have defaults, so an empty configuration document is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity of the callback event ring; oldest events are evicted
    /// beyond this.
    pub event_buffer_capacity: usize,
    /// Concurrent native-call worker slots.
    pub call_workers: usize,
    /// Optional webhook sink for callback events.
    pub webhook: Option<WebhookConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_buffer_capacity: 100,
            call_workers: 4,
            webhook: None,
        }
    }
}

/// Webhook sink settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    /// Shared secret for HMAC signatures.
    pub secret: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// When set, events are delivered in batches instead of one request
    /// per event.
    #[serde(default)]
    pub batch: Option<BatchConfig>,
}

/// Batching thresholds for the webhook sink.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

fn default_session_id() -> String {
    "gicall".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_batch_size() -> usize {
    50
}

fn default_max_wait_ms() -> u64 {
    100
}
