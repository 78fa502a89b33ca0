//! Signed webhook delivery of callback events.
//!
//! An alternate sink to the event bridge: each callback event (or batch of
//! events) is signed with HMAC-SHA256 and POSTed to a registered webhook.
//! Delivery is best-effort: a timeout or network error drops the event(s),
//! bumps a failure counter, and is never retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::Sha256;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use gicall_core::{CallbackInvocation, CallbackKind};

/// Webhook delivery failure. Logged and counted, never retried.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct DeliveryError(#[from] reqwest::Error);

/// Render a JSON value canonically: object keys sorted, no whitespace.
///
/// This is the exact byte sequence the signature covers, so both sides
/// must agree on it independent of how their JSON libraries order keys.
fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        // Value's Display emits compact JSON with correct escaping.
        Value::String(s) => out.push_str(&Value::String(s.clone()).to_string()),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(&Value::String(key.clone()), out);
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
    }
}

/// Signs and verifies webhook payloads.
///
/// The signed message is `"<timestamp>.<canonical JSON>"`.
#[derive(Clone)]
pub struct CallbackSigner {
    secret: Vec<u8>,
}

impl CallbackSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Hex-encoded HMAC-SHA256 signature of a payload at a timestamp.
    pub fn sign(&self, payload: &Value, timestamp: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(canonical_json(payload).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time verification of a provided signature.
    pub fn verify(&self, payload: &Value, timestamp: &str, signature: &str) -> bool {
        let Ok(provided) = hex::decode(signature) else {
            return false;
        };
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(canonical_json(payload).as_bytes());
        mac.verify_slice(&provided).is_ok()
    }

    /// Signature, timestamp, and event-id headers for a payload.
    pub fn headers(&self, payload: &Value) -> Vec<(&'static str, String)> {
        let timestamp = Utc::now().to_rfc3339();
        let signature = self.sign(payload, &timestamp);
        let event_id = match payload.get("eventId") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        vec![
            ("X-Callback-Signature", signature),
            ("X-Callback-Timestamp", timestamp),
            ("X-Event-Id", event_id),
        ]
    }
}

/// Delivery counters, shared by the notifier and batcher.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    total: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryStats {
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Delivers individual callback events to a registered webhook.
///
/// The HTTP client is long-lived and reuses connections across
/// deliveries.
pub struct CallbackNotifier {
    url: String,
    session_id: String,
    signer: CallbackSigner,
    timeout: Duration,
    client: reqwest::Client,
    counter: AtomicU64,
    stats: DeliveryStats,
}

impl CallbackNotifier {
    pub fn new(
        url: impl Into<String>,
        session_id: impl Into<String>,
        secret: impl AsRef<[u8]>,
        timeout: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            session_id: session_id.into(),
            signer: CallbackSigner::new(secret),
            timeout,
            client: reqwest::Client::new(),
            counter: AtomicU64::new(0),
            stats: DeliveryStats::default(),
        }
    }

    pub fn signer(&self) -> &CallbackSigner {
        &self.signer
    }

    pub fn stats(&self) -> &DeliveryStats {
        &self.stats
    }

    fn next_event_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}_{n}", self.session_id)
    }

    /// Deliver one native callback invocation according to its kind.
    ///
    /// Fire-and-forget invocations produce no result; wait-for-result
    /// invocations return the callback's `result` field, or `None` on
    /// delivery failure.
    pub async fn deliver(&self, invocation: &CallbackInvocation) -> Option<Value> {
        match invocation.kind {
            CallbackKind::FireAndForget => {
                self.notify(&invocation.target, json!(invocation.arguments))
                    .await;
                None
            }
            CallbackKind::WaitForResult => {
                self.invoke(&invocation.target, invocation.arguments.clone())
                    .await
            }
        }
    }

    /// Fire-and-forget delivery; no return value is consumed.
    pub async fn notify(&self, callback_name: &str, data: Value) {
        let payload = json!({
            "eventId": self.next_event_id(),
            "sessionId": self.session_id,
            "callbackName": callback_name,
            "type": "callback",
            "payload": data,
            "timestamp": Utc::now().to_rfc3339(),
        });
        if let Err(err) = self.post(&payload).await {
            warn!(%err, callback_name, "callback delivery failed, event dropped");
        }
    }

    /// Wait-for-result delivery: blocks for the configured timeout and
    /// extracts the `result` field from the response body. Returns `None`
    /// on any delivery failure.
    pub async fn invoke(&self, callback_name: &str, arguments: Vec<Value>) -> Option<Value> {
        let payload = json!({
            "sessionId": self.session_id,
            "callbackName": callback_name,
            "args": arguments,
            "invocationNumber": self.counter.fetch_add(1, Ordering::Relaxed) + 1,
            "timestamp": Utc::now().to_rfc3339(),
        });
        match self.post(&payload).await {
            Ok(body) => body.get("result").cloned(),
            Err(err) => {
                error!(%err, callback_name, "synchronous callback failed");
                None
            }
        }
    }

    async fn post(&self, payload: &Value) -> Result<Value, DeliveryError> {
        self.stats.total.fetch_add(1, Ordering::Relaxed);
        let mut request = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(payload);
        for (name, value) in self.signer.headers(payload) {
            request = request.header(name, value);
        }
        let outcome = async {
            let response = request.send().await?.error_for_status()?;
            response.json::<Value>().await
        }
        .await;
        match outcome {
            Ok(body) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(url = %self.url, "callback delivered");
                Ok(body)
            }
            Err(err) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                Err(err.into())
            }
        }
    }
}

struct BatchBuffer {
    events: Vec<Value>,
    last_flush: Instant,
}

/// Batcher counters.
#[derive(Debug, Default)]
pub struct BatchStats {
    buffered: AtomicU64,
    batches_sent: AtomicU64,
    events_sent: AtomicU64,
    errors: AtomicU64,
}

impl BatchStats {
    pub fn buffered(&self) -> u64 {
        self.buffered.load(Ordering::Relaxed)
    }

    pub fn batches_sent(&self) -> u64 {
        self.batches_sent.load(Ordering::Relaxed)
    }

    pub fn events_sent(&self) -> u64 {
        self.events_sent.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

/// Accumulates high-frequency callback events and delivers them in signed
/// batches.
///
/// A batch flushes when it reaches `max_batch_size`, when `max_wait` has
/// passed since the previous flush, or on [`close`](Self::close). A failed
/// delivery drops that batch's events and increments the error counter.
pub struct CallbackBatcher {
    url: String,
    session_id: String,
    signer: CallbackSigner,
    timeout: Duration,
    max_batch_size: usize,
    max_wait: Duration,
    client: reqwest::Client,
    buffer: Mutex<BatchBuffer>,
    event_counter: AtomicU64,
    batch_counter: AtomicU64,
    stats: BatchStats,
}

impl CallbackBatcher {
    pub fn new(
        url: impl Into<String>,
        session_id: impl Into<String>,
        secret: impl AsRef<[u8]>,
        max_batch_size: usize,
        max_wait: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            session_id: session_id.into(),
            signer: CallbackSigner::new(secret),
            timeout,
            max_batch_size: max_batch_size.max(1),
            max_wait,
            client: reqwest::Client::new(),
            buffer: Mutex::new(BatchBuffer {
                events: Vec::new(),
                last_flush: Instant::now(),
            }),
            event_counter: AtomicU64::new(0),
            batch_counter: AtomicU64::new(0),
            stats: BatchStats::default(),
        }
    }

    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }

    /// Buffer one event, flushing if the batch is full or overdue.
    pub async fn add_event(&self, callback_name: &str, payload: Value) {
        let n = self.event_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let event = json!({
            "eventId": format!("{}_{n}", self.session_id),
            "callbackName": callback_name,
            "payload": payload,
            "timestamp": Utc::now().to_rfc3339(),
        });

        let due = {
            let mut buffer = self.buffer.lock().await;
            buffer.events.push(event);
            self.stats.buffered.fetch_add(1, Ordering::Relaxed);
            buffer.events.len() >= self.max_batch_size
                || buffer.last_flush.elapsed() >= self.max_wait
        };
        if due {
            self.flush().await;
        }
    }

    /// Deliver all buffered events now. No-op when the buffer is empty.
    pub async fn flush(&self) {
        let events = {
            let mut buffer = self.buffer.lock().await;
            buffer.last_flush = Instant::now();
            std::mem::take(&mut buffer.events)
        };
        if events.is_empty() {
            return;
        }
        self.send_batch(events).await;
    }

    /// Flush any pending batch before shutdown.
    pub async fn close(&self) {
        self.flush().await;
    }

    async fn send_batch(&self, events: Vec<Value>) {
        let n = self.batch_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let batch_id = format!("batch_{}_{n}", self.session_id);
        let count = events.len();
        let payload = json!({
            "batchId": batch_id,
            "sessionId": self.session_id,
            "type": "batch",
            "events": events,
            "count": count,
            "timestamp": Utc::now().to_rfc3339(),
        });

        let mut request = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload);
        for (name, value) in self.signer.headers(&payload) {
            request = request.header(name, value);
        }

        match request.send().await.and_then(|r| r.error_for_status()) {
            Ok(_) => {
                self.stats.batches_sent.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .events_sent
                    .fetch_add(count as u64, Ordering::Relaxed);
                debug!(%batch_id, count, "batch delivered");
            }
            Err(err) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                error!(%err, %batch_id, count, "batch delivery failed, events lost");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signer() -> CallbackSigner {
        CallbackSigner::new("my-secret-key")
    }

    #[test]
    fn canonical_json_sorts_keys_and_strips_whitespace() {
        let value = json!({"z": 1, "a": {"c": [1, 2], "b": "x"}});
        assert_eq!(canonical_json(&value), r#"{"a":{"b":"x","c":[1,2]},"z":1}"#);
    }

    #[test]
    fn sign_verify_roundtrip() {
        let s = signer();
        let payload = json!({"eventId": "evt-001", "data": "test"});
        let ts = "2026-08-07T12:00:00+00:00";
        let signature = s.sign(&payload, ts);
        assert!(s.verify(&payload, ts, &signature));
    }

    #[test]
    fn tampered_payload_or_timestamp_fails_verification() {
        let s = signer();
        let payload = json!({"eventId": "evt-001", "data": "test"});
        let ts = "2026-08-07T12:00:00+00:00";
        let signature = s.sign(&payload, ts);

        let tampered = json!({"eventId": "evt-001", "data": "tesT"});
        assert!(!s.verify(&tampered, ts, &signature));
        assert!(!s.verify(&payload, "2026-08-07T12:00:01+00:00", &signature));
        assert!(!s.verify(&payload, ts, "not-even-hex"));
    }

    #[test]
    fn signature_ignores_key_order() {
        let s = signer();
        let ts = "2026-08-07T12:00:00+00:00";
        let a: Value = serde_json::from_str(r#"{"a":1,"b":2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b":2,"a":1}"#).unwrap();
        assert_eq!(s.sign(&a, ts), s.sign(&b, ts));
    }

    #[test]
    fn headers_carry_signature_timestamp_and_event_id() {
        let s = signer();
        let payload = json!({"eventId": "sess_7", "payload": {}});
        let headers = s.headers(&payload);
        let names: Vec<&str> = headers.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["X-Callback-Signature", "X-Callback-Timestamp", "X-Event-Id"]
        );
        let event_id = &headers[2].1;
        assert_eq!(event_id, "sess_7");
        // The signature in the headers verifies against the timestamp in
        // the headers.
        assert!(s.verify(&payload, &headers[1].1, &headers[0].1));
    }

    #[tokio::test]
    async fn notifier_counts_failed_deliveries() {
        // Nothing listens on this port; delivery fails fast and the event
        // is dropped.
        let notifier = CallbackNotifier::new(
            "http://127.0.0.1:1/callbacks",
            "sess",
            "secret",
            Duration::from_millis(250),
        );
        notifier.notify("on_event", json!({"n": 1})).await;
        assert_eq!(notifier.stats().total(), 1);
        assert_eq!(notifier.stats().failed(), 1);
        assert_eq!(notifier.stats().delivered(), 0);
    }

    #[tokio::test]
    async fn failed_invoke_returns_none() {
        let notifier = CallbackNotifier::new(
            "http://127.0.0.1:1/callbacks",
            "sess",
            "secret",
            Duration::from_millis(250),
        );
        assert_eq!(notifier.invoke("foreach", vec![json!(1)]).await, None);
    }

    #[tokio::test]
    async fn deliver_dispatches_on_invocation_kind() {
        let notifier = CallbackNotifier::new(
            "http://127.0.0.1:1/callbacks",
            "sess",
            "secret",
            Duration::from_millis(250),
        );
        let fire = CallbackInvocation::fire_and_forget("on_event", vec![json!(1)]);
        assert_eq!(notifier.deliver(&fire).await, None);

        let wait = CallbackInvocation::wait_for_result("foreach", vec![json!(1)]);
        assert_eq!(notifier.deliver(&wait).await, None);
        // Both deliveries failed against the dead endpoint and were
        // counted, not retried.
        assert_eq!(notifier.stats().failed(), 2);
    }

    #[tokio::test]
    async fn batcher_drops_failed_batch_and_counts_error() {
        let batcher = CallbackBatcher::new(
            "http://127.0.0.1:1/callbacks",
            "sess",
            "secret",
            2,
            Duration::from_secs(3600),
            Duration::from_millis(250),
        );
        batcher.add_event("on_event", json!({"n": 1})).await;
        assert_eq!(batcher.stats().buffered(), 1);
        assert_eq!(batcher.stats().batches_sent(), 0);

        // Second event reaches max_batch_size and triggers a flush, which
        // fails and drops both events.
        batcher.add_event("on_event", json!({"n": 2})).await;
        assert_eq!(batcher.stats().errors(), 1);
        assert_eq!(batcher.stats().events_sent(), 0);

        // The buffer is empty afterwards; close flushes nothing.
        batcher.close().await;
        assert_eq!(batcher.stats().errors(), 1);
    }
}
