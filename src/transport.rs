//! The instrumentation transport boundary.
//!
//! Everything that actually touches the instrumented process goes through
//! [`InstrumentationTransport`]. Implementations wrap whatever injection
//! mechanism is in use (typically a script loaded into the target process)
//! and expose the five primitives the dispatcher needs. All methods block;
//! the dispatcher is responsible for keeping them off the cooperative
//! scheduler.
//!
//! The transport also produces out-of-band messages on its own
//! message-processing thread: native callback notifications and console
//! output from the injected script. [`MessageRouter`] is the single point
//! where those cross into the engine: callbacks land in the
//! [`EventBridge`], console output is re-emitted through `tracing`, and
//! anything else is logged and dropped.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use gicall_core::{CallableDescriptor, TransportError, TypeDescriptor};

use crate::events::EventBridge;

/// Executes calls inside the externally instrumented process.
///
/// A call may block for an unbounded time. Transport-level failures are
/// never retried; they propagate as [`TransportError`].
pub trait InstrumentationTransport: Send + Sync {
    /// Execute one native call: resolved symbol, compiled descriptor, and
    /// the converted argument values in order. Returns the structured
    /// result map, or `None` for void calls.
    fn call(
        &self,
        symbol: &str,
        descriptor: &CallableDescriptor,
        arguments: Vec<Value>,
    ) -> Result<Option<Value>, TransportError>;

    /// Allocate `size` bytes in the target process, returning the new
    /// pointer.
    fn alloc(&self, size: usize) -> Result<String, TransportError>;

    /// Release memory previously returned by [`alloc`](Self::alloc).
    fn release(&self, ptr: &str) -> Result<(), TransportError>;

    /// Read a field of width/kind `field` at `offset` from `ptr`.
    fn read_field(
        &self,
        ptr: &str,
        offset: usize,
        field: &TypeDescriptor,
    ) -> Result<Value, TransportError>;

    /// Write `value` into the field at `offset` of `ptr`.
    fn write_field(
        &self,
        ptr: &str,
        offset: usize,
        field: &TypeDescriptor,
        value: Value,
    ) -> Result<(), TransportError>;
}

/// Console level reported by the injected script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// One out-of-band message from the transport's message thread.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportMessage {
    /// A native callback fired inside the target process.
    Callback { data: Value },
    /// Console output from the injected script.
    Log {
        level: ScriptLogLevel,
        message: String,
    },
    /// Anything the engine does not understand; logged and dropped.
    Other(Value),
}

impl TransportMessage {
    /// Classify a raw message payload.
    pub fn from_value(value: Value) -> Self {
        #[derive(Deserialize)]
        #[serde(tag = "kind", rename_all = "lowercase")]
        enum Known {
            Callback {
                data: Value,
            },
            Log {
                level: ScriptLogLevel,
                message: String,
            },
        }

        match serde_json::from_value::<Known>(value.clone()) {
            Ok(Known::Callback { data }) => TransportMessage::Callback { data },
            Ok(Known::Log { level, message }) => TransportMessage::Log { level, message },
            Err(_) => TransportMessage::Other(value),
        }
    }
}

/// Routes transport messages into the engine.
///
/// Safe to call from the transport's own thread; the only shared state it
/// touches is the event bridge, which is built for exactly that crossing.
#[derive(Clone)]
pub struct MessageRouter {
    bridge: EventBridge,
}

impl MessageRouter {
    pub fn new(bridge: EventBridge) -> Self {
        Self { bridge }
    }

    pub fn route(&self, message: TransportMessage) {
        match message {
            TransportMessage::Callback { data } => {
                self.bridge.push(data);
            }
            TransportMessage::Log { level, message } => match level {
                ScriptLogLevel::Debug => debug!(target: "gicall::script", "{message}"),
                ScriptLogLevel::Info => tracing::info!(target: "gicall::script", "{message}"),
                ScriptLogLevel::Warning => tracing::warn!(target: "gicall::script", "{message}"),
                ScriptLogLevel::Error => tracing::error!(target: "gicall::script", "{message}"),
            },
            TransportMessage::Other(value) => {
                debug!(?value, "unhandled transport message");
            }
        }
    }

    /// Classify and route a raw message payload.
    pub fn route_raw(&self, value: Value) {
        self.route(TransportMessage::from_value(value));
    }
}
