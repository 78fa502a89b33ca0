//! Engine assembly: one instrumented session end to end.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;

use gicall_core::{CallError, OperationIdentity};
use gicall_registry::TypeCatalog;

use crate::config::EngineConfig;
use crate::dispatcher::{CallArguments, CallDispatcher};
use crate::events::{EventBridge, EventSubscriber};
use crate::notifier::CallbackNotifier;
use crate::transport::{InstrumentationTransport, MessageRouter};

/// Everything needed to serve one instrumented process: catalog,
/// dispatcher, event bridge, and (optionally) the webhook sink.
///
/// The transport's message thread feeds the engine through
/// [`router`](Self::router); request handlers go through
/// [`call`](Self::call); streaming subscribers through
/// [`subscribe`](Self::subscribe).
pub struct Engine {
    catalog: Arc<TypeCatalog>,
    dispatcher: CallDispatcher,
    bridge: EventBridge,
    router: MessageRouter,
    notifier: Option<Arc<CallbackNotifier>>,
}

impl Engine {
    pub fn new(
        catalog: Arc<TypeCatalog>,
        transport: Arc<dyn InstrumentationTransport>,
        config: EngineConfig,
    ) -> Self {
        let bridge = EventBridge::new(config.event_buffer_capacity);
        let router = MessageRouter::new(bridge.clone());
        let dispatcher = CallDispatcher::new(Arc::clone(&catalog), transport, config.call_workers);
        let notifier = config.webhook.as_ref().map(|webhook| {
            Arc::new(CallbackNotifier::new(
                &webhook.url,
                &webhook.session_id,
                &webhook.secret,
                Duration::from_secs(webhook.timeout_secs),
            ))
        });
        Self {
            catalog,
            dispatcher,
            bridge,
            router,
            notifier,
        }
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    pub fn dispatcher(&self) -> &CallDispatcher {
        &self.dispatcher
    }

    pub fn bridge(&self) -> &EventBridge {
        &self.bridge
    }

    /// Router handle for the transport's message thread.
    pub fn router(&self) -> MessageRouter {
        self.router.clone()
    }

    pub fn notifier(&self) -> Option<&Arc<CallbackNotifier>> {
        self.notifier.as_ref()
    }

    /// Parse and dispatch one operation.
    pub async fn call(
        &self,
        operation: &str,
        arguments: &CallArguments,
    ) -> Result<Option<Value>, CallError> {
        let identity = OperationIdentity::parse(operation)?;
        self.dispatcher.dispatch(&identity, arguments).await
    }

    /// Start an independent event subscription.
    pub fn subscribe(&self) -> EventSubscriber {
        self.bridge.subscribe()
    }

    /// Forward every bridged callback event to the configured webhook.
    ///
    /// Returns `None` when no webhook is configured. The forwarder runs
    /// until the returned handle is aborted.
    pub fn spawn_webhook_forwarder(&self) -> Option<JoinHandle<()>> {
        let notifier = Arc::clone(self.notifier.as_ref()?);
        let mut subscriber = self.bridge.subscribe();
        Some(tokio::spawn(async move {
            loop {
                let event = subscriber.recv().await;
                notifier.notify("callback", event.payload).await;
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gicall_core::{CallableDescriptor, TransportError, TypeDescriptor};
    use serde_json::json;

    struct NullTransport;

    impl InstrumentationTransport for NullTransport {
        fn call(
            &self,
            _symbol: &str,
            _descriptor: &CallableDescriptor,
            _arguments: Vec<Value>,
        ) -> Result<Option<Value>, TransportError> {
            Ok(None)
        }

        fn alloc(&self, _size: usize) -> Result<String, TransportError> {
            Ok("0x1".to_string())
        }

        fn release(&self, _ptr: &str) -> Result<(), TransportError> {
            Ok(())
        }

        fn read_field(
            &self,
            _ptr: &str,
            _offset: usize,
            _field: &TypeDescriptor,
        ) -> Result<Value, TransportError> {
            Ok(Value::Null)
        }

        fn write_field(
            &self,
            _ptr: &str,
            _offset: usize,
            _field: &TypeDescriptor,
            _value: Value,
        ) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn engine() -> Engine {
        Engine::new(
            Arc::new(TypeCatalog::new("Gst")),
            Arc::new(NullTransport),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn malformed_operation_is_a_validation_error() {
        let err = engine()
            .call("notanoperation", &CallArguments::new())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn unknown_operation_is_not_found() {
        let err = engine()
            .call("Gst--nothing", &CallArguments::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn routed_callbacks_reach_subscribers() {
        let engine = engine();
        let router = engine.router();
        let mut subscriber = engine.subscribe();
        router.route_raw(json!({"kind": "callback", "data": {"hello": 1}}));
        let event = subscriber.recv().await;
        assert_eq!(event.payload, json!({"hello": 1}));
    }

    #[test]
    fn no_webhook_means_no_forwarder() {
        assert!(engine().notifier().is_none());
    }
}
