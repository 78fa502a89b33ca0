//! gicall: call resolution and marshaling for instrumented native processes.
//!
//! Given a structural type catalog describing a native API and a transport
//! into a live, externally instrumented process, gicall turns symbolic
//! operation names plus typed arguments into wire-level call descriptors,
//! executes them, and converts results back. Asynchronous native callback
//! events are multiplexed to any number of subscribers through a bounded
//! event bridge, or delivered to a signed webhook sink.
//!
//! The pipeline, front to back:
//!
//! 1. [`codec`] decodes composite values embedded in URL path/query segments.
//! 2. [`OperationIdentity`] parses the dash-delimited operation name.
//! 3. [`OperationResolver`] decides how the operation is satisfied and
//!    compiles its wire descriptor via [`TypeDescriptorCompiler`].
//! 4. [`CallDispatcher`] converts argument values, executes the call on a
//!    bounded blocking worker, and converts the result.
//! 5. [`EventBridge`] carries native callback notifications from the
//!    transport's message thread to streaming subscribers.
//!
//! Object references are plain opaque values; the engine never tracks
//! native memory lifetime. See [`ObjectReference`].

pub mod codec;
pub mod compiler;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod events;
pub mod notifier;
pub mod resolver;
pub mod transport;

pub use compiler::TypeDescriptorCompiler;
pub use config::{BatchConfig, EngineConfig, WebhookConfig};
pub use dispatcher::CallDispatcher;
pub use engine::Engine;
pub use events::{Event, EventBridge, EventSubscriber};
pub use notifier::{CallbackBatcher, CallbackNotifier, CallbackSigner};
pub use resolver::{OperationResolver, ResolvedOperation};
pub use transport::{InstrumentationTransport, MessageRouter, TransportMessage};

pub use gicall_core::{
    ArgumentDescriptor, CallError, CallableDescriptor, CallbackInvocation, CallbackKind,
    Direction, FieldOperator, IdentityError, MarshalError, ObjectReference, OperationIdentity,
    ResolveError, TransportError, TypeDescriptor, TypeTag,
};
pub use gicall_registry::{
    ArgEntry, CallbackEntry, CatalogType, EnumEntry, EnumMapping, EnumValue, FieldEntry,
    FieldFlags, FunctionEntry, IntWidth, ObjectEntry, StructEntry, TypeCatalog,
};
