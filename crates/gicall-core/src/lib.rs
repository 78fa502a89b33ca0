//! Core data model for the gicall marshaling engine.
//!
//! This crate holds the types shared by every stage of the call pipeline:
//! operation identities, wire-level call descriptors, opaque object
//! references, callback invocations, and the error hierarchy. It has no
//! opinion about how calls are resolved or executed; that lives in the
//! `gicall` crate itself.

mod callback;
mod descriptor;
mod direction;
mod error;
mod identity;
mod reference;
mod tag;

pub use callback::{CallbackInvocation, CallbackKind};
pub use descriptor::{ArgumentDescriptor, CallableDescriptor, TypeDescriptor};
pub use direction::Direction;
pub use error::{
    CallError, IdentityError, MarshalError, ResolveError, TransportError,
};
pub use identity::{FieldOperator, OperationIdentity};
pub use reference::ObjectReference;
pub use tag::TypeTag;
