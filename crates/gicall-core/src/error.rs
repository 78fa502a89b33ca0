//! Unified error types for the call pipeline.
//!
//! Each pipeline stage has its own error enum, and everything converts into
//! [`CallError`] for unified handling at the dispatch boundary:
//!
//! ```text
//! CallError (top-level wrapper)
//! ├── IdentityError   - malformed operation name
//! ├── ResolveError    - no handler for the operation
//! ├── MarshalError    - bad or missing arguments, rejected before dispatch
//! └── TransportError  - instrumentation transport failures, never retried
//! ```
//!
//! Resolution failures surface as "not found" to callers; marshaling
//! failures as validation errors naming the offending argument; transport
//! failures as server errors.

use thiserror::Error;

/// Errors parsing a dash-delimited operation name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The string does not have 2-4 dash-separated segments.
    #[error("malformed operation '{operation}': expected 2-4 segments, found {segments}")]
    MalformedOperation { operation: String, segments: usize },

    /// The fourth segment is not `get` or `put`.
    #[error("unknown operator '{operator}' in operation '{operation}'")]
    UnknownOperator { operation: String, operator: String },
}

/// Errors deciding how to satisfy an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No function, field, or generic handler matches the identity.
    #[error("no handler for operation '{operation}'")]
    UnknownOperation { operation: String },

    /// The named class is not registered in the catalog.
    #[error("unknown type '{class_name}' in namespace '{namespace}'")]
    UnknownType {
        namespace: String,
        class_name: String,
    },

    /// The named field does not exist on the struct.
    #[error("struct '{class_name}' has no field '{field}'")]
    UnknownField { class_name: String, field: String },

    /// `put` was requested on a field that is not writable.
    #[error("field '{field}' of '{class_name}' is not writable")]
    FieldNotWritable { class_name: String, field: String },

    /// Generic `new` on a kind with no known allocation size.
    #[error("generic constructor is unsupported for non-struct type '{class_name}'")]
    UnsupportedGenericNew { class_name: String },

    /// Generic `get_type` on an entry with no registered runtime type.
    #[error("type '{class_name}' has no registered runtime type identity")]
    NoRuntimeType { class_name: String },
}

/// Validation errors raised before any transport call is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// A required argument was not supplied.
    #[error("missing required argument '{name}'")]
    MissingArgument { name: String },

    /// A reference argument was supplied without a usable `ptr` value.
    #[error("argument '{name}' is not a valid object reference")]
    MalformedReference { name: String },

    /// A symbolic enum name is not a member of its mapping.
    #[error("argument '{name}': '{value}' is not a value of enum '{enum_name}'")]
    UnknownEnumValue {
        name: String,
        value: String,
        enum_name: String,
    },
}

/// Failures of the instrumentation transport itself.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The instrumented process went away or the channel broke.
    #[error("instrumentation transport disconnected: {0}")]
    Disconnected(String),

    /// The transport replied with something the engine cannot interpret.
    #[error("malformed transport reply: {0}")]
    MalformedReply(String),

    /// The call failed inside the instrumented process.
    #[error("remote call failed: {0}")]
    CallFailed(String),

    /// The blocking worker servicing the call died.
    #[error("call worker failed: {0}")]
    WorkerFailed(String),
}

/// Top-level error for a dispatched operation.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Marshal(#[from] MarshalError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CallError {
    /// Whether this error is a resolution failure ("not found" to callers).
    pub fn is_not_found(&self) -> bool {
        matches!(self, CallError::Resolve(_))
    }

    /// Whether this error was raised before any transport call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, CallError::Identity(_) | CallError::Marshal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_convert_into_call_error() {
        let err: CallError = MarshalError::MissingArgument {
            name: "self".into(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_not_found());

        let err: CallError = ResolveError::UnknownOperation {
            operation: "Gst-Nope-nothing".into(),
        }
        .into();
        assert!(err.is_not_found());
    }

    #[test]
    fn marshal_error_names_the_argument() {
        let err = MarshalError::UnknownEnumValue {
            name: "format".into(),
            value: "SIDEWAYS".into(),
            enum_name: "GstFormat".into(),
        };
        let text = err.to_string();
        assert!(text.contains("format"));
        assert!(text.contains("SIDEWAYS"));
    }
}
