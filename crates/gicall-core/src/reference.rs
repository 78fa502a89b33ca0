//! Opaque object references.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque native address exchanged across the wire boundary as
/// `{"ptr": "<hex-or-decimal string>"}`.
///
/// The engine never tracks ownership or lifetime of the referenced memory.
/// Allocation and release happen either through native calls the caller
/// invokes explicitly or through the synthesized generic `new`/`free`
/// operations, and matching them up is entirely the caller's job. A leaked
/// or double-freed reference is a caller error the engine does not detect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectReference {
    pub ptr: String,
}

impl ObjectReference {
    pub fn new(ptr: impl Into<String>) -> Self {
        Self { ptr: ptr.into() }
    }

    /// Wrap a raw transport value as a reference.
    ///
    /// String pointers are kept as-is; numeric addresses are rendered in
    /// their decimal form.
    pub fn from_raw(raw: &Value) -> Self {
        match raw {
            Value::String(s) => Self::new(s.clone()),
            other => Self::new(other.to_string()),
        }
    }

    /// Extract the raw pointer from a wire value, if it is a wrapped
    /// reference.
    pub fn unwrap_value(value: &Value) -> Option<&Value> {
        value.as_object().and_then(|obj| obj.get("ptr"))
    }

    pub fn into_value(self) -> Value {
        serde_json::json!({ "ptr": self.ptr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_form() {
        let reference = ObjectReference::new("0xdeadbeef");
        assert_eq!(
            serde_json::to_value(&reference).unwrap(),
            json!({"ptr": "0xdeadbeef"})
        );
    }

    #[test]
    fn unwrap_wrapped_reference() {
        let value = json!({"ptr": "0x1234"});
        assert_eq!(
            ObjectReference::unwrap_value(&value),
            Some(&json!("0x1234"))
        );
    }

    #[test]
    fn unwrap_passes_on_scalars() {
        assert_eq!(ObjectReference::unwrap_value(&json!("0x1234")), None);
        assert_eq!(ObjectReference::unwrap_value(&json!(42)), None);
    }

    #[test]
    fn from_raw_keeps_strings_and_renders_numbers() {
        assert_eq!(ObjectReference::from_raw(&json!("0xabc")).ptr, "0xabc");
        assert_eq!(ObjectReference::from_raw(&json!(4096)).ptr, "4096");
    }
}
