//! Native callback invocations surfaced by the instrumented process.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a native callback expects to be serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallbackKind {
    /// The native side does not consume a return value.
    FireAndForget,
    /// The native side blocks until a result is produced.
    WaitForResult,
}

/// One crossing of control from native code into caller-supplied logic,
/// produced when a dispatched call invokes a callback argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackInvocation {
    pub kind: CallbackKind,
    /// Name of the callback target being invoked.
    pub target: String,
    pub arguments: Vec<Value>,
}

impl CallbackInvocation {
    pub fn fire_and_forget(target: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            kind: CallbackKind::FireAndForget,
            target: target.into(),
            arguments,
        }
    }

    pub fn wait_for_result(target: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            kind: CallbackKind::WaitForResult,
            target: target.into(),
            arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_serializes_camel_case() {
        assert_eq!(
            serde_json::to_value(CallbackKind::FireAndForget).unwrap(),
            json!("fireAndForget")
        );
        assert_eq!(
            serde_json::to_value(CallbackKind::WaitForResult).unwrap(),
            json!("waitForResult")
        );
    }

    #[test]
    fn invocation_carries_arguments() {
        let inv = CallbackInvocation::wait_for_result("pad_probe", vec![json!(1), json!("x")]);
        assert_eq!(inv.kind, CallbackKind::WaitForResult);
        assert_eq!(inv.arguments.len(), 2);
    }
}
