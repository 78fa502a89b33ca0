//! Wire-level type tags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type tag carried by every wire descriptor.
///
/// These are the transport-primitive kinds the instrumentation layer knows
/// how to read and write. Aggregate kinds (`Struct`, `Gtype`) additionally
/// carry a byte size on the descriptor that uses them; `Callback` carries a
/// nested callable signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    String,
    Float,
    Double,
    Void,
    Pointer,
    Struct,
    Gtype,
    Callback,
}

impl TypeTag {
    /// Get the wire name of this tag.
    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::Bool => "bool",
            TypeTag::Int8 => "int8",
            TypeTag::Uint8 => "uint8",
            TypeTag::Int16 => "int16",
            TypeTag::Uint16 => "uint16",
            TypeTag::Int32 => "int32",
            TypeTag::Uint32 => "uint32",
            TypeTag::Int64 => "int64",
            TypeTag::Uint64 => "uint64",
            TypeTag::String => "string",
            TypeTag::Float => "float",
            TypeTag::Double => "double",
            TypeTag::Void => "void",
            TypeTag::Pointer => "pointer",
            TypeTag::Struct => "struct",
            TypeTag::Gtype => "gtype",
            TypeTag::Callback => "callback",
        }
    }

    /// Whether descriptors with this tag carry a `struct_size`.
    pub const fn is_sized(self) -> bool {
        matches!(self, TypeTag::Struct | TypeTag::Gtype)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_wire_names() {
        assert_eq!(serde_json::to_string(&TypeTag::Int32).unwrap(), "\"int32\"");
        assert_eq!(serde_json::to_string(&TypeTag::Gtype).unwrap(), "\"gtype\"");
        assert_eq!(
            serde_json::from_str::<TypeTag>("\"callback\"").unwrap(),
            TypeTag::Callback
        );
    }

    #[test]
    fn tag_display_matches_wire_name() {
        assert_eq!(TypeTag::Uint64.to_string(), "uint64");
        assert_eq!(TypeTag::Pointer.to_string(), "pointer");
    }

    #[test]
    fn only_aggregates_are_sized() {
        assert!(TypeTag::Struct.is_sized());
        assert!(TypeTag::Gtype.is_sized());
        assert!(!TypeTag::Pointer.is_sized());
        assert!(!TypeTag::Callback.is_sized());
    }
}
