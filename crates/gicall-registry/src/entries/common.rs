//! Catalog-level type references.

use gicall_core::TypeTag;

/// Type of a value as the catalog declares it, before descriptor
/// compilation.
///
/// This mirrors the shape of introspection data: primitives carry their
/// own kind, `Void` knows whether it is a raw pointer, and anything
/// user-defined is a named [`Interface`](CatalogType::Interface) reference
/// resolved against the catalog at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogType {
    Boolean,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    /// UTF-8 text.
    Utf8,
    Float,
    Double,
    /// A runtime type identity value.
    GType,
    Void {
        is_pointer: bool,
    },
    /// Reference to a named entry in the same namespace.
    Interface(String),
}

impl CatalogType {
    /// An untyped pointer (`void*`).
    pub fn pointer() -> Self {
        CatalogType::Void { is_pointer: true }
    }

    /// Plain `void`, for functions without a return value.
    pub fn void() -> Self {
        CatalogType::Void { is_pointer: false }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        CatalogType::Interface(name.into())
    }

    /// The interface name, if this is an interface reference.
    pub fn interface_name(&self) -> Option<&str> {
        match self {
            CatalogType::Interface(name) => Some(name),
            _ => None,
        }
    }
}

/// Storage width of an integer-backed enum or flags type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntWidth {
    I8,
    U8,
    I16,
    U16,
    #[default]
    I32,
    U32,
    I64,
    U64,
}

impl IntWidth {
    /// The wire tag values of this width marshal as.
    pub const fn tag(self) -> TypeTag {
        match self {
            IntWidth::I8 => TypeTag::Int8,
            IntWidth::U8 => TypeTag::Uint8,
            IntWidth::I16 => TypeTag::Int16,
            IntWidth::U16 => TypeTag::Uint16,
            IntWidth::I32 => TypeTag::Int32,
            IntWidth::U32 => TypeTag::Uint32,
            IntWidth::I64 => TypeTag::Int64,
            IntWidth::U64 => TypeTag::Uint64,
        }
    }
}
