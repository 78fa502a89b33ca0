//! Structural type catalog for gicall.
//!
//! The catalog is the registry describing one namespace of a native API:
//! its functions, methods, structs, objects, enums/flags, and callback
//! signatures. It is populated once at startup and read-only afterwards;
//! the resolver and descriptor compiler receive it explicitly rather than
//! reaching for ambient introspection state.

mod catalog;
mod entries;
mod mapping;

pub use catalog::{InterfaceKind, RegisteredType, TypeCatalog};
pub use entries::{
    ArgEntry, CallbackEntry, CatalogType, EnumEntry, EnumValue, FieldEntry, FieldFlags,
    FunctionEntry, IntWidth, ObjectEntry, StructEntry,
};
pub use mapping::EnumMapping;
