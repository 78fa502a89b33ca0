//! Catalog entry types.

mod callback;
mod common;
mod enum_entry;
mod function;
mod object;
mod struct_entry;

pub use callback::CallbackEntry;
pub use common::{CatalogType, IntWidth};
pub use enum_entry::{EnumEntry, EnumValue};
pub use function::{ArgEntry, FunctionEntry};
pub use object::ObjectEntry;
pub use struct_entry::{FieldEntry, FieldFlags, StructEntry};
