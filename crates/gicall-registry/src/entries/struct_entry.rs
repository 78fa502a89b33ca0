//! Struct entries and their fields.

use bitflags::bitflags;

use super::{CatalogType, FunctionEntry};

bitflags! {
    /// Access flags of a struct field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldFlags: u8 {
        const READABLE = 1 << 0;
        const WRITABLE = 1 << 1;
    }
}

/// One field of a struct, with its byte offset into the struct memory.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub name: String,
    pub offset: usize,
    pub flags: FieldFlags,
    pub ty: CatalogType,
}

impl FieldEntry {
    /// Create a readable and writable field.
    pub fn new(name: impl Into<String>, offset: usize, ty: CatalogType) -> Self {
        Self {
            name: name.into(),
            offset,
            flags: FieldFlags::READABLE | FieldFlags::WRITABLE,
            ty,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.flags.remove(FieldFlags::WRITABLE);
        self
    }

    pub fn is_writable(&self) -> bool {
        self.flags.contains(FieldFlags::WRITABLE)
    }
}

/// Registry entry for a struct.
///
/// `type_init` names the runtime type-identity accessor when the struct is
/// a registered (boxed) type; plain structs have none. The distinction
/// decides whether values of this struct marshal as `struct` or `gtype`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructEntry {
    pub name: String,
    /// Size in bytes, used by the generic constructor.
    pub size: usize,
    pub type_init: Option<String>,
    pub fields: Vec<FieldEntry>,
    pub methods: Vec<FunctionEntry>,
}

impl StructEntry {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            type_init: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_type_init(mut self, symbol: impl Into<String>) -> Self {
        self.type_init = Some(symbol.into());
        self
    }

    pub fn with_field(mut self, field: FieldEntry) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: FunctionEntry) -> Self {
        self.methods.push(method);
        self
    }

    /// Whether this struct carries a registered runtime type identity.
    pub fn has_runtime_type(&self) -> bool {
        self.type_init.is_some()
    }

    pub fn field(&self, name: &str) -> Option<&FieldEntry> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&FunctionEntry> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_entry_lookup() {
        let entry = StructEntry::new("Meta", 16)
            .with_field(FieldEntry::new("flags", 8, CatalogType::Uint32))
            .with_method(FunctionEntry::method("compare", "gst_meta_compare"));

        assert_eq!(entry.field("flags").unwrap().offset, 8);
        assert!(entry.field("missing").is_none());
        assert!(entry.method("compare").is_some());
        assert!(!entry.has_runtime_type());
    }

    #[test]
    fn type_init_marks_runtime_type() {
        let entry = StructEntry::new("Caps", 64).with_type_init("gst_caps_get_type");
        assert!(entry.has_runtime_type());
        assert_eq!(entry.type_init.as_deref(), Some("gst_caps_get_type"));
    }

    #[test]
    fn read_only_field_is_not_writable() {
        let field = FieldEntry::new("info", 0, CatalogType::pointer()).read_only();
        assert!(!field.is_writable());
        assert!(field.flags.contains(FieldFlags::READABLE));
    }
}
