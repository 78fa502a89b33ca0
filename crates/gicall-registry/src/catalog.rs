//! The type catalog: one namespace of a native API.

use rustc_hash::FxHashMap;

use crate::entries::{CallbackEntry, EnumEntry, FunctionEntry, ObjectEntry, StructEntry};
use crate::mapping::EnumMapping;

/// A registered type that can back the generic `new`/`free`/`get_type`
/// operations.
#[derive(Debug, Clone, Copy)]
pub enum RegisteredType<'a> {
    Struct(&'a StructEntry),
    Object(&'a ObjectEntry),
    Enum(&'a EnumEntry),
}

impl<'a> RegisteredType<'a> {
    /// The runtime type-identity accessor symbol, if the entry has one.
    pub fn type_init(&self) -> Option<&'a str> {
        match self {
            RegisteredType::Struct(s) => s.type_init.as_deref(),
            RegisteredType::Object(o) => o.type_init.as_deref(),
            RegisteredType::Enum(e) => e.type_init.as_deref(),
        }
    }
}

/// What an interface reference resolves to.
#[derive(Debug, Clone, Copy)]
pub enum InterfaceKind<'a> {
    Callback(&'a CallbackEntry),
    Enum(&'a EnumEntry),
    Struct(&'a StructEntry),
    Object(&'a ObjectEntry),
}

/// The structural registry describing one namespace of a native API.
///
/// Populated once at startup (enum mappings are built as enums are
/// registered) and read-only for the process lifetime of the resolver.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    namespace: String,
    functions: FxHashMap<String, FunctionEntry>,
    structs: FxHashMap<String, StructEntry>,
    objects: FxHashMap<String, ObjectEntry>,
    enums: FxHashMap<String, EnumEntry>,
    callbacks: FxHashMap<String, CallbackEntry>,
    enum_mappings: FxHashMap<String, EnumMapping>,
}

impl TypeCatalog {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // =========================================================================
    // Registration
    // =========================================================================

    pub fn register_function(&mut self, entry: FunctionEntry) {
        self.functions.insert(entry.name.clone(), entry);
    }

    pub fn register_struct(&mut self, entry: StructEntry) {
        self.structs.insert(entry.name.clone(), entry);
    }

    pub fn register_object(&mut self, entry: ObjectEntry) {
        self.objects.insert(entry.name.clone(), entry);
    }

    pub fn register_enum(&mut self, entry: EnumEntry) {
        let mapping = EnumMapping::from_entry(&self.namespace, &entry);
        self.enum_mappings.insert(entry.name.clone(), mapping);
        self.enums.insert(entry.name.clone(), entry);
    }

    pub fn register_callback(&mut self, entry: CallbackEntry) {
        self.callbacks.insert(entry.name.clone(), entry);
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Namespace-level function by name.
    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }

    /// Method by class and member name, searching structs, objects, and
    /// enums in that order.
    pub fn method(&self, class_name: &str, name: &str) -> Option<&FunctionEntry> {
        if let Some(s) = self.structs.get(class_name) {
            if let Some(m) = s.method(name) {
                return Some(m);
            }
        }
        if let Some(o) = self.objects.get(class_name) {
            if let Some(m) = o.method(name) {
                return Some(m);
            }
        }
        if let Some(e) = self.enums.get(class_name) {
            if let Some(m) = e.method(name) {
                return Some(m);
            }
        }
        None
    }

    pub fn struct_entry(&self, name: &str) -> Option<&StructEntry> {
        self.structs.get(name)
    }

    pub fn object_entry(&self, name: &str) -> Option<&ObjectEntry> {
        self.objects.get(name)
    }

    pub fn enum_entry(&self, name: &str) -> Option<&EnumEntry> {
        self.enums.get(name)
    }

    pub fn callback_entry(&self, name: &str) -> Option<&CallbackEntry> {
        self.callbacks.get(name)
    }

    /// Any registered struct/object/enum with this class name, for the
    /// generic operations.
    pub fn registered_type(&self, class_name: &str) -> Option<RegisteredType<'_>> {
        if let Some(s) = self.structs.get(class_name) {
            return Some(RegisteredType::Struct(s));
        }
        if let Some(o) = self.objects.get(class_name) {
            return Some(RegisteredType::Object(o));
        }
        if let Some(e) = self.enums.get(class_name) {
            return Some(RegisteredType::Enum(e));
        }
        None
    }

    /// Resolve an interface reference to the kind of entry it names.
    pub fn interface(&self, name: &str) -> Option<InterfaceKind<'_>> {
        if let Some(c) = self.callbacks.get(name) {
            return Some(InterfaceKind::Callback(c));
        }
        if let Some(e) = self.enums.get(name) {
            return Some(InterfaceKind::Enum(e));
        }
        if let Some(s) = self.structs.get(name) {
            return Some(InterfaceKind::Struct(s));
        }
        if let Some(o) = self.objects.get(name) {
            return Some(InterfaceKind::Object(o));
        }
        None
    }

    /// Enum mapping by type name.
    pub fn enum_mapping(&self, type_name: &str) -> Option<&EnumMapping> {
        self.enum_mappings.get(type_name)
    }

    /// Enumerate all values of an enum type.
    pub fn enum_values(&self, type_name: &str) -> Option<impl Iterator<Item = (&str, i64)>> {
        self.enums
            .get(type_name)
            .map(|e| e.values.iter().map(|v| (v.name.as_str(), v.value)))
    }
}
