//! Object (class) entries.

use super::FunctionEntry;

/// Registry entry for an object type.
///
/// Objects always marshal as pointers; unlike structs they have no byte
/// size the generic constructor could use.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub name: String,
    pub type_init: Option<String>,
    pub methods: Vec<FunctionEntry>,
}

impl ObjectEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_init: None,
            methods: Vec::new(),
        }
    }

    pub fn with_type_init(mut self, symbol: impl Into<String>) -> Self {
        self.type_init = Some(symbol.into());
        self
    }

    pub fn with_method(mut self, method: FunctionEntry) -> Self {
        self.methods.push(method);
        self
    }

    pub fn method(&self, name: &str) -> Option<&FunctionEntry> {
        self.methods.iter().find(|m| m.name == name)
    }
}
