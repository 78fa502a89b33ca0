//! Enumeration and flags entries.

use super::{FunctionEntry, IntWidth};

/// One named value of an enum or flags type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

impl EnumValue {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Registry entry for an enumeration or flags type.
///
/// Both kinds are integer-backed named constants; `is_flags` only matters
/// to consumers that care about bitwise composition.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumEntry {
    pub name: String,
    pub is_flags: bool,
    pub storage: IntWidth,
    pub type_init: Option<String>,
    pub values: Vec<EnumValue>,
    pub methods: Vec<FunctionEntry>,
}

impl EnumEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_flags: false,
            storage: IntWidth::default(),
            type_init: None,
            values: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn flags(name: impl Into<String>) -> Self {
        Self {
            is_flags: true,
            ..Self::new(name)
        }
    }

    pub fn with_storage(mut self, storage: IntWidth) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_type_init(mut self, symbol: impl Into<String>) -> Self {
        self.type_init = Some(symbol.into());
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: i64) -> Self {
        self.values.push(EnumValue::new(name, value));
        self
    }

    pub fn with_method(mut self, method: FunctionEntry) -> Self {
        self.methods.push(method);
        self
    }

    /// Look up a value by name.
    pub fn get_value(&self, name: &str) -> Option<i64> {
        self.values.iter().find(|v| v.name == name).map(|v| v.value)
    }

    /// Look up a name by value.
    pub fn get_name(&self, value: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.value == value)
            .map(|v| v.name.as_str())
    }

    pub fn method(&self, name: &str) -> Option<&FunctionEntry> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_entry_values() {
        let entry = EnumEntry::new("State")
            .with_value("Null", 1)
            .with_value("Ready", 2)
            .with_value("Playing", 4);

        assert_eq!(entry.get_value("Ready"), Some(2));
        assert_eq!(entry.get_value("Paused"), None);
        assert_eq!(entry.get_name(4), Some("Playing"));
        assert_eq!(entry.get_name(99), None);
        assert!(!entry.is_flags);
    }

    #[test]
    fn flags_entry_is_marked() {
        let entry = EnumEntry::flags("SeekFlags").with_value("Flush", 1);
        assert!(entry.is_flags);
        assert_eq!(entry.storage, IntWidth::I32);
    }
}
