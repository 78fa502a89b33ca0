//! Symbolic-name to integer-value mappings for enum and flags types.

use rustc_hash::FxHashMap;

use crate::entries::EnumEntry;

/// Per-type bijection between symbolic enum names and integer values.
///
/// Built once from the catalog at startup and read-only thereafter. The
/// forward direction is an O(1) map; the reverse direction scans values in
/// declaration order.
#[derive(Debug, Clone)]
pub struct EnumMapping {
    qualified_name: String,
    by_name: FxHashMap<String, i64>,
    ordered: Vec<(String, i64)>,
}

impl EnumMapping {
    /// Build the mapping for an enum entry in `namespace`.
    pub fn from_entry(namespace: &str, entry: &EnumEntry) -> Self {
        let ordered: Vec<(String, i64)> = entry
            .values
            .iter()
            .map(|v| (v.name.clone(), v.value))
            .collect();
        let by_name = ordered
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        Self {
            qualified_name: format!("{namespace}{}", entry.name),
            by_name,
            ordered,
        }
    }

    /// The `<Namespace><TypeName>` identity of this mapping.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Integer value of a symbolic name.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).copied()
    }

    /// Symbolic name of an integer value.
    ///
    /// Mappings are expected to be value-unique. If a type aliases two
    /// names to the same integer, the first-declared name wins; this is a
    /// documented fallback, not a guarantee.
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.ordered
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
