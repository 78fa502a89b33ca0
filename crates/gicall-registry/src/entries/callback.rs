//! Callback signature entries.

use super::{ArgEntry, CatalogType};

/// Registry entry for a callback signature.
///
/// Callbacks are never called through the catalog themselves; their
/// signature is compiled into the `subtype` of any argument typed with
/// them so the instrumentation layer can trampoline invocations back out.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackEntry {
    pub name: String,
    pub arguments: Vec<ArgEntry>,
    pub returns: CatalogType,
}

impl CallbackEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            returns: CatalogType::void(),
        }
    }

    pub fn with_arg(mut self, arg: ArgEntry) -> Self {
        self.arguments.push(arg);
        self
    }

    pub fn returning(mut self, ty: CatalogType) -> Self {
        self.returns = ty;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_entry_builder() {
        let entry = CallbackEntry::new("PadProbeCallback")
            .with_arg(ArgEntry::new("pad", CatalogType::pointer()))
            .with_arg(ArgEntry::new("info", CatalogType::pointer()))
            .returning(CatalogType::Int32);

        assert_eq!(entry.arguments.len(), 2);
        assert_eq!(entry.returns, CatalogType::Int32);
    }
}
