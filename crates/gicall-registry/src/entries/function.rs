//! Function and argument entries.

use gicall_core::Direction;

use super::CatalogType;

/// One declared argument of a catalog function.
///
/// `closure`/`destroy` are indices of sibling arguments carrying a callback
/// argument's user-data and destroy-notify values (`-1` = none), exactly as
/// introspection data records them. `caller_allocates` marks an `out`
/// argument the caller must pre-allocate; the compiler reclassifies such
/// arguments to `in`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgEntry {
    pub name: String,
    pub direction: Direction,
    pub closure: i32,
    pub destroy: i32,
    pub caller_allocates: bool,
    pub ty: CatalogType,
}

impl ArgEntry {
    /// Create an `in` argument with no closure/destroy links.
    pub fn new(name: impl Into<String>, ty: CatalogType) -> Self {
        Self {
            name: name.into(),
            direction: Direction::In,
            closure: -1,
            destroy: -1,
            caller_allocates: false,
            ty,
        }
    }

    /// Create an `out` argument.
    pub fn out(name: impl Into<String>, ty: CatalogType) -> Self {
        Self {
            direction: Direction::Out,
            ..Self::new(name, ty)
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_closure(mut self, index: i32) -> Self {
        self.closure = index;
        self
    }

    pub fn with_destroy(mut self, index: i32) -> Self {
        self.destroy = index;
        self
    }

    pub fn caller_allocated(mut self) -> Self {
        self.caller_allocates = true;
        self
    }
}

/// Registry entry for a function or method.
///
/// `symbol` is the native symbol the instrumentation transport resolves
/// and calls. Methods receive an implicit receiver that is not part of
/// `arguments`; the compiler prepends it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionEntry {
    pub name: String,
    pub symbol: String,
    pub is_method: bool,
    pub arguments: Vec<ArgEntry>,
    pub returns: CatalogType,
}

impl FunctionEntry {
    /// Create a namespace-level function entry.
    pub fn function(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            is_method: false,
            arguments: Vec::new(),
            returns: CatalogType::void(),
        }
    }

    /// Create a method entry (implicit receiver).
    pub fn method(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            is_method: true,
            ..Self::function(name, symbol)
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

    /// Look up a declared argument by name.
    pub fn argument(&self, name: &str) -> Option<&ArgEntry> {
        self.arguments.iter().find(|a| a.name == name)
    }
}
