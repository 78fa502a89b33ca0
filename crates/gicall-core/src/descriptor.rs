//! Wire-level call descriptors.
//!
//! A [`CallableDescriptor`] is the JSON document sent to the instrumentation
//! transport alongside a resolved symbol: an ordered argument list, a method
//! flag, and a return tag. Descriptors are immutable once compiled and are
//! cached per operation identity by the resolver.

use serde::{Deserialize, Serialize};

use crate::{Direction, TypeTag};

/// Compiled type of a single value: a tag plus the extras some tags carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    #[serde(rename = "type")]
    pub tag: TypeTag,
    /// Byte size, present only for `struct`/`gtype` tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub struct_size: Option<usize>,
    /// Nested signature, present only for the `callback` tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Box<CallableDescriptor>>,
}

impl TypeDescriptor {
    /// A descriptor that is just a bare tag.
    pub fn plain(tag: TypeTag) -> Self {
        Self {
            tag,
            struct_size: None,
            subtype: None,
        }
    }

    /// A sized aggregate descriptor (`struct` or `gtype`).
    pub fn sized(tag: TypeTag, struct_size: usize) -> Self {
        Self {
            tag,
            struct_size: Some(struct_size),
            subtype: None,
        }
    }

    /// A callback descriptor wrapping its compiled signature.
    pub fn callback(signature: CallableDescriptor) -> Self {
        Self {
            tag: TypeTag::Callback,
            struct_size: None,
            subtype: Some(Box::new(signature)),
        }
    }
}

/// One argument of a wire call descriptor.
///
/// The `closure`/`destroy` indices point at sibling arguments that carry the
/// user-data and destroy-notify values for a callback argument; `-1` means
/// none. An argument referenced by such an index is always `skipped` and
/// flagged as the corresponding target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentDescriptor {
    pub name: String,
    pub skipped: bool,
    pub closure: i32,
    pub is_closure: bool,
    pub destroy: i32,
    pub is_destroy: bool,
    pub direction: Direction,
    #[serde(rename = "type")]
    pub ty: TypeTag,
    pub subtype: Option<Box<CallableDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub struct_size: Option<usize>,
}

impl ArgumentDescriptor {
    /// Create an `in` argument with no closure/destroy links.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            skipped: false,
            closure: -1,
            is_closure: false,
            destroy: -1,
            is_destroy: false,
            direction: Direction::In,
            ty: ty.tag,
            subtype: ty.subtype,
            struct_size: ty.struct_size,
        }
    }

    /// The implicit method receiver, prepended when a callable is a method.
    pub fn receiver() -> Self {
        Self::new("this", TypeDescriptor::plain(TypeTag::Pointer))
    }

    /// View this argument's type as a [`TypeDescriptor`].
    pub fn type_descriptor(&self) -> TypeDescriptor {
        TypeDescriptor {
            tag: self.ty,
            struct_size: self.struct_size,
            subtype: self.subtype.clone(),
        }
    }
}

/// The wire descriptor for one callable: ordered arguments, method flag,
/// return tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallableDescriptor {
    pub arguments: Vec<ArgumentDescriptor>,
    pub is_method: bool,
    pub returns: TypeTag,
}

impl CallableDescriptor {
    /// A zero-argument function descriptor returning `returns`.
    pub fn nullary(returns: TypeTag) -> Self {
        Self {
            arguments: Vec::new(),
            is_method: false,
            returns,
        }
    }
}
