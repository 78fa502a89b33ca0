//! Operation identity: the dash-delimited operation name.

use std::fmt;
use std::str::FromStr;

use crate::error::IdentityError;

/// Field accessor operator carried as the optional fourth segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldOperator {
    #[default]
    None,
    Get,
    Put,
}

impl FieldOperator {
    /// The segment text, if this operator occupies a segment.
    pub const fn as_segment(self) -> Option<&'static str> {
        match self {
            FieldOperator::None => None,
            FieldOperator::Get => Some("get"),
            FieldOperator::Put => Some("put"),
        }
    }
}

/// Parsed form of an operation name.
///
/// The canonical string form is `<namespace>-<class-or-empty>-<member>`
/// with an optional `-get`/`-put` suffix for field accessors. An empty
/// class segment denotes a namespace-level function; the two-segment form
/// `<namespace>-<member>` is accepted on input and normalizes to the
/// canonical empty-segment form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationIdentity {
    pub namespace: String,
    pub class_name: Option<String>,
    pub member: String,
    pub operator: FieldOperator,
}

impl OperationIdentity {
    /// A namespace-level function.
    pub fn function(namespace: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            class_name: None,
            member: member.into(),
            operator: FieldOperator::None,
        }
    }

    /// A method (or reserved generic member) on a class.
    pub fn method(
        namespace: impl Into<String>,
        class_name: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            class_name: Some(class_name.into()),
            member: member.into(),
            operator: FieldOperator::None,
        }
    }

    /// A field accessor on a struct.
    pub fn field(
        namespace: impl Into<String>,
        class_name: impl Into<String>,
        field: impl Into<String>,
        operator: FieldOperator,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            class_name: Some(class_name.into()),
            member: field.into(),
            operator,
        }
    }

    /// Parse a dash-delimited operation name.
    pub fn parse(operation: &str) -> Result<Self, IdentityError> {
        let parts: Vec<&str> = operation.split('-').collect();
        let (namespace, class_name, member, operator) = match parts.as_slice() {
            [ns, member] => (*ns, None, *member, FieldOperator::None),
            [ns, class, member] => (*ns, Some(*class), *member, FieldOperator::None),
            [ns, class, member, op] => {
                let operator = match *op {
                    "get" => FieldOperator::Get,
                    "put" => FieldOperator::Put,
                    other => {
                        return Err(IdentityError::UnknownOperator {
                            operation: operation.to_string(),
                            operator: other.to_string(),
                        });
                    }
                };
                (*ns, Some(*class), *member, operator)
            }
            _ => {
                return Err(IdentityError::MalformedOperation {
                    operation: operation.to_string(),
                    segments: parts.len(),
                });
            }
        };

        if namespace.is_empty() || member.is_empty() {
            return Err(IdentityError::MalformedOperation {
                operation: operation.to_string(),
                segments: parts.len(),
            });
        }

        Ok(Self {
            namespace: namespace.to_string(),
            class_name: class_name.filter(|c| !c.is_empty()).map(str::to_string),
            member: member.to_string(),
            operator,
        })
    }
}

impl FromStr for OperationIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OperationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.namespace,
            self.class_name.as_deref().unwrap_or(""),
            self.member
        )?;
        if let Some(op) = self.operator.as_segment() {
            write!(f, "-{op}")?;
        }
        Ok(())
    }
}
