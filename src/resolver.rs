//! Operation resolution: deciding how a call is satisfied.
//!
//! Given a parsed [`OperationIdentity`] and the catalog, the resolver picks
//! one of three paths: a direct function/method call, a struct-field
//! accessor, or a synthesized generic operation (`new`/`free`/`get_type`)
//! for registered types that lack a native one. The output carries
//! everything the dispatcher needs: the compiled wire descriptor plus
//! per-argument and per-result conversion plans.

use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashMap;

use gicall_core::{
    CallableDescriptor, Direction, FieldOperator, OperationIdentity, ResolveError,
    TypeDescriptor, TypeTag,
};
use gicall_registry::{
    CatalogType, FunctionEntry, InterfaceKind, RegisteredType, TypeCatalog,
};

use crate::compiler::TypeDescriptorCompiler;

/// How one supplied argument value is converted before transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueConversion {
    /// Symbolic enum name -> integer, via the named type's mapping.
    EnumToken(String),
    /// `{"ptr": ...}` -> raw pointer value.
    UnwrapReference,
    Passthrough,
}

/// How one result field is converted after transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultConversion {
    /// Raw pointer value -> `{"ptr": ...}`.
    WrapReference,
    /// Integer -> symbolic name, via the named type's mapping.
    EnumName(String),
    Passthrough,
}

/// Conversion plan for one caller-supplied argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentPlan {
    pub name: String,
    pub conversion: ValueConversion,
}

/// Conversion plan for one field of the structured result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPlan {
    pub field: String,
    pub conversion: ResultConversion,
}

/// A direct call, bound to its native symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOperation {
    pub symbol: String,
    pub descriptor: CallableDescriptor,
    /// Caller-supplied arguments in catalog-declared order, skipped ones
    /// excluded. The method receiver is not listed; it is handled
    /// separately.
    pub inputs: Vec<ArgumentPlan>,
    /// Response schema: the `return` field plus any `out` arguments.
    pub results: Vec<ResultPlan>,
}

/// A struct-field read.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGetOperation {
    pub offset: usize,
    pub field: TypeDescriptor,
    pub conversion: ResultConversion,
}

/// A struct-field write.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPutOperation {
    pub offset: usize,
    pub field: TypeDescriptor,
}

/// The resolver's decision for one operation identity.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedOperation {
    Call(CallOperation),
    FieldGet(FieldGetOperation),
    FieldPut(FieldPutOperation),
    /// Synthesized allocator for a struct with no native constructor.
    GenericNew { size: usize },
    /// Synthesized deallocator; requires a `self` reference at dispatch.
    GenericFree,
    /// Runtime type-identity query through the entry's registered accessor.
    GetType { symbol: String },
}

/// Resolves operation identities against an immutable catalog.
///
/// Resolution happens once per distinct identity; the result is cached for
/// the resolver's lifetime.
pub struct OperationResolver {
    catalog: Arc<TypeCatalog>,
    cache: Mutex<FxHashMap<String, Arc<ResolvedOperation>>>,
}

impl OperationResolver {
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self {
            catalog,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    /// Resolve an identity, consulting the cache first.
    pub fn resolve(
        &self,
        identity: &OperationIdentity,
    ) -> Result<Arc<ResolvedOperation>, ResolveError> {
        let key = identity.to_string();
        if let Some(hit) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(hit));
        }

        let resolved = Arc::new(self.resolve_uncached(identity)?);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&resolved));
        Ok(resolved)
    }

    fn resolve_uncached(
        &self,
        identity: &OperationIdentity,
    ) -> Result<ResolvedOperation, ResolveError> {
        match identity.operator {
            FieldOperator::Get => self.resolve_field(identity, false),
            FieldOperator::Put => self.resolve_field(identity, true),
            FieldOperator::None => self.resolve_member(identity),
        }
    }

    fn resolve_field(
        &self,
        identity: &OperationIdentity,
        writing: bool,
    ) -> Result<ResolvedOperation, ResolveError> {
        let class_name = identity.class_name.as_deref().ok_or_else(|| {
            ResolveError::UnknownOperation {
                operation: identity.to_string(),
            }
        })?;
        let entry = self.catalog.struct_entry(class_name).ok_or_else(|| {
            ResolveError::UnknownType {
                namespace: identity.namespace.clone(),
                class_name: class_name.to_string(),
            }
        })?;
        let field = entry.field(&identity.member).ok_or_else(|| {
            ResolveError::UnknownField {
                class_name: class_name.to_string(),
                field: identity.member.clone(),
            }
        })?;

        let compiler = TypeDescriptorCompiler::new(&self.catalog);
        let descriptor = compiler.compile_type(&field.ty);
        if writing {
            if !field.is_writable() {
                return Err(ResolveError::FieldNotWritable {
                    class_name: class_name.to_string(),
                    field: identity.member.clone(),
                });
            }
            Ok(ResolvedOperation::FieldPut(FieldPutOperation {
                offset: field.offset,
                field: descriptor,
            }))
        } else {
            Ok(ResolvedOperation::FieldGet(FieldGetOperation {
                offset: field.offset,
                field: descriptor,
                conversion: self.result_conversion(&field.ty),
            }))
        }
    }

    fn resolve_member(
        &self,
        identity: &OperationIdentity,
    ) -> Result<ResolvedOperation, ResolveError> {
        let entry = match identity.class_name.as_deref() {
            Some(class_name) => self.catalog.method(class_name, &identity.member),
            None => self.catalog.function(&identity.member),
        };
        if let Some(entry) = entry {
            return Ok(ResolvedOperation::Call(self.plan_call(entry)));
        }

        // The reserved members synthesize generic operations for any
        // registered type; everything else is unresolved.
        let Some((class_name, registered)) = identity.class_name.as_deref().and_then(|class| {
            self.catalog
                .registered_type(class)
                .map(|registered| (class, registered))
        }) else {
            return Err(ResolveError::UnknownOperation {
                operation: identity.to_string(),
            });
        };

        match identity.member.as_str() {
            "new" => match registered {
                RegisteredType::Struct(s) => Ok(ResolvedOperation::GenericNew { size: s.size }),
                // Non-struct kinds have no allocation size; refusing beats
                // silently handing out zero-byte allocations.
                RegisteredType::Object(_) | RegisteredType::Enum(_) => {
                    Err(ResolveError::UnsupportedGenericNew {
                        class_name: class_name.to_string(),
                    })
                }
            },
            "free" => Ok(ResolvedOperation::GenericFree),
            "get_type" => {
                let symbol = registered.type_init().ok_or_else(|| {
                    ResolveError::NoRuntimeType {
                        class_name: class_name.to_string(),
                    }
                })?;
                Ok(ResolvedOperation::GetType {
                    symbol: symbol.to_string(),
                })
            }
            _ => Err(ResolveError::UnknownOperation {
                operation: identity.to_string(),
            }),
        }
    }

    /// Build the dispatch plan for a direct call.
    fn plan_call(&self, entry: &FunctionEntry) -> CallOperation {
        let compiler = TypeDescriptorCompiler::new(&self.catalog);
        let descriptor = compiler.compile_function(entry);
        let receiver_offset = usize::from(entry.is_method);

        let mut inputs = Vec::new();
        let mut results = Vec::new();

        if descriptor.returns != TypeTag::Void {
            results.push(ResultPlan {
                field: "return".to_string(),
                conversion: self.result_conversion(&entry.returns),
            });
        }

        for (index, arg) in entry.arguments.iter().enumerate() {
            let compiled = &descriptor.arguments[index + receiver_offset];
            if compiled.direction == Direction::Out {
                results.push(ResultPlan {
                    field: arg.name.clone(),
                    conversion: self.result_conversion(&arg.ty),
                });
            }
            if compiled.skipped {
                continue;
            }
            inputs.push(ArgumentPlan {
                name: arg.name.clone(),
                conversion: self.value_conversion(&arg.ty),
            });
        }

        CallOperation {
            symbol: entry.symbol.clone(),
            descriptor,
            inputs,
            results,
        }
    }

    fn value_conversion(&self, ty: &CatalogType) -> ValueConversion {
        match ty {
            CatalogType::Interface(name) => match self.catalog.interface(name) {
                Some(InterfaceKind::Enum(e)) => ValueConversion::EnumToken(e.name.clone()),
                Some(InterfaceKind::Struct(_)) | Some(InterfaceKind::Object(_)) => {
                    ValueConversion::UnwrapReference
                }
                Some(InterfaceKind::Callback(_)) | None => ValueConversion::Passthrough,
            },
            _ => ValueConversion::Passthrough,
        }
    }

    fn result_conversion(&self, ty: &CatalogType) -> ResultConversion {
        match ty {
            CatalogType::Interface(name) => match self.catalog.interface(name) {
                Some(InterfaceKind::Enum(e)) => ResultConversion::EnumName(e.name.clone()),
                Some(InterfaceKind::Struct(_)) | Some(InterfaceKind::Object(_)) => {
                    ResultConversion::WrapReference
                }
                Some(InterfaceKind::Callback(_)) | None => ResultConversion::Passthrough,
            },
            _ => ResultConversion::Passthrough,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gicall_registry::{ArgEntry, EnumEntry, FieldEntry, StructEntry};

    fn catalog() -> Arc<TypeCatalog> {
        let mut catalog = TypeCatalog::new("Gst");
        catalog.register_function(
            FunctionEntry::function("parse_launch", "gst_parse_launch")
                .with_arg(ArgEntry::new("pipeline", CatalogType::Utf8))
                .returning(CatalogType::interface("Meta")),
        );
        catalog.register_struct(
            StructEntry::new("Meta", 16)
                .with_field(FieldEntry::new("flags", 0, CatalogType::interface("Format")))
                .with_field(FieldEntry::new("info", 8, CatalogType::pointer()).read_only())
                .with_method(
                    FunctionEntry::method("compare", "gst_meta_compare")
                        .with_arg(ArgEntry::new("other", CatalogType::interface("Meta")))
                        .returning(CatalogType::Boolean),
                ),
        );
        catalog.register_enum(
            EnumEntry::new("Format")
                .with_type_init("gst_format_get_type")
                .with_value("Undefined", 0)
                .with_value("Default", 1),
        );
        Arc::new(catalog)
    }

    fn resolver() -> OperationResolver {
        OperationResolver::new(catalog())
    }

    fn parse(op: &str) -> OperationIdentity {
        OperationIdentity::parse(op).unwrap()
    }

    #[test]
    fn resolves_namespace_function() {
        let r = resolver();
        let op = r.resolve(&parse("Gst--parse_launch")).unwrap();
        let ResolvedOperation::Call(call) = &*op else {
            panic!("expected a direct call");
        };
        assert_eq!(call.symbol, "gst_parse_launch");
        assert_eq!(call.inputs.len(), 1);
        assert_eq!(call.results[0].field, "return");
        assert_eq!(call.results[0].conversion, ResultConversion::WrapReference);
    }

    #[test]
    fn resolves_method_with_enum_and_reference_plans() {
        let r = resolver();
        let op = r.resolve(&parse("Gst-Meta-compare")).unwrap();
        let ResolvedOperation::Call(call) = &*op else {
            panic!("expected a direct call");
        };
        assert!(call.descriptor.is_method);
        assert_eq!(
            call.inputs[0].conversion,
            ValueConversion::UnwrapReference
        );
    }

    #[test]
    fn resolves_field_get_and_put() {
        let r = resolver();
        let get = r.resolve(&parse("Gst-Meta-flags-get")).unwrap();
        let ResolvedOperation::FieldGet(f) = &*get else {
            panic!("expected field get");
        };
        assert_eq!(f.offset, 0);
        assert_eq!(f.conversion, ResultConversion::EnumName("Format".into()));

        assert!(matches!(
            &*r.resolve(&parse("Gst-Meta-flags-put")).unwrap(),
            ResolvedOperation::FieldPut(_)
        ));
    }

    #[test]
    fn put_on_read_only_field_fails() {
        let r = resolver();
        assert!(matches!(
            r.resolve(&parse("Gst-Meta-info-put")),
            Err(ResolveError::FieldNotWritable { .. })
        ));
        // Reading it is still fine.
        assert!(r.resolve(&parse("Gst-Meta-info-get")).is_ok());
    }

    #[test]
    fn unknown_field_and_type_fail() {
        let r = resolver();
        assert!(matches!(
            r.resolve(&parse("Gst-Meta-nothing-get")),
            Err(ResolveError::UnknownField { .. })
        ));
        assert!(matches!(
            r.resolve(&parse("Gst-Nope-flags-get")),
            Err(ResolveError::UnknownType { .. })
        ));
    }

    #[test]
    fn struct_without_constructor_gets_generic_new_and_free() {
        let r = resolver();
        assert!(matches!(
            &*r.resolve(&parse("Gst-Meta-new")).unwrap(),
            ResolvedOperation::GenericNew { size: 16 }
        ));
        assert!(matches!(
            &*r.resolve(&parse("Gst-Meta-free")).unwrap(),
            ResolvedOperation::GenericFree
        ));
    }

    #[test]
    fn generic_new_on_enum_is_unsupported() {
        let r = resolver();
        assert!(matches!(
            r.resolve(&parse("Gst-Format-new")),
            Err(ResolveError::UnsupportedGenericNew { .. })
        ));
    }

    #[test]
    fn get_type_uses_registered_accessor() {
        let r = resolver();
        let op = r.resolve(&parse("Gst-Format-get_type")).unwrap();
        let ResolvedOperation::GetType { symbol } = &*op else {
            panic!("expected get_type");
        };
        assert_eq!(symbol, "gst_format_get_type");
    }

    #[test]
    fn get_type_without_runtime_type_fails() {
        let r = resolver();
        assert!(matches!(
            r.resolve(&parse("Gst-Meta-get_type")),
            Err(ResolveError::NoRuntimeType { .. })
        ));
    }

    #[test]
    fn unknown_operation_fails() {
        let r = resolver();
        assert!(matches!(
            r.resolve(&parse("Gst-Meta-explode")),
            Err(ResolveError::UnknownOperation { .. })
        ));
        assert!(matches!(
            r.resolve(&parse("Gst--no_such_function")),
            Err(ResolveError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn resolution_is_cached() {
        let r = resolver();
        let first = r.resolve(&parse("Gst-Meta-compare")).unwrap();
        let second = r.resolve(&parse("Gst-Meta-compare")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
