//! Compilation of catalog entries into wire descriptors.
//!
//! The compiler lowers catalog-level types ([`CatalogType`]) into the
//! tag-and-size descriptors the instrumentation transport consumes. It is
//! pure: all lookups go through the [`TypeCatalog`] it is constructed with,
//! and compiling the same entry twice yields the same descriptor.

use gicall_core::{ArgumentDescriptor, CallableDescriptor, Direction, TypeDescriptor, TypeTag};
use gicall_registry::{
    ArgEntry, CallbackEntry, CatalogType, FunctionEntry, InterfaceKind, TypeCatalog,
};

/// Compiles type-catalog entries into wire descriptors.
pub struct TypeDescriptorCompiler<'a> {
    catalog: &'a TypeCatalog,
}

impl<'a> TypeDescriptorCompiler<'a> {
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self { catalog }
    }

    /// Lower a catalog type to its wire descriptor.
    ///
    /// Interface references resolve through the catalog: callback
    /// signatures compile recursively into a `callback` subtype, enums and
    /// flags collapse to the integer tag of their storage width (value
    /// translation is the dispatcher's job), and structs become `struct`
    /// or `gtype` depending on whether they carry a registered runtime
    /// type. Object interfaces and unresolved references degrade to
    /// `pointer`.
    pub fn compile_type(&self, ty: &CatalogType) -> TypeDescriptor {
        match ty {
            CatalogType::Boolean => TypeDescriptor::plain(TypeTag::Bool),
            CatalogType::Int8 => TypeDescriptor::plain(TypeTag::Int8),
            CatalogType::Uint8 => TypeDescriptor::plain(TypeTag::Uint8),
            CatalogType::Int16 => TypeDescriptor::plain(TypeTag::Int16),
            CatalogType::Uint16 => TypeDescriptor::plain(TypeTag::Uint16),
            CatalogType::Int32 => TypeDescriptor::plain(TypeTag::Int32),
            CatalogType::Uint32 => TypeDescriptor::plain(TypeTag::Uint32),
            CatalogType::Int64 => TypeDescriptor::plain(TypeTag::Int64),
            CatalogType::Uint64 => TypeDescriptor::plain(TypeTag::Uint64),
            CatalogType::Utf8 => TypeDescriptor::plain(TypeTag::String),
            CatalogType::Float => TypeDescriptor::plain(TypeTag::Float),
            CatalogType::Double => TypeDescriptor::plain(TypeTag::Double),
            // Runtime type identities travel as 64-bit integers.
            CatalogType::GType => TypeDescriptor::plain(TypeTag::Int64),
            CatalogType::Void { is_pointer: true } => TypeDescriptor::plain(TypeTag::Pointer),
            CatalogType::Void { is_pointer: false } => TypeDescriptor::plain(TypeTag::Void),
            CatalogType::Interface(name) => match self.catalog.interface(name) {
                Some(InterfaceKind::Callback(cb)) => {
                    TypeDescriptor::callback(self.compile_signature(
                        &cb.arguments,
                        &cb.returns,
                        false,
                    ))
                }
                Some(InterfaceKind::Enum(e)) => TypeDescriptor::plain(e.storage.tag()),
                Some(InterfaceKind::Struct(s)) => {
                    let tag = if s.has_runtime_type() {
                        TypeTag::Gtype
                    } else {
                        TypeTag::Struct
                    };
                    TypeDescriptor::sized(tag, s.size)
                }
                Some(InterfaceKind::Object(_)) | None => TypeDescriptor::plain(TypeTag::Pointer),
            },
        }
    }

    /// Compile one declared argument.
    ///
    /// An `out` struct/gtype argument the caller must pre-allocate is
    /// reclassified to `in`: the caller supplies the reference, nothing is
    /// allocated on its behalf here.
    pub fn compile_argument(&self, arg: &ArgEntry) -> ArgumentDescriptor {
        let ty = self.compile_type(&arg.ty);
        let mut compiled = ArgumentDescriptor::new(&arg.name, ty);
        compiled.direction = arg.direction;
        compiled.closure = arg.closure;
        compiled.destroy = arg.destroy;
        if matches!(compiled.ty, TypeTag::Struct | TypeTag::Gtype)
            && compiled.direction == Direction::Out
            && arg.caller_allocates
        {
            compiled.direction = Direction::In;
        }
        compiled
    }

    /// Compile a full callable: receiver prepended when `is_method`,
    /// arguments in declared order, then skip marking.
    fn compile_signature(
        &self,
        args: &[ArgEntry],
        returns: &CatalogType,
        is_method: bool,
    ) -> CallableDescriptor {
        let mut arguments = Vec::with_capacity(args.len() + usize::from(is_method));
        if is_method {
            arguments.push(ArgumentDescriptor::receiver());
        }
        arguments.extend(args.iter().map(|a| self.compile_argument(a)));

        let mut callable = CallableDescriptor {
            arguments,
            is_method,
            returns: self.compile_type(returns).tag,
        };
        mark_skip_targets(&mut callable);
        callable
    }

    pub fn compile_function(&self, entry: &FunctionEntry) -> CallableDescriptor {
        self.compile_signature(&entry.arguments, &entry.returns, entry.is_method)
    }

    pub fn compile_callback(&self, entry: &CallbackEntry) -> CallableDescriptor {
        self.compile_signature(&entry.arguments, &entry.returns, false)
    }
}

/// Mark skipped arguments after the whole list is compiled.
///
/// Arguments referenced by a closure/destroy index are supplied by the
/// instrumentation layer, not the caller; `out` arguments arrive only in
/// the result.
fn mark_skip_targets(callable: &mut CallableDescriptor) {
    let links: Vec<(i32, i32)> = callable
        .arguments
        .iter()
        .map(|a| (a.closure, a.destroy))
        .collect();
    for (closure, destroy) in links {
        if closure >= 0 {
            if let Some(target) = callable.arguments.get_mut(closure as usize) {
                target.skipped = true;
                target.is_closure = true;
            }
        }
        if destroy >= 0 {
            if let Some(target) = callable.arguments.get_mut(destroy as usize) {
                target.skipped = true;
                target.is_destroy = true;
            }
        }
    }
    for arg in &mut callable.arguments {
        if arg.direction == Direction::Out {
            arg.skipped = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gicall_registry::{EnumEntry, IntWidth, StructEntry};

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new("Gst");
        catalog.register_struct(StructEntry::new("Meta", 16));
        catalog.register_struct(
            StructEntry::new("Caps", 64).with_type_init("gst_caps_get_type"),
        );
        catalog.register_enum(
            EnumEntry::new("Format")
                .with_storage(IntWidth::I32)
                .with_value("Undefined", 0),
        );
        catalog.register_callback(
            CallbackEntry::new("Notify")
                .with_arg(ArgEntry::new("data", CatalogType::pointer()))
                .returning(CatalogType::void()),
        );
        catalog
    }

    #[test]
    fn primitives_use_the_fixed_table() {
        let c = catalog();
        let compiler = TypeDescriptorCompiler::new(&c);
        assert_eq!(compiler.compile_type(&CatalogType::Boolean).tag, TypeTag::Bool);
        assert_eq!(compiler.compile_type(&CatalogType::Utf8).tag, TypeTag::String);
        assert_eq!(compiler.compile_type(&CatalogType::GType).tag, TypeTag::Int64);
        assert_eq!(compiler.compile_type(&CatalogType::pointer()).tag, TypeTag::Pointer);
        assert_eq!(compiler.compile_type(&CatalogType::void()).tag, TypeTag::Void);
    }

    #[test]
    fn plain_struct_vs_registered_struct() {
        let c = catalog();
        let compiler = TypeDescriptorCompiler::new(&c);

        let meta = compiler.compile_type(&CatalogType::interface("Meta"));
        assert_eq!(meta.tag, TypeTag::Struct);
        assert_eq!(meta.struct_size, Some(16));

        let caps = compiler.compile_type(&CatalogType::interface("Caps"));
        assert_eq!(caps.tag, TypeTag::Gtype);
        assert_eq!(caps.struct_size, Some(64));
    }

    #[test]
    fn enum_collapses_to_storage_width() {
        let c = catalog();
        let compiler = TypeDescriptorCompiler::new(&c);
        let desc = compiler.compile_type(&CatalogType::interface("Format"));
        assert_eq!(desc.tag, TypeTag::Int32);
        assert_eq!(desc.struct_size, None);
    }

    #[test]
    fn unknown_interface_degrades_to_pointer() {
        let c = catalog();
        let compiler = TypeDescriptorCompiler::new(&c);
        let desc = compiler.compile_type(&CatalogType::interface("NoSuchType"));
        assert_eq!(desc.tag, TypeTag::Pointer);
    }

    #[test]
    fn callback_compiles_subtype() {
        let c = catalog();
        let compiler = TypeDescriptorCompiler::new(&c);
        let desc = compiler.compile_type(&CatalogType::interface("Notify"));
        assert_eq!(desc.tag, TypeTag::Callback);
        let subtype = desc.subtype.unwrap();
        assert_eq!(subtype.arguments.len(), 1);
        assert_eq!(subtype.returns, TypeTag::Void);
    }

    #[test]
    fn caller_allocated_out_struct_becomes_in() {
        let c = catalog();
        let compiler = TypeDescriptorCompiler::new(&c);
        let arg = ArgEntry::out("info", CatalogType::interface("Meta")).caller_allocated();
        let compiled = compiler.compile_argument(&arg);
        assert_eq!(compiled.direction, Direction::In);
        assert_eq!(compiled.ty, TypeTag::Struct);
    }

    #[test]
    fn closure_and_destroy_targets_are_skipped() {
        let c = catalog();
        let compiler = TypeDescriptorCompiler::new(&c);
        let entry = FunctionEntry::function("add_probe", "gst_pad_add_probe")
            .with_arg(ArgEntry::new("callback", CatalogType::interface("Notify"))
                .with_closure(1)
                .with_destroy(2))
            .with_arg(ArgEntry::new("user_data", CatalogType::pointer()))
            .with_arg(ArgEntry::new("destroy_data", CatalogType::pointer()))
            .returning(CatalogType::Uint64);

        let callable = compiler.compile_function(&entry);
        assert!(!callable.arguments[0].skipped);
        assert!(callable.arguments[1].skipped);
        assert!(callable.arguments[1].is_closure);
        assert!(callable.arguments[2].skipped);
        assert!(callable.arguments[2].is_destroy);
    }

    #[test]
    fn out_arguments_are_skipped() {
        let c = catalog();
        let compiler = TypeDescriptorCompiler::new(&c);
        let entry = FunctionEntry::function("version", "gst_version")
            .with_arg(ArgEntry::out("major", CatalogType::Uint32))
            .with_arg(ArgEntry::out("minor", CatalogType::Uint32));

        let callable = compiler.compile_function(&entry);
        assert!(callable.arguments.iter().all(|a| a.skipped));
        assert_eq!(callable.returns, TypeTag::Void);
    }

    #[test]
    fn method_gets_receiver_prepended() {
        let c = catalog();
        let compiler = TypeDescriptorCompiler::new(&c);
        let entry = FunctionEntry::method("compare", "gst_meta_compare")
            .with_arg(ArgEntry::new("other", CatalogType::interface("Meta")))
            .returning(CatalogType::Boolean);

        let callable = compiler.compile_function(&entry);
        assert!(callable.is_method);
        assert_eq!(callable.arguments.len(), 2);
        assert_eq!(callable.arguments[0].name, "this");
        assert_eq!(callable.arguments[0].ty, TypeTag::Pointer);
    }
}
