//! Transcoding-side (C++) renderer.
//!
//! Emits one `describe_<T>` function per top-level type, copying a native
//! structure into the matching generated message. Native headers the body
//! needs are collected as imports; other transcoding units it calls are
//! collected as foreign imports.

mod containers;
mod enums;
mod messages;

use std::collections::BTreeSet;

use crate::config::RenderOptions;
use crate::context::{OuterTypes, RenderContext};
use crate::error::CodegenError;
use crate::names::{NameResolver, Names, type_name};
use crate::type_table::ProtoScalar;
use crate::walker::{self, FieldRenderer};
use protogen_schema::{Field, ResolvedRules, TypeDecl, TypeMeta};

/// The enum field that selects the active arm of a following union.
#[derive(Debug, Clone)]
struct Discriminant {
    /// Native member holding the value.
    native: String,
    /// Qualifier of the enum constants, up to and including `::`.
    prefix: String,
}

/// Renderer for the transcoding function of one type.
///
/// Like [`crate::proto::ProtoRenderer`], a renderer covers a single render
/// call; the anonymous names it produces match the schema side only when
/// both start fresh on the same type.
pub struct CppRenderer<'r> {
    rules: &'r ResolvedRules,
    options: &'r RenderOptions,
    resolver: NameResolver<'r>,
    imports: BTreeSet<String>,
    foreign_imports: BTreeSet<String>,
    discriminant: Option<Discriminant>,
    self_type: Option<String>,
}

impl<'r> CppRenderer<'r> {
    /// Creates a renderer.
    #[must_use]
    pub fn new(rules: &'r ResolvedRules, options: &'r RenderOptions) -> Self {
        Self {
            rules,
            options,
            resolver: NameResolver::new(rules),
            imports: BTreeSet::new(),
            foreign_imports: BTreeSet::new(),
            discriminant: None,
            self_type: None,
        }
    }

    /// Sets the name of the enclosing top-level type.
    #[must_use]
    pub fn with_self_type(mut self, type_name: impl Into<String>) -> Self {
        self.self_type = Some(type_name.into());
        self
    }

    /// Native types whose headers the rendered code needs.
    #[must_use]
    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    /// Transcoding units the rendered code calls into.
    #[must_use]
    pub fn foreign_imports(&self) -> &BTreeSet<String> {
        &self.foreign_imports
    }

    /// Consumes the renderer and returns both import sets.
    #[must_use]
    pub fn into_imports(self) -> (BTreeSet<String>, BTreeSet<String>) {
        (self.imports, self.foreign_imports)
    }

    /// Renders the transcoding function of a top-level type.
    ///
    /// # Errors
    /// Returns `CodegenError::UnsupportedType` for a definition that is not a
    /// struct, class, enum or bitfield, `CodegenError::MissingAttribute` when
    /// it has no `type-name`, and any error raised by its fields.
    pub fn render_type(&mut self, decl: TypeDecl<'_>) -> Result<String, CodegenError> {
        let meta = decl
            .type_meta()
            .ok_or_else(|| CodegenError::unsupported_type(decl.as_field()))?;
        let type_name = decl
            .type_name()
            .ok_or_else(|| CodegenError::missing_attr(decl.as_field(), "type-name"))?;
        self.self_type = Some(type_name.to_string());

        let mut output = String::new();
        if let Some(comment) = decl.comment() {
            output.push_str(&format!("/* {} */\n", comment));
        }
        output.push_str(&format!(
            "void {}::describe_{}({}::{}* proto, {}::{}* dfhack) {{\n",
            self.options.cpp_namespace,
            type_name,
            self.options.proto_namespace,
            type_name,
            self.options.native_namespace,
            type_name,
        ));

        match meta {
            TypeMeta::Enum => {
                output.push_str(&format!(
                    "  *proto = static_cast<{}::{}>(*dfhack);\n",
                    self.options.proto_namespace, type_name
                ));
            }
            TypeMeta::Bitfield => {
                output.push_str("  proto->set_flags(dfhack->whole);\n");
            }
            TypeMeta::Struct | TypeMeta::Class => {
                output.push_str(&self.struct_body(decl, type_name)?);
            }
        }

        output.push_str("}\n");
        Ok(output)
    }

    /// Renders a single field as a member of the type `outer`.
    ///
    /// # Errors
    /// Returns `CodegenError` for unsupported fields.
    pub fn render_field(
        &mut self,
        field: Field<'_>,
        outer: &str,
    ) -> Result<String, CodegenError> {
        let ctx = RenderContext::new(OuterTypes::root(outer));
        walker::render_field(self, field, &ctx)
    }

    /// Renders each member in `members`. The union discriminant does not
    /// leak out of the member list.
    fn render_members(
        &mut self,
        members: Vec<(Field<'_>, u32)>,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let saved = self.discriminant.take();
        let result = self.render_member_list(members, ctx);
        self.discriminant = saved;
        result
    }

    fn render_member_list(
        &mut self,
        members: Vec<(Field<'_>, u32)>,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let mut output = String::new();
        for (field, position) in members {
            let mut member = ctx.member(position);
            if let Some(names) = walker::getter_names(field) {
                member = member.with_names(names);
            }
            output.push_str(&walker::render_field(self, field, &member)?);
        }
        Ok(output)
    }

    fn add_import(&mut self, type_name: &str) {
        self.imports.insert(type_name.to_string());
    }

    /// A call to another type's transcoding function needs both its native
    /// header and its generated unit.
    fn add_dependency(&mut self, type_name: &str) {
        self.imports.insert(type_name.to_string());
        self.foreign_imports.insert(type_name.to_string());
    }

    fn proto_type(&self, ctx: &RenderContext, local: &str) -> String {
        format!("{}::{}", self.options.proto_namespace, ctx.outer.qualify_proto(local))
    }

    fn native_type(&self, ctx: &RenderContext, local: &str) -> String {
        format!("{}::{}", self.options.native_namespace, ctx.outer.qualify_native(local))
    }
}

/// Native value of a field.
fn value(names: &Names, ctx: &RenderContext) -> String {
    if ctx.deref {
        format!("(*dfhack->{})", names.native)
    } else {
        format!("dfhack->{}", names.native)
    }
}

/// Address of the native value of a field.
fn address(names: &Names, ctx: &RenderContext) -> String {
    if ctx.deref {
        format!("dfhack->{}", names.native)
    } else {
        format!("&dfhack->{}", names.native)
    }
}

/// Returns the transcoding prototype of a type.
#[must_use]
pub fn prototype(options: &RenderOptions, type_name: &str) -> String {
    format!(
        "void describe_{}({}::{}* proto, {}::{}* dfhack);",
        type_name, options.proto_namespace, type_name, options.native_namespace, type_name
    )
}

impl FieldRenderer for CppRenderer<'_> {
    fn rules(&self) -> &ResolvedRules {
        self.rules
    }

    fn options(&self) -> &RenderOptions {
        self.options
    }

    fn resolve_names(&mut self, field: Field<'_>) -> Names {
        self.resolver.resolve(field)
    }

    fn render_simple(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let indent = ctx.indent();
        let scalar = field.subtype().and_then(ProtoScalar::from_native);
        let named = field
            .type_name()
            .filter(|t| ProtoScalar::from_native(t).is_none());
        let output = match (scalar, named) {
            (Some(ProtoScalar::Bytes), _) | (None, None) => format!(
                "{}proto->set_{}({}, sizeof({}));\n",
                indent,
                names.proto,
                address(names, ctx),
                value(names, ctx)
            ),
            (Some(_), _) => format!(
                "{}proto->set_{}({});\n",
                indent,
                names.proto,
                value(names, ctx)
            ),
            (None, Some(type_name)) => {
                self.add_dependency(type_name);
                format!(
                    "{}describe_{}(proto->mutable_{}(), {});\n",
                    indent,
                    type_name,
                    names.proto,
                    address(names, ctx)
                )
            }
        };
        Ok(output)
    }

    fn render_enum(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        self.enum_field(field, names, ctx)
    }

    fn render_bitfield(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        self.bitfield_field(field, names, ctx)
    }

    fn render_union(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        self.union_field(field, names, ctx)
    }

    fn render_compound(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        self.compound_field(field, names, ctx)
    }

    fn render_container(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        self.container_field(field, names, ctx)
    }

    fn render_pointer(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        self.pointer_field(field, names, ctx)
    }

    fn render_global(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let type_name = walker::referenced_type(field)?;
        self.add_dependency(type_name);
        Ok(format!(
            "{}describe_{}(proto->mutable_{}(), {});\n",
            ctx.indent(),
            type_name,
            names.proto,
            address(names, ctx)
        ))
    }

    fn render_conversion(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let export_as = field
            .export_as()
            .ok_or_else(|| CodegenError::missing_attr(field, "export-as"))?;
        self.foreign_imports.insert("conversion".to_string());
        Ok(format!(
            "{}convert_{}_to_{}({}, proto->mutable_{}());\n",
            ctx.indent(),
            type_name(field, &names.proto),
            export_as,
            address(names, ctx),
            names.proto
        ))
    }

    fn render_method(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        self.method_field(field, names, ctx)
    }
}
