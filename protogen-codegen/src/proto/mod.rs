//! Schema-side (IDL) renderer.
//!
//! Emits `message`, `enum` and `oneof` declarations for one top-level type
//! and collects the names of the other types the declaration depends on.

mod containers;
mod enums;
mod messages;

use std::collections::BTreeSet;

use crate::config::RenderOptions;
use crate::context::{OuterTypes, Qualifier, RenderContext};
use crate::error::CodegenError;
use crate::names::{NameResolver, Names};
use crate::type_table::ProtoScalar;
use crate::walker::{self, FieldRenderer};
use protogen_schema::{Field, ResolvedRules, TypeDecl, TypeMeta};

/// Renderer for the IDL side of one type.
///
/// A renderer holds the anonymous-name counter and the import set of a
/// single render call: create a fresh one per top-level type.
pub struct ProtoRenderer<'r> {
    rules: &'r ResolvedRules,
    options: &'r RenderOptions,
    resolver: NameResolver<'r>,
    imports: BTreeSet<String>,
    self_type: Option<String>,
}

impl<'r> ProtoRenderer<'r> {
    /// Creates a renderer.
    #[must_use]
    pub fn new(rules: &'r ResolvedRules, options: &'r RenderOptions) -> Self {
        Self {
            rules,
            options,
            resolver: NameResolver::new(rules),
            imports: BTreeSet::new(),
            self_type: None,
        }
    }

    /// Sets the name of the enclosing top-level type, used to detect
    /// self references when a field is rendered on its own.
    #[must_use]
    pub fn with_self_type(mut self, type_name: impl Into<String>) -> Self {
        self.self_type = Some(type_name.into());
        self
    }

    /// Types referenced by what was rendered so far.
    #[must_use]
    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    /// Consumes the renderer and returns its import set.
    #[must_use]
    pub fn into_imports(self) -> BTreeSet<String> {
        self.imports
    }

    /// Renders the declaration of a top-level type.
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

        match meta {
            TypeMeta::Enum => {
                let prefix = format!("{}_", type_name);
                output.push_str(&self.enum_decl(decl.enum_items(), type_name, &prefix, "")?);
            }
            TypeMeta::Bitfield => {
                output.push_str(&self.bitfield_decl(decl.as_field(), type_name, ""));
            }
            TypeMeta::Struct | TypeMeta::Class => {
                output.push_str(&self.struct_decl(decl, type_name)?);
            }
        }
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

    /// Renders each member in `members` at its position.
    fn render_members(
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

    /// Maps a native type token, importing it when it names another type.
    /// Unknown shapes are kept as opaque bytes.
    fn convert_type(&mut self, primitive: Option<&str>, named: Option<&str>) -> String {
        if let Some(scalar) = primitive.and_then(ProtoScalar::from_native) {
            return scalar.proto_name().to_string();
        }
        match named {
            Some(name) => match ProtoScalar::from_native(name) {
                Some(scalar) => scalar.proto_name().to_string(),
                None => {
                    self.add_import(name);
                    name.to_string()
                }
            },
            None => ProtoScalar::Bytes.proto_name().to_string(),
        }
    }

    /// `required T name = n; /* comment */`
    fn field_line(
        &self,
        ctx: &RenderContext,
        qualifier: Qualifier,
        type_name: &str,
        name: &str,
        comment: Option<&str>,
    ) -> String {
        let mut line = ctx.indent();
        let keyword = qualifier.keyword(self.options.version);
        if !keyword.is_empty() {
            line.push_str(keyword);
            line.push(' ');
        }
        line.push_str(&format!("{} {} = {};", type_name, name, ctx.position));
        if let Some(comment) = comment {
            line.push_str(&format!(" /* {} */", comment));
        }
        line.push('\n');
        line
    }
}

/// Leading comment line of a declaration.
fn type_comment(ctx: &RenderContext, comment: Option<&str>) -> String {
    comment.map_or_else(String::new, |c| format!("{}/* {} */\n", ctx.indent(), c))
}

impl FieldRenderer for ProtoRenderer<'_> {
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
        let type_name = self.convert_type(field.subtype(), field.type_name());
        Ok(self.field_line(ctx, ctx.qualifier, &type_name, &names.proto, field.comment()))
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
        self.add_import(type_name);
        Ok(self.field_line(ctx, ctx.qualifier, type_name, &names.proto, field.comment()))
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
        Ok(self.field_line(ctx, ctx.qualifier, export_as, &names.proto, field.comment()))
    }

    fn render_method(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let ret = field
            .ret_type()
            .ok_or_else(|| CodegenError::missing_attr(field, "ret-type"))?;
        let type_name = self.convert_type(None, Some(ret));
        Ok(self.field_line(ctx, ctx.qualifier, &type_name, &names.proto, field.comment()))
    }
}
