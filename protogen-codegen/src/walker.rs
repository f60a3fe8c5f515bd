//! Tree walker shared by the schema and transcoding renderers.
//!
//! [`classify`] maps a node onto the closed set of [`FieldKind`]s;
//! [`render_field`] applies ignore rules, resolves names and dispatches to
//! the matching [`FieldRenderer`] method. Pointer and container shapes are
//! resolved here once so that both renderers agree on them.

use crate::config::RenderOptions;
use crate::context::RenderContext;
use crate::error::CodegenError;
use crate::names::Names;
use crate::type_table::ProtoScalar;
use protogen_schema::{Field, MetaKind, ResolvedRules, TypeDecl};

/// Rendering path of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Primitive, number or opaque bytes.
    Simple,
    /// Local or referenced enumeration.
    Enum,
    /// Local or referenced bitfield.
    Bitfield,
    /// Union of arms selected by a discriminant.
    Union,
    /// Local compound.
    Compound,
    /// Container or static array.
    Container,
    Pointer,
    /// Reference to a global type.
    Global,
    /// Field converted to another IDL type (`export-as`).
    Conversion,
    /// Getter method of a class.
    Method,
}

/// Classifies a node.
///
/// # Errors
/// Returns `CodegenError::UnsupportedMeta` if the node declares a meta kind
/// outside the known set.
pub fn classify(field: Field<'_>) -> Result<FieldKind, CodegenError> {
    if field.export_as().is_some() {
        return Ok(FieldKind::Conversion);
    }
    if field.tag() == "vmethod" && field.meta().is_none() {
        return Ok(FieldKind::Method);
    }

    let meta = match field.meta() {
        None => MetaKind::Compound,
        Some(meta) => MetaKind::parse(meta).ok_or_else(|| CodegenError::unsupported_meta(field))?,
    };

    let kind = match meta {
        MetaKind::Compound => match field.subtype() {
            Some("enum") => FieldKind::Enum,
            Some("bitfield") => FieldKind::Bitfield,
            _ if field.is_union() => FieldKind::Union,
            _ => FieldKind::Compound,
        },
        MetaKind::Primitive | MetaKind::Number | MetaKind::Bytes => match field.subtype() {
            Some("enum") => FieldKind::Enum,
            Some("bitfield") => FieldKind::Bitfield,
            _ => FieldKind::Simple,
        },
        MetaKind::Global => match field.subtype() {
            Some("enum") => FieldKind::Enum,
            Some("bitfield") => FieldKind::Bitfield,
            _ => FieldKind::Global,
        },
        MetaKind::Container | MetaKind::StaticArray => FieldKind::Container,
        MetaKind::Pointer => FieldKind::Pointer,
    };
    Ok(kind)
}

/// Returns true if the field declares its own local type (enum items,
/// bitfield flags or members) rather than referencing a global one.
#[must_use]
pub fn is_local_type(field: Field<'_>) -> bool {
    matches!(field.meta_kind(), Some(MetaKind::Compound) | None)
}

/// Returns the referenced type name of a field.
///
/// # Errors
/// Returns `CodegenError::MissingAttribute` when `type-name` is absent.
pub fn referenced_type<'t>(field: Field<'t>) -> Result<&'t str, CodegenError> {
    field
        .type_name()
        .ok_or_else(|| CodegenError::missing_attr(field, "type-name"))
}

/// How a pointer (or each pointer of a container) is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerShape<'t> {
    /// Pointer to a primitive: dereferenced copy.
    Scalar(ProtoScalar),
    /// Pointee type has an index rule: read `field` off the pointee.
    Indexed {
        /// Pointee type.
        type_name: String,
        /// Identifier field.
        field: String,
    },
    /// Pointer to the type being rendered: read `id` off the pointee.
    SelfRef {
        /// Pointee type.
        type_name: String,
    },
    /// Pointee described by an item node: rendered as if transparent.
    Embedded(Field<'t>),
    /// Named pointee without structure inside a container: embedded by name.
    Named(String),
    /// Named pointee without structure: read `id` off the pointee.
    Reference(String),
    /// Nothing known about the pointee.
    Unknown,
}

/// Follows nested pointers down to the first node that is not a pointer.
#[must_use]
pub fn pointee(pointer: Field<'_>) -> Option<Field<'_>> {
    let mut node = pointer.item()?;
    while node.meta_kind() == Some(MetaKind::Pointer) {
        node = node.item()?;
    }
    Some(node)
}

/// A pointee node that only names a global type carries no structure of
/// its own.
fn is_bare_reference(node: Field<'_>) -> bool {
    node.meta_kind() == Some(MetaKind::Global)
        && !matches!(node.subtype(), Some("enum" | "bitfield"))
}

/// Resolves the shape of a pointer.
///
/// `target` is the declared pointee type, `pointee` the node below the
/// pointer, `self_type` the top-level type being rendered.
#[must_use]
pub fn pointer_shape<'t>(
    target: Option<&'t str>,
    pointee: Option<Field<'t>>,
    in_container: bool,
    rules: &ResolvedRules,
    self_type: Option<&str>,
) -> PointerShape<'t> {
    if let Some(scalar) = target.and_then(ProtoScalar::from_native) {
        return PointerShape::Scalar(scalar);
    }
    let simple_pointee = pointee
        .filter(|p| p.meta_kind().is_some_and(MetaKind::is_simple))
        .and_then(|p| p.subtype())
        .and_then(ProtoScalar::from_native);
    if let (None, Some(scalar)) = (target, simple_pointee) {
        return PointerShape::Scalar(scalar);
    }

    let target = target.or_else(|| {
        pointee
            .filter(|p| is_bare_reference(*p))
            .and_then(|p| p.type_name())
    });

    if let Some(t) = target {
        if let Some(field) = rules.index_field(t) {
            return PointerShape::Indexed {
                type_name: t.to_string(),
                field: field.to_string(),
            };
        }
        if self_type == Some(t) {
            return PointerShape::SelfRef {
                type_name: t.to_string(),
            };
        }
    }

    match (pointee.filter(|p| !is_bare_reference(*p)), target) {
        (Some(p), _) => PointerShape::Embedded(p),
        (None, Some(t)) if in_container => PointerShape::Named(t.to_string()),
        (None, Some(t)) => PointerShape::Reference(t.to_string()),
        (None, None) => PointerShape::Unknown,
    }
}

/// Resolves the shape of a pointer field outside a container.
#[must_use]
pub fn single_pointer_shape<'t>(
    field: Field<'t>,
    rules: &ResolvedRules,
    self_type: Option<&str>,
) -> PointerShape<'t> {
    pointer_shape(field.type_name(), pointee(field), false, rules, self_type)
}

/// How a container is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerShape<'t> {
    /// No item node: nothing to loop over.
    Empty,
    /// Unsupported container flavor, with its marker label.
    Ignored(&'static str),
    /// Intrusive linked list: a single field of the list type.
    LinkedList(&'t str),
    /// Container of containers.
    Nested,
    /// Container of pointers.
    Pointers(PointerShape<'t>),
    /// Plain element described by the item node.
    Items(Field<'t>),
}

/// Resolves the shape of a container.
///
/// # Errors
/// Returns `CodegenError::MissingAttribute` for a linked list without type.
pub fn container_shape<'t>(
    field: Field<'t>,
    rules: &ResolvedRules,
    self_type: Option<&str>,
) -> Result<ContainerShape<'t>, CodegenError> {
    match field.subtype() {
        Some("df-linked-list") => return Ok(ContainerShape::LinkedList(referenced_type(field)?)),
        Some("df-flagarray") => return Ok(ContainerShape::Ignored("flagarray")),
        Some("stl-bit-vector") => return Ok(ContainerShape::Ignored("stl-bit-vector")),
        _ => {}
    }

    let Some(item) = field.item() else {
        return Ok(ContainerShape::Empty);
    };
    if item.meta_kind().is_some_and(MetaKind::is_container) {
        return Ok(ContainerShape::Nested);
    }

    let item_is_pointer = item.meta_kind() == Some(MetaKind::Pointer);
    if field.pointer_type().is_some() || item_is_pointer {
        let target = field.pointer_type().or_else(|| item.type_name());
        let inner = if item_is_pointer { pointee(item) } else { None };
        if inner.is_some_and(|p| p.meta_kind().is_some_and(MetaKind::is_container)) {
            return Ok(ContainerShape::Nested);
        }
        if inner.is_some_and(|p| p.is_union()) {
            return Ok(ContainerShape::Ignored("union"));
        }
        return Ok(ContainerShape::Pointers(pointer_shape(
            target, inner, true, rules, self_type,
        )));
    }

    if item.is_union() {
        return Ok(ContainerShape::Ignored("union"));
    }
    Ok(ContainerShape::Items(item))
}

/// Returns true for a class method rendered as a field: a `get...` method
/// with a return type.
#[must_use]
pub fn is_getter(method: Field<'_>) -> bool {
    method.ret_type().is_some()
        && method
            .name()
            .and_then(|n| n.strip_prefix("get"))
            .is_some_and(|rest| !rest.is_empty())
}

/// Names of a getter: the method name without `get`, lowercased, and the
/// method name itself.
#[must_use]
pub fn getter_names(method: Field<'_>) -> Option<Names> {
    if method.tag() != "vmethod" {
        return None;
    }
    let native = method.name()?;
    let proto = native.strip_prefix("get")?.to_lowercase();
    Some(Names::new(proto, native))
}

/// Members of a top-level type: data fields followed by getters.
#[must_use]
pub fn members(decl: TypeDecl<'_>) -> Vec<Field<'_>> {
    decl.fields()
        .chain(decl.methods().filter(|m| is_getter(*m)))
        .collect()
}

/// Pairs each member with its ordinal position. A union occupies one
/// position per arm.
#[must_use]
pub fn positioned<'t>(fields: impl Iterator<Item = Field<'t>>, start: u32) -> Vec<(Field<'t>, u32)> {
    let mut position = start;
    let mut out = Vec::new();
    for field in fields {
        out.push((field, position));
        let width = if field.is_union() {
            field.field_count().max(1)
        } else {
            1
        };
        position += u32::try_from(width).unwrap_or(u32::MAX);
    }
    out
}

/// Returns a visible marker line for an unsupported shape.
#[must_use]
pub fn inert(ctx: &RenderContext, message: &str) -> String {
    tracing::warn!(marker = message, "unsupported shape left as a comment");
    format!("{}/* {} */\n", ctx.indent(), message)
}

/// Per-kind rendering operations.
pub trait FieldRenderer {
    /// Resolved exception rules.
    fn rules(&self) -> &ResolvedRules;

    /// Render options.
    fn options(&self) -> &RenderOptions;

    /// Resolves the names of a field through the renderer's resolver.
    fn resolve_names(&mut self, field: Field<'_>) -> Names;

    /// Renders a suppressed field: nothing, or a comment when configured.
    fn render_ignored(&mut self, field: Field<'_>, ctx: &RenderContext) -> String {
        if self.options().comment_ignored {
            format!(
                "{}/* ignored field {} */\n",
                ctx.indent(),
                field.name().unwrap_or("anon")
            )
        } else {
            String::new()
        }
    }

    fn render_simple(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError>;

    fn render_enum(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError>;

    fn render_bitfield(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError>;

    fn render_union(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError>;

    fn render_compound(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError>;

    fn render_container(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError>;

    fn render_pointer(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError>;

    fn render_global(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError>;

    fn render_conversion(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError>;

    fn render_method(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError>;
}

/// Renders one field through `renderer`.
///
/// # Errors
/// Returns `CodegenError` for unsupported meta kinds and missing attributes.
pub fn render_field<R: FieldRenderer + ?Sized>(
    renderer: &mut R,
    field: Field<'_>,
    ctx: &RenderContext,
) -> Result<String, CodegenError> {
    if renderer.rules().is_ignored(field.id()) {
        tracing::trace!(name = field.name().unwrap_or("anon"), "field ignored");
        return Ok(renderer.render_ignored(field, ctx));
    }

    let kind = classify(field)?;
    let names = match &ctx.names {
        Some(names) => names.clone(),
        None => renderer.resolve_names(field),
    };
    tracing::trace!(?kind, name = %names.proto, position = ctx.position, "render field");

    match kind {
        FieldKind::Simple => renderer.render_simple(field, &names, ctx),
        FieldKind::Enum => renderer.render_enum(field, &names, ctx),
        FieldKind::Bitfield => renderer.render_bitfield(field, &names, ctx),
        FieldKind::Union => renderer.render_union(field, &names, ctx),
        FieldKind::Compound => renderer.render_compound(field, &names, ctx),
        FieldKind::Container => renderer.render_container(field, &names, ctx),
        FieldKind::Pointer => renderer.render_pointer(field, &names, ctx),
        FieldKind::Global => renderer.render_global(field, &names, ctx),
        FieldKind::Conversion => renderer.render_conversion(field, &names, ctx),
        FieldKind::Method => renderer.render_method(field, &names, ctx),
    }
}
