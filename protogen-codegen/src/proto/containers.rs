//! Containers and pointers.

use super::{ProtoRenderer, type_comment};
use crate::context::{Qualifier, RenderContext};
use crate::error::CodegenError;
use crate::names::Names;
use crate::walker::{self, ContainerShape, PointerShape};
use protogen_schema::Field;

impl ProtoRenderer<'_> {
    pub(super) fn container_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let shape = walker::container_shape(field, self.rules, self.self_type.as_deref())?;
        match shape {
            ContainerShape::Empty => Ok(walker::inert(
                ctx,
                &format!("ignored empty container {}", names.proto),
            )),
            ContainerShape::Ignored(label) => Ok(walker::inert(
                ctx,
                &format!("ignored {} container {}", label, names.proto),
            )),
            ContainerShape::Nested => Ok(walker::inert(
                ctx,
                &format!("ignored container of containers {}", names.proto),
            )),
            ContainerShape::LinkedList(type_name) => {
                self.add_import(type_name);
                Ok(self.field_line(ctx, ctx.qualifier, type_name, &names.proto, field.comment()))
            }
            ContainerShape::Pointers(pointer) => {
                self.repeated_pointer(field, pointer, names, ctx)
            }
            ContainerShape::Items(item) => {
                let item_ctx = ctx
                    .clone()
                    .with_names(names.clone())
                    .with_qualifier(Qualifier::Repeated)
                    .with_deref(false);
                let mut output = type_comment(ctx, field.comment());
                output.push_str(&walker::render_field(self, item, &item_ctx)?);
                Ok(output)
            }
        }
    }

    fn repeated_pointer(
        &mut self,
        field: Field<'_>,
        pointer: PointerShape<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let repeated = Qualifier::Repeated;
        let comment = field.comment();
        let output = match pointer {
            PointerShape::Scalar(scalar) => {
                self.field_line(ctx, repeated, scalar.proto_name(), &names.proto, comment)
            }
            PointerShape::Indexed { field: id, .. } => {
                let name = names.with_suffix(&id).proto;
                self.field_line(ctx, repeated, "int32", &name, comment)
            }
            PointerShape::SelfRef { .. } => {
                let name = names.with_suffix("ref").proto;
                self.field_line(ctx, repeated, "int32", &name, comment)
            }
            PointerShape::Named(type_name) | PointerShape::Reference(type_name) => {
                self.add_import(&type_name);
                self.field_line(ctx, repeated, &type_name, &names.proto, comment)
            }
            PointerShape::Embedded(pointee) => {
                let pointee_ctx = ctx
                    .clone()
                    .with_names(names.clone())
                    .with_qualifier(repeated)
                    .with_deref(true);
                let mut output = type_comment(ctx, comment);
                output.push_str(&walker::render_field(self, pointee, &pointee_ctx)?);
                output
            }
            PointerShape::Unknown => walker::inert(ctx, "ignored pointer to unknown type"),
        };
        Ok(output)
    }

    /// Pointers may be null: the field is never required.
    pub(super) fn pointer_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let qualifier = ctx.qualifier.nullable();
        let comment = field.comment();
        let shape = walker::single_pointer_shape(field, self.rules, self.self_type.as_deref());
        let output = match shape {
            PointerShape::Scalar(scalar) => {
                self.field_line(ctx, qualifier, scalar.proto_name(), &names.proto, comment)
            }
            PointerShape::Indexed { field: id, .. } => {
                let name = names.with_suffix(&id).proto;
                self.field_line(ctx, qualifier, "int32", &name, comment)
            }
            PointerShape::SelfRef { .. } | PointerShape::Reference(_) => {
                let name = names.with_suffix("ref").proto;
                self.field_line(ctx, qualifier, "int32", &name, comment)
            }
            PointerShape::Named(type_name) => {
                self.add_import(&type_name);
                self.field_line(ctx, qualifier, &type_name, &names.proto, comment)
            }
            PointerShape::Embedded(pointee) => {
                let pointee_ctx = ctx
                    .clone()
                    .with_names(names.clone())
                    .with_qualifier(qualifier)
                    .with_deref(true);
                walker::render_field(self, pointee, &pointee_ctx)?
            }
            PointerShape::Unknown => walker::inert(ctx, "ignored pointer to unknown type"),
        };
        Ok(output)
    }
}
