//! Container loops and pointer copies.

use super::{CppRenderer, address, value};
use crate::context::RenderContext;
use crate::error::CodegenError;
use crate::names::{Names, type_name, typedef_name};
use crate::type_table::ProtoScalar;
use crate::walker::{self, ContainerShape, FieldKind, FieldRenderer, PointerShape};
use protogen_schema::Field;

/// Copy of one container element.
enum Element {
    /// Statement run for element `i`, with declarations hoisted before the
    /// loop.
    Statement { hoisted: String, body: String },
    /// Marker replacing the whole loop.
    Inert(String),
}

impl Element {
    fn statement(body: String) -> Self {
        Self::Statement {
            hoisted: String::new(),
            body,
        }
    }
}

impl CppRenderer<'_> {
    pub(super) fn container_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let shape = walker::container_shape(field, self.rules, self.self_type.as_deref())?;
        let body_ctx = ctx.clone().with_depth(ctx.depth + 1);
        let element = if ctx.deref {
            format!("(*dfhack->{})[i]", names.native)
        } else {
            format!("dfhack->{}[i]", names.native)
        };

        let copy = match shape {
            ContainerShape::Empty => Element::Inert(format!(
                "ignored empty container {}",
                names.proto
            )),
            ContainerShape::Ignored(label) => Element::Inert(format!(
                "ignored {} container {}",
                label, names.proto
            )),
            ContainerShape::Nested => Element::Inert(format!(
                "ignored container of containers {}",
                names.proto
            )),
            ContainerShape::LinkedList(list) => {
                self.add_dependency(list);
                return Ok(format!(
                    "{}describe_{}(proto->mutable_{}(), {});\n",
                    ctx.indent(),
                    list,
                    names.proto,
                    address(names, ctx)
                ));
            }
            ContainerShape::Pointers(pointer) => {
                self.pointer_element(pointer, names, &body_ctx, &element)?
            }
            ContainerShape::Items(item) => {
                if self.rules.is_ignored(item.id()) {
                    return Ok(self.render_ignored(item, ctx));
                }
                self.item_element(item, names, &body_ctx, &element)?
            }
        };

        match copy {
            Element::Inert(message) => Ok(walker::inert(ctx, &message)),
            Element::Statement { hoisted, body } => {
                let count = match field.count() {
                    Some(count) => count.to_string(),
                    None if ctx.deref => format!("dfhack->{}->size()", names.native),
                    None => format!("dfhack->{}.size()", names.native),
                };
                let indent = ctx.indent();
                let mut output = hoisted;
                output.push_str(&format!(
                    "{}for (size_t i=0; i<{}; i++) {{\n",
                    indent, count
                ));
                output.push_str(&body);
                output.push_str(&format!("{}}}\n", indent));
                Ok(output)
            }
        }
    }

    /// Copies one element held by value.
    fn item_element(
        &mut self,
        item: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
        element: &str,
    ) -> Result<Element, CodegenError> {
        let indent = ctx.indent();
        let p = &names.proto;
        let copy = match walker::classify(item)? {
            FieldKind::Simple => {
                let scalar = item.subtype().and_then(ProtoScalar::from_native);
                let named = item
                    .type_name()
                    .filter(|t| ProtoScalar::from_native(t).is_none());
                match (scalar, named) {
                    (Some(ProtoScalar::Bytes), _) | (None, None) => Element::statement(format!(
                        "{}proto->add_{}(&{}, sizeof({}));\n",
                        indent, p, element, element
                    )),
                    (Some(_), _) => Element::statement(format!(
                        "{}proto->add_{}({});\n",
                        indent, p, element
                    )),
                    (None, Some(t)) => {
                        self.add_dependency(t);
                        Element::statement(format!(
                            "{}describe_{}(proto->add_{}(), &{});\n",
                            indent, t, p, element
                        ))
                    }
                }
            }
            FieldKind::Enum => {
                let (cast, _) = self.enum_types(item, names, ctx)?;
                Element::statement(format!(
                    "{}proto->add_{}(static_cast<{}>({}));\n",
                    indent, p, cast, element
                ))
            }
            FieldKind::Bitfield => {
                if !walker::is_local_type(item) {
                    let t = walker::referenced_type(item)?;
                    self.add_import(t);
                }
                Element::statement(format!(
                    "{}proto->add_{}()->set_flags({}.whole);\n",
                    indent, p, element
                ))
            }
            FieldKind::Global => {
                let t = walker::referenced_type(item)?;
                if self.rules.is_enum(t) || t.ends_with("_type") {
                    self.add_import(t);
                    Element::statement(format!(
                        "{}proto->add_{}(static_cast<{}::{}>({}));\n",
                        indent, p, self.options.proto_namespace, t, element
                    ))
                } else {
                    self.add_dependency(t);
                    Element::statement(format!(
                        "{}describe_{}(proto->add_{}(), &{});\n",
                        indent, t, p, element
                    ))
                }
            }
            FieldKind::Compound => {
                let local = typedef_name(item, p);
                let outer = ctx.clone().with_depth(ctx.depth.saturating_sub(1));
                let hoisted = self.lambda(item, &local, &outer)?;
                Element::Statement {
                    hoisted,
                    body: format!(
                        "{}describe_{}(proto->add_{}(), &{});\n",
                        indent, local, p, element
                    ),
                }
            }
            FieldKind::Conversion => {
                let export_as = item
                    .export_as()
                    .ok_or_else(|| CodegenError::missing_attr(item, "export-as"))?;
                self.foreign_imports.insert("conversion".to_string());
                Element::statement(format!(
                    "{}convert_{}_to_{}(&{}, proto->add_{}());\n",
                    indent,
                    type_name(item, p),
                    export_as,
                    element,
                    p
                ))
            }
            FieldKind::Union => Element::Inert(format!("ignored union container {}", p)),
            FieldKind::Container => {
                Element::Inert(format!("ignored container of containers {}", p))
            }
            FieldKind::Pointer | FieldKind::Method => {
                Element::Inert(format!("ignored container {}", p))
            }
        };
        Ok(copy)
    }

    /// Copies one element held through a pointer; null elements are skipped.
    fn pointer_element(
        &mut self,
        pointer: PointerShape<'_>,
        names: &Names,
        ctx: &RenderContext,
        element: &str,
    ) -> Result<Element, CodegenError> {
        let indent = ctx.indent();
        let p = &names.proto;
        let guard = format!("if ({} != NULL) ", element);
        let copy = match pointer {
            PointerShape::Scalar(_) => Element::statement(format!(
                "{}{}proto->add_{}(*{});\n",
                indent, guard, p, element
            )),
            PointerShape::Indexed {
                type_name: t,
                field: id,
            } => {
                self.add_import(&t);
                Element::statement(format!(
                    "{}{}proto->add_{}_{}({}->{});\n",
                    indent, guard, p, id, element, id
                ))
            }
            PointerShape::SelfRef { type_name: t } => {
                self.add_import(&t);
                Element::statement(format!(
                    "{}{}proto->add_{}_ref({}->id);\n",
                    indent, guard, p, element
                ))
            }
            PointerShape::Named(t) | PointerShape::Reference(t) => {
                self.add_dependency(&t);
                Element::statement(format!(
                    "{}{}describe_{}(proto->add_{}(), {});\n",
                    indent, guard, t, p, element
                ))
            }
            PointerShape::Embedded(pointee) => {
                let deref = format!("(*{})", element);
                match self.item_element(pointee, names, ctx, &deref)? {
                    Element::Statement { hoisted, body } => Element::Statement {
                        hoisted,
                        body: format!("{}{}{}", indent, guard, body.trim_start()),
                    },
                    inert => inert,
                }
            }
            PointerShape::Unknown => Element::Inert("ignored pointer to unknown type".to_string()),
        };
        Ok(copy)
    }

    /// Copies a single pointer; the copy is skipped when it is null.
    pub(super) fn pointer_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let indent = ctx.indent();
        let pointer = value(names, ctx);
        let guard = format!("if ({} != NULL) ", pointer);
        let p = &names.proto;
        let shape = walker::single_pointer_shape(field, self.rules, self.self_type.as_deref());
        let output = match shape {
            PointerShape::Scalar(_) => {
                format!("{}{}proto->set_{}(*{});\n", indent, guard, p, pointer)
            }
            PointerShape::Indexed {
                type_name: t,
                field: id,
            } => {
                self.add_import(&t);
                format!(
                    "{}{}proto->set_{}_{}({}->{});\n",
                    indent, guard, p, id, pointer, id
                )
            }
            PointerShape::SelfRef { type_name: t } | PointerShape::Reference(t) => {
                self.add_import(&t);
                format!("{}{}proto->set_{}_ref({}->id);\n", indent, guard, p, pointer)
            }
            PointerShape::Named(t) => {
                self.add_dependency(&t);
                format!(
                    "{}{}describe_{}(proto->mutable_{}(), {});\n",
                    indent, guard, t, p, pointer
                )
            }
            PointerShape::Embedded(pointee) => {
                let inner = ctx
                    .clone()
                    .with_names(names.clone())
                    .with_deref(true)
                    .with_depth(ctx.depth + 1);
                let mut output = format!("{}if ({} != NULL) {{\n", indent, pointer);
                output.push_str(&walker::render_field(self, pointee, &inner)?);
                output.push_str(&format!("{}}}\n", indent));
                output
            }
            PointerShape::Unknown => walker::inert(ctx, "ignored pointer to unknown type"),
        };
        Ok(output)
    }
}
