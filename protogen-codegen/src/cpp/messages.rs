//! Struct bodies, local compounds, unions and getters.

use super::{CppRenderer, address};
use crate::context::{OuterTypes, RenderContext};
use crate::error::CodegenError;
use crate::names::{Names, typedef_name};
use crate::type_table::ProtoScalar;
use crate::walker::{self, FieldKind};
use protogen_schema::{Field, TypeDecl};

impl CppRenderer<'_> {
    /// Body of the transcoding function of a struct or class.
    pub(super) fn struct_body(
        &mut self,
        decl: TypeDecl<'_>,
        type_name: &str,
    ) -> Result<String, CodegenError> {
        let ctx = RenderContext::new(OuterTypes::root(type_name));
        let mut output = String::new();

        let mut first = 1;
        if let Some(parent) = decl.inherits_from() {
            self.foreign_imports.insert(parent.to_string());
            output.push_str(&format!(
                "{}describe_{}(proto->mutable_parent(), dfhack);\n",
                ctx.indent(),
                parent
            ));
            first = 2;
        }

        let members = walker::positioned(walker::members(decl).into_iter(), first);
        output.push_str(&self.render_members(members, &ctx)?);
        Ok(output)
    }

    /// Lambda `describe_<T>` copying the members of a local compound.
    pub(super) fn lambda(
        &mut self,
        field: Field<'_>,
        type_name: &str,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let indent = ctx.indent();
        let mut output = format!(
            "{}auto describe_{} = []({}* proto, {}* dfhack) {{\n",
            indent,
            type_name,
            self.proto_type(ctx, type_name),
            self.native_type(ctx, type_name)
        );
        let members = walker::positioned(field.fields(), 1);
        output.push_str(&self.render_members(members, &ctx.nested(type_name))?);
        output.push_str(&format!("{}}};\n", indent));
        Ok(output)
    }

    pub(super) fn compound_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let type_name = typedef_name(field, &names.proto);
        let mut output = self.lambda(field, &type_name, ctx)?;
        output.push_str(&format!(
            "{}describe_{}(proto->mutable_{}(), {});\n",
            ctx.indent(),
            type_name,
            names.proto,
            address(names, ctx)
        ));
        Ok(output)
    }

    /// Switches on the last enum field rendered before the union. Lambdas of
    /// compound arms are declared ahead of the switch.
    pub(super) fn union_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let Some(discriminant) = self.discriminant.clone() else {
            // keep synthetic names aligned with the schema side
            self.resolver.resolve_subtree(field);
            let message = format!(
                "failed to find a discriminator for union {}",
                typedef_name(field, &names.proto)
            );
            return Ok(walker::inert(ctx, &message));
        };

        let indent = ctx.indent();
        let case_indent = format!("{}  ", indent);
        let body_ctx = ctx.clone().with_depth(ctx.depth + 2);
        let mut lambdas = String::new();
        let mut cases = String::new();

        for (arm, position) in field.fields().zip(ctx.position..) {
            if self.rules.is_ignored(arm.id()) {
                continue;
            }
            let arm_names = self.resolver.resolve(arm);
            let storage = Names::new(
                arm_names.proto.clone(),
                format!("{}.{}", names.native, arm_names.native),
            );
            let arm_ctx = body_ctx.member(position).with_deref(ctx.deref);

            let local = walker::is_local_type(arm);
            let statement = match walker::classify(arm)? {
                FieldKind::Compound if local => {
                    let type_name = typedef_name(arm, &arm_names.proto);
                    lambdas.push_str(&self.lambda(arm, &type_name, ctx)?);
                    format!(
                        "{}describe_{}(proto->mutable_{}(), {});\n",
                        arm_ctx.indent(),
                        type_name,
                        storage.proto,
                        address(&storage, &arm_ctx)
                    )
                }
                FieldKind::Container | FieldKind::Union => {
                    let message = format!("ignored container arm {}", arm_names.proto);
                    walker::inert(&arm_ctx, &message)
                }
                _ => walker::render_field(self, arm, &arm_ctx.with_names(storage))?,
            };

            cases.push_str(&format!(
                "{}case {}{}:\n",
                case_indent, discriminant.prefix, arm_names.native
            ));
            cases.push_str(&statement);
            cases.push_str(&format!("{}  break;\n", case_indent));
        }
        self.discriminant = Some(discriminant.clone());

        let mut output = lambdas;
        output.push_str(&format!("{}switch (dfhack->{}) {{\n", indent, discriminant.native));
        output.push_str(&cases);
        output.push_str(&format!("{}default:\n", case_indent));
        output.push_str(&format!("{}  proto->clear_{}();\n", case_indent, names.proto));
        output.push_str(&format!("{}}}\n", indent));
        Ok(output)
    }

    /// Copies the result of a getter. Values of other types are kept in a
    /// local before being described.
    pub(super) fn method_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let indent = ctx.indent();
        let ret = field
            .ret_type()
            .ok_or_else(|| CodegenError::missing_attr(field, "ret-type"))?;
        if ProtoScalar::from_native(ret).is_some() {
            return Ok(format!(
                "{}proto->set_{}(dfhack->{}());\n",
                indent, names.proto, names.native
            ));
        }
        self.add_dependency(ret);
        let mut output = format!(
            "{}{}::{} df_{} = dfhack->{}();\n",
            indent, self.options.native_namespace, ret, names.proto, names.native
        );
        output.push_str(&format!(
            "{}describe_{}(proto->mutable_{}(), &df_{});\n",
            indent, ret, names.proto, names.proto
        ));
        Ok(output)
    }
}
