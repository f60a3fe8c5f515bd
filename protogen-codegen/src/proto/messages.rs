//! Message declarations: structs, local compounds and unions.

use super::{ProtoRenderer, type_comment};
use crate::context::{OuterTypes, Qualifier, RenderContext};
use crate::error::CodegenError;
use crate::names::{Names, typedef_name};
use crate::walker::{self, FieldKind, FieldRenderer};
use protogen_schema::{Field, TypeDecl};

impl ProtoRenderer<'_> {
    /// Renders the message of a struct or class type.
    pub(super) fn struct_decl(
        &mut self,
        decl: TypeDecl<'_>,
        type_name: &str,
    ) -> Result<String, CodegenError> {
        let ctx = RenderContext::new(OuterTypes::root(type_name));
        let mut output = format!("message {} {{\n", type_name);

        let mut first = 1;
        if let Some(parent) = decl.inherits_from() {
            self.add_import(parent);
            output.push_str(&self.field_line(
                &ctx.member(1),
                Qualifier::Required,
                parent,
                "parent",
                Some("parent type"),
            ));
            first = 2;
        }

        let members = walker::positioned(walker::members(decl).into_iter(), first);
        output.push_str(&self.render_members(members, &ctx)?);
        output.push_str("}\n");
        Ok(output)
    }

    /// Nested `message T { ... }` of a local compound.
    fn compound_decl(
        &mut self,
        field: Field<'_>,
        type_name: &str,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let indent = ctx.indent();
        let mut output = type_comment(ctx, field.comment());
        output.push_str(&format!("{}message {} {{\n", indent, type_name));
        let members = walker::positioned(field.fields(), 1);
        output.push_str(&self.render_members(members, &ctx.nested(type_name))?);
        output.push_str(&format!("{}}}\n", indent));
        Ok(output)
    }

    pub(super) fn compound_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let type_name = typedef_name(field, &names.proto);
        let mut output = self.compound_decl(field, &type_name, ctx)?;
        output.push_str(&self.field_line(ctx, ctx.qualifier, &type_name, &names.proto, None));
        Ok(output)
    }

    /// Renders a union as a `oneof`. Arms declaring their own type get a
    /// nested declaration ahead of the block.
    pub(super) fn union_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let indent = ctx.indent();
        let mut predecl = String::new();
        let mut arms = String::new();

        for (arm, position) in field.fields().zip(ctx.position..) {
            let arm_ctx = ctx
                .member(position)
                .with_depth(ctx.depth + 1)
                .with_qualifier(Qualifier::Bare);
            if self.rules.is_ignored(arm.id()) {
                arms.push_str(&self.render_ignored(arm, &arm_ctx));
                continue;
            }

            let arm_names = self.resolver.resolve(arm);
            let local = walker::is_local_type(arm);
            let kind = walker::classify(arm)?;
            match kind {
                FieldKind::Compound | FieldKind::Enum | FieldKind::Bitfield if local => {
                    let type_name = typedef_name(arm, &arm_names.proto);
                    let decl = match kind {
                        FieldKind::Enum => self.local_enum_decl(arm, &type_name, &arm_names, ctx)?,
                        FieldKind::Bitfield => self.local_bitfield_decl(arm, &type_name, ctx),
                        _ => self.compound_decl(arm, &type_name, ctx)?,
                    };
                    predecl.push_str(&decl);
                    arms.push_str(&self.field_line(
                        &arm_ctx,
                        Qualifier::Bare,
                        &type_name,
                        &arm_names.proto,
                        None,
                    ));
                }
                FieldKind::Container | FieldKind::Union => {
                    let message = format!("ignored container arm {}", arm_names.proto);
                    arms.push_str(&walker::inert(&arm_ctx, &message));
                }
                _ => {
                    let arm_ctx = arm_ctx.with_names(arm_names);
                    arms.push_str(&walker::render_field(self, arm, &arm_ctx)?);
                }
            }
        }

        let mut output = predecl;
        output.push_str(&format!("{}oneof {} {{\n", indent, names.proto));
        output.push_str(&arms);
        output.push_str(&format!("{}}}\n", indent));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RenderOptions;
    use crate::proto::ProtoRenderer;
    use protogen_schema::{ExceptionStore, parse_tree};

    fn squash(s: &str) -> String {
        s.split_whitespace().collect()
    }

    #[test]
    fn test_struct_with_inheritance() {
        let xml = r#"<ld:data-definition xmlns:ld="ns">
          <ld:global-type ld:meta="class-type" type-name="adventure_item" inherits-from="adventure_item_interact_choicest">
            <ld:field ld:meta="pointer" type-name="item">
              <ld:item ld:meta="global" type-name="item"/>
            </ld:field>
          </ld:global-type></ld:data-definition>"#;
        let tree = parse_tree(xml).expect("Failed to parse");
        let rules = ExceptionStore::new().resolve(&tree, false);
        let options = RenderOptions::default();
        let mut renderer = ProtoRenderer::new(&rules, &options);
        let out = renderer
            .render_type(tree.types().next().expect("type"))
            .expect("Failed to render");
        assert_eq!(
            squash(&out),
            squash(
                "message adventure_item {
                   required adventure_item_interact_choicest parent = 1; /* parent type */
                   optional int32 anon_1_ref = 2;
                 }"
            )
        );
        let imports: Vec<&str> = renderer.imports().iter().map(String::as_str).collect();
        assert_eq!(imports, vec!["adventure_item_interact_choicest"]);
    }

    #[test]
    fn test_union_with_compound_arm() {
        let xml = r#"<ld:data-definition xmlns:ld="ns">
          <ld:global-type ld:meta="struct-type" type-name="t">
            <ld:field name="data" is-union="true" ld:meta="compound">
              <ld:field name="count" ld:meta="number" ld:subtype="int16_t"/>
              <ld:field name="pos" ld:meta="compound">
                <ld:field name="x" ld:meta="number" ld:subtype="int16_t"/>
              </ld:field>
            </ld:field>
            <ld:field name="after" ld:meta="number" ld:subtype="int32_t"/>
          </ld:global-type></ld:data-definition>"#;
        let tree = parse_tree(xml).expect("Failed to parse");
        let rules = ExceptionStore::new().resolve(&tree, false);
        let options = RenderOptions::default();
        let out = ProtoRenderer::new(&rules, &options)
            .render_type(tree.types().next().expect("type"))
            .expect("Failed to render");
        assert_eq!(
            squash(&out),
            squash(
                "message t {
                   message T_pos {
                     required int32 x = 1;
                   }
                   oneof data {
                     int32 count = 1;
                     T_pos pos = 2;
                   }
                   required int32 after = 3;
                 }"
            )
        );
    }

    #[test]
    fn test_class_getters_follow_fields() {
        let xml = r#"<ld:data-definition xmlns:ld="ns">
          <ld:global-type ld:meta="class-type" type-name="item" comment="any item">
            <ld:field name="id" ld:meta="number" ld:subtype="int32_t"/>
            <virtual-methods>
              <vmethod name="getType" ret-type="item_type"/>
              <vmethod name="getWear" ret-type="int16_t"/>
              <vmethod name="isTemple"/>
            </virtual-methods>
          </ld:global-type></ld:data-definition>"#;
        let tree = parse_tree(xml).expect("Failed to parse");
        let rules = ExceptionStore::new().resolve(&tree, false);
        let options = RenderOptions::default();
        let mut renderer = ProtoRenderer::new(&rules, &options);
        let out = renderer
            .render_type(tree.types().next().expect("type"))
            .expect("Failed to render");
        assert_eq!(
            squash(&out),
            squash(
                "/* any item */
                 message item {
                   required int32 id = 1;
                   required item_type type = 2;
                   required int32 wear = 3;
                 }"
            )
        );
        assert!(renderer.imports().contains("item_type"));
    }
}
