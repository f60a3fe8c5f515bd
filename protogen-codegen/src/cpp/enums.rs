//! Enum and bitfield copies.

use super::{CppRenderer, Discriminant, value};
use crate::context::RenderContext;
use crate::error::CodegenError;
use crate::names::{Names, typedef_name};
use crate::walker;
use protogen_schema::Field;

impl CppRenderer<'_> {
    /// Generated enum type of an enum field, and the native qualifier of its
    /// constants.
    pub(super) fn enum_types(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<(String, String), CodegenError> {
        if walker::is_local_type(field) {
            let local = typedef_name(field, &names.proto);
            let prefix = format!("::{}::", self.native_type(ctx, &local));
            return Ok((self.proto_type(ctx, &local), prefix));
        }
        let type_name = walker::referenced_type(field)?;
        self.add_import(type_name);
        Ok((
            format!("{}::{}", self.options.proto_namespace, type_name),
            format!("::{}::enums::{}::", self.options.native_namespace, type_name),
        ))
    }

    /// Copies an enum value. The field becomes the discriminant of any
    /// union that follows it.
    pub(super) fn enum_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let (cast, prefix) = self.enum_types(field, names, ctx)?;
        self.discriminant = Some(Discriminant {
            native: names.native.clone(),
            prefix,
        });
        Ok(format!(
            "{}proto->set_{}(static_cast<{}>({}));\n",
            ctx.indent(),
            names.proto,
            cast,
            value(names, ctx)
        ))
    }

    pub(super) fn bitfield_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        if !walker::is_local_type(field) {
            let type_name = walker::referenced_type(field)?;
            self.add_import(type_name);
        }
        Ok(format!(
            "{}proto->mutable_{}()->set_flags({}.whole);\n",
            ctx.indent(),
            names.proto,
            value(names, ctx)
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RenderOptions;
    use crate::cpp::CppRenderer;
    use protogen_schema::{ExceptionStore, Field, parse_tree};

    fn squash(s: &str) -> String {
        s.split_whitespace().collect()
    }

    fn render(field: &str) -> (String, Vec<String>) {
        let xml = format!(r#"<ld:data-definition xmlns:ld="ns">{field}</ld:data-definition>"#);
        let tree = parse_tree(&xml).expect("Failed to parse");
        let rules = ExceptionStore::new().resolve(&tree, false);
        let options = RenderOptions::default();
        let node = tree.children(tree.root().expect("root"))[0];
        let mut renderer = CppRenderer::new(&rules, &options);
        let out = renderer
            .render_field(Field::new(&tree, node), "mytype")
            .expect("Failed to render");
        (out, renderer.imports().iter().cloned().collect())
    }

    #[test]
    fn test_global_enum_is_cast() {
        let (out, imports) = render(
            r#"<ld:field ld:subtype="enum" name="type" type-name="talk_choice_type" ld:meta="global"/>"#,
        );
        assert_eq!(
            squash(&out),
            squash("proto->set_type(static_cast<dfproto::talk_choice_type>(dfhack->type));")
        );
        assert_eq!(imports, vec!["talk_choice_type".to_string()]);
    }

    #[test]
    fn test_local_enum_is_qualified_by_outer_type() {
        let (out, imports) = render(
            r#"<ld:field ld:subtype="enum" name="state" ld:meta="compound" ld:typedef-name="T_state">
                 <enum-item name="started"/>
                 <enum-item name="active"/>
               </ld:field>"#,
        );
        assert_eq!(
            squash(&out),
            squash("proto->set_state(static_cast<dfproto::mytype_T_state>(dfhack->state));")
        );
        assert!(imports.is_empty());
    }

    #[test]
    fn test_bitfields_copy_the_whole_word() {
        let (out, imports) = render(
            r#"<ld:field ld:subtype="bitfield" name="flags_0" type-name="knowledge_scholar_flags_0" ld:meta="global"/>"#,
        );
        assert_eq!(
            squash(&out),
            squash("proto->mutable_flags_0()->set_flags(dfhack->flags_0.whole);")
        );
        assert_eq!(imports, vec!["knowledge_scholar_flags_0".to_string()]);

        let (out, _) = render(
            r#"<ld:field ld:subtype="bitfield" name="gems_use" ld:meta="compound">
                 <ld:field name="noun" ld:meta="number" ld:subtype="flag-bit"/>
               </ld:field>"#,
        );
        assert_eq!(
            squash(&out),
            squash("proto->mutable_gems_use()->set_flags(dfhack->gems_use.whole);")
        );
    }
}
