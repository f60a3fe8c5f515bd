//! Enum and bitfield declarations.

use super::{ProtoRenderer, type_comment};
use crate::context::{Qualifier, RenderContext};
use crate::error::CodegenError;
use crate::names::{Names, typedef_name};
use crate::walker;
use protogen_schema::Field;

impl ProtoRenderer<'_> {
    /// Renders `enum T { ... }`.
    ///
    /// Implicit values count up from 0. An explicit value above the counter
    /// moves the counter forward, and a `ZERO` member is added the first
    /// time it leaves 0. Negative values are emitted last.
    pub(super) fn enum_decl<'t>(
        &self,
        items: impl Iterator<Item = Field<'t>>,
        type_name: &str,
        prefix: &str,
        indent: &str,
    ) -> Result<String, CodegenError> {
        let inner = format!("{}  ", indent);
        let mut output = format!("{}enum {} {{\n", indent, type_name);
        let mut value: i64 = 0;
        let mut deferred = Vec::new();

        for item in items {
            if self.rules.is_ignored(item.id()) {
                continue;
            }
            match item.value()? {
                Some(v) if v < 0 => deferred.push((item, v)),
                explicit => {
                    if let Some(v) = explicit.filter(|v| *v > value) {
                        if value == 0 {
                            output.push_str(&format!("{}{}ZERO = 0;\n", inner, prefix));
                        }
                        value = v;
                    }
                    output.push_str(&self.enum_item(item, prefix, value, &inner));
                    value += 1;
                }
            }
        }
        for (item, v) in deferred {
            output.push_str(&self.enum_item(item, prefix, v, &inner));
        }

        output.push_str(&format!("{}}}\n", indent));
        Ok(output)
    }

    fn enum_item(&self, item: Field<'_>, prefix: &str, value: i64, indent: &str) -> String {
        let name = self.item_name(item, value);
        let mut line = format!("{}{}{} = {};", indent, prefix, name, value);
        if let Some(comment) = item.comment() {
            line.push_str(&format!(" /* {} */", comment));
        }
        line.push('\n');
        line
    }

    /// Name of an enum item or flag; unnamed ones are named after their
    /// value (`anon_3`, `anon_m1`).
    fn item_name(&self, item: Field<'_>, value: i64) -> String {
        if let Some(name) = self
            .rules
            .rename(item.id())
            .or_else(|| item.name())
            .or_else(|| item.anon_name())
        {
            return name.to_string();
        }
        if value < 0 {
            format!("anon_m{}", -value)
        } else {
            format!("anon_{}", value)
        }
    }

    /// Renders `message T { enum mask { ... } required fixed32 flags = 1; }`.
    ///
    /// Mask values are the bit positions of the flags.
    pub(super) fn bitfield_decl(&self, field: Field<'_>, type_name: &str, indent: &str) -> String {
        let inner = format!("{}  ", indent);
        let mut output = format!("{}message {} {{\n", indent, type_name);

        let flags: Vec<Field<'_>> = field.fields().collect();
        if !flags.is_empty() {
            output.push_str(&format!("{}enum mask {{\n", inner));
            for (bit, flag) in (0_i64..).zip(flags) {
                if self.rules.is_ignored(flag.id()) {
                    continue;
                }
                let mut line = format!("{}  {} = 0x{:x};", inner, self.item_name(flag, bit), bit);
                if let Some(comment) = flag.comment() {
                    line.push_str(&format!(" /* {} */", comment));
                }
                line.push('\n');
                output.push_str(&line);
            }
            output.push_str(&format!("{}}}\n", inner));
        }

        let keyword = Qualifier::Required.keyword(self.options.version);
        if keyword.is_empty() {
            output.push_str(&format!("{}fixed32 flags = 1;\n", inner));
        } else {
            output.push_str(&format!("{}{} fixed32 flags = 1;\n", inner, keyword));
        }
        output.push_str(&format!("{}}}\n", indent));
        output
    }

    /// Local enum declaration of a field, with its leading comment.
    pub(super) fn local_enum_decl(
        &self,
        field: Field<'_>,
        type_name: &str,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        let mut output = type_comment(ctx, field.comment());
        let prefix = format!("{}_", names.proto);
        output.push_str(&self.enum_decl(field.enum_items(), type_name, &prefix, &ctx.indent())?);
        Ok(output)
    }

    /// Local bitfield declaration of a field, with its leading comment.
    pub(super) fn local_bitfield_decl(
        &self,
        field: Field<'_>,
        type_name: &str,
        ctx: &RenderContext,
    ) -> String {
        let mut output = type_comment(ctx, field.comment());
        output.push_str(&self.bitfield_decl(field, type_name, &ctx.indent()));
        output
    }

    pub(super) fn enum_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        if walker::is_local_type(field) {
            let type_name = typedef_name(field, &names.proto);
            let mut output = self.local_enum_decl(field, &type_name, names, ctx)?;
            output.push_str(&self.field_line(ctx, ctx.qualifier, &type_name, &names.proto, None));
            return Ok(output);
        }
        let type_name = walker::referenced_type(field)?;
        self.add_import(type_name);
        Ok(self.field_line(ctx, ctx.qualifier, type_name, &names.proto, field.comment()))
    }

    pub(super) fn bitfield_field(
        &mut self,
        field: Field<'_>,
        names: &Names,
        ctx: &RenderContext,
    ) -> Result<String, CodegenError> {
        if walker::is_local_type(field) {
            let type_name = typedef_name(field, &names.proto);
            let mut output = self.local_bitfield_decl(field, &type_name, ctx);
            output.push_str(&self.field_line(ctx, ctx.qualifier, &type_name, &names.proto, None));
            return Ok(output);
        }
        let type_name = walker::referenced_type(field)?;
        self.add_import(type_name);
        Ok(self.field_line(ctx, ctx.qualifier, type_name, &names.proto, field.comment()))
    }
}
