//! Field naming: schema names, native names and synthetic names.

use protogen_schema::{Field, NodeId, ResolvedRules};

/// Resolved name pair of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    /// Schema-side name (lowercased, possibly renamed).
    pub proto: String,
    /// Native member name.
    pub native: String,
}

impl Names {
    /// Creates a name pair.
    #[must_use]
    pub fn new(proto: impl Into<String>, native: impl Into<String>) -> Self {
        Self {
            proto: proto.into(),
            native: native.into(),
        }
    }

    /// Appends `_<suffix>` to the schema name.
    #[must_use]
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            proto: format!("{}_{}", self.proto, suffix),
            native: self.native.clone(),
        }
    }
}

/// Computes field names for one render call.
///
/// Anonymous fields are numbered `anon_1`, `anon_2`, ... in traversal
/// order. Only the last anonymous node is remembered, so resolving the same
/// node twice in a row returns the same name.
#[derive(Debug)]
pub struct NameResolver<'r> {
    rules: &'r ResolvedRules,
    last_anon: Option<NodeId>,
    anon_id: u32,
}

impl<'r> NameResolver<'r> {
    /// Creates a resolver with a fresh anonymous counter.
    #[must_use]
    pub fn new(rules: &'r ResolvedRules) -> Self {
        Self {
            rules,
            last_anon: None,
            anon_id: 0,
        }
    }

    /// Returns the current value of the anonymous counter.
    #[must_use]
    pub fn anon_count(&self) -> u32 {
        self.anon_id
    }

    /// Resolves the schema and native names of a field.
    pub fn resolve(&mut self, field: Field<'_>) -> Names {
        let native = match field.name().or_else(|| field.anon_name()) {
            Some(name) => name.to_string(),
            None => {
                if self.last_anon != Some(field.id()) {
                    self.anon_id += 1;
                    self.last_anon = Some(field.id());
                }
                format!("anon_{}", self.anon_id)
            }
        };

        let proto = self.rules.rename(field.id()).unwrap_or(native.as_str());
        // enum constants keep their case
        let proto = if field.tag() == "enum-item" {
            proto.to_string()
        } else {
            proto.to_lowercase()
        };

        Names { proto, native }
    }

    /// Resolves the names of every member below `field`, in the order the
    /// renderers would visit them. Used when a subtree is skipped on one side
    /// so that later synthetic names stay aligned on both sides.
    pub fn resolve_subtree(&mut self, field: Field<'_>) {
        for child in field.fields() {
            if self.rules.is_ignored(child.id()) {
                continue;
            }
            self.resolve(child);
            if !matches!(child.subtype(), Some("enum" | "bitfield")) {
                self.resolve_subtree(child);
            }
        }
    }
}

/// Returns the declared type name of a field, or `T_<name>`.
#[must_use]
pub fn type_name(field: Field<'_>, name: &str) -> String {
    field
        .type_name()
        .map_or_else(|| format!("T_{name}"), str::to_string)
}

/// Returns the local type name of a field: its typedef name, its declared
/// type name, or `T_<name>`.
#[must_use]
pub fn typedef_name(field: Field<'_>, name: &str) -> String {
    field
        .typedef_name()
        .map_or_else(|| type_name(field, name), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protogen_schema::{ExceptionStore, Tree, parse_tree};

    const XML: &str = r#"
<ld:data-definition xmlns:ld="ns">
  <ld:global-type ld:meta="struct-type" type-name="entity_position_raw">
    <ld:field name="Squad_Size" ld:meta="number" ld:subtype="int16_t"/>
    <ld:field ld:meta="number" ld:subtype="int32_t"/>
    <ld:field ld:meta="number" ld:subtype="int32_t"/>
    <ld:field ld:meta="number" ld:subtype="int32_t" ld:anon-name="anon_9"/>
    <ld:field name="state" ld:subtype="enum" ld:meta="compound" ld:typedef-name="T_st">
      <enum-item name="Started"/>
    </ld:field>
  </ld:global-type>
</ld:data-definition>
"#;

    fn fields(tree: &Tree) -> Vec<Field<'_>> {
        tree.types().next().expect("type").fields().collect()
    }

    #[test]
    fn test_named_field_is_lowercased() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let rules = ExceptionStore::new().resolve(&tree, false);
        let mut resolver = NameResolver::new(&rules);
        let names = resolver.resolve(fields(&tree)[0]);
        assert_eq!(names, Names::new("squad_size", "Squad_Size"));
    }

    #[test]
    fn test_anon_counter() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let rules = ExceptionStore::new().resolve(&tree, false);
        let mut resolver = NameResolver::new(&rules);
        let f = fields(&tree);
        assert_eq!(resolver.resolve(f[1]).native, "anon_1");
        assert_eq!(resolver.resolve(f[1]).native, "anon_1");
        assert_eq!(resolver.resolve(f[2]).native, "anon_2");
        assert_eq!(resolver.resolve(f[3]).native, "anon_9");
        assert_eq!(resolver.anon_count(), 2);
    }

    #[test]
    fn test_rename_overrides_schema_name_only() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let rules = ExceptionStore::new()
            .add_rename(r#"//field[@name="Squad_Size"]"#, "Squad_Sz")
            .expect("rule")
            .resolve(&tree, false);
        let mut resolver = NameResolver::new(&rules);
        let names = resolver.resolve(fields(&tree)[0]);
        assert_eq!(names, Names::new("squad_sz", "Squad_Size"));
    }

    #[test]
    fn test_enum_items_keep_case() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let rules = ExceptionStore::new().resolve(&tree, false);
        let mut resolver = NameResolver::new(&rules);
        let item = fields(&tree)[4].enum_items().next().expect("item");
        assert_eq!(resolver.resolve(item).proto, "Started");
    }

    #[test]
    fn test_type_names() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let f = fields(&tree);
        assert_eq!(typedef_name(f[4], "state"), "T_st");
        assert_eq!(typedef_name(f[0], "squad_size"), "T_squad_size");
        assert_eq!(type_name(f[4], "state"), "T_state");
    }

    #[test]
    fn test_resolve_subtree_advances_counter() {
        let xml = r#"
<ld:data-definition xmlns:ld="ns">
  <ld:global-type ld:meta="struct-type" type-name="t">
    <ld:field name="u" is-union="true" ld:meta="compound">
      <ld:field ld:meta="compound">
        <ld:field ld:meta="number" ld:subtype="int32_t"/>
      </ld:field>
    </ld:field>
  </ld:global-type>
</ld:data-definition>
"#;
        let tree = parse_tree(xml).expect("Failed to parse");
        let rules = ExceptionStore::new().resolve(&tree, false);
        let mut resolver = NameResolver::new(&rules);
        resolver.resolve_subtree(fields(&tree)[0]);
        assert_eq!(resolver.anon_count(), 2);
    }

    #[test]
    fn test_suffix() {
        let names = Names::new("event", "event").with_suffix("ref");
        assert_eq!(names, Names::new("event_ref", "event"));
    }
}
