//! Exception rules: rename, ignore, index and enum hints.
//!
//! Rules are registered on an [`ExceptionStore`], then resolved once per
//! render batch against a loaded tree into [`ResolvedRules`], a set of node
//! handles that renderers query by identity.

use crate::error::{ParseError, RulesError};
use crate::path::Path;
use crate::tree::{NodeId, Tree};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// A single user supplied override.
#[derive(Debug, Clone)]
pub enum ExceptionRule {
    /// Gives the selected nodes a new schema name.
    Rename {
        /// Structural predicate.
        path: Path,
        /// New schema name.
        name: String,
    },
    /// Suppresses the selected nodes.
    Ignore {
        /// Structural predicate.
        path: Path,
    },
    /// Replaces pointers to `type_name` with a read of `field`.
    Index {
        /// Pointee type name.
        type_name: String,
        /// Identifier field on the pointee.
        field: String,
    },
    /// Transcodes container items of `type_name` as enum values.
    Enum {
        /// Enum type name.
        type_name: String,
    },
}

/// Ordered collection of exception rules.
#[derive(Debug, Clone, Default)]
pub struct ExceptionStore {
    rules: Vec<ExceptionRule>,
}

impl ExceptionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rename rule.
    ///
    /// # Errors
    /// Returns `ParseError` if the path does not compile.
    pub fn add_rename(mut self, path: &str, name: impl Into<String>) -> Result<Self, ParseError> {
        self.rules.push(ExceptionRule::Rename {
            path: Path::compile(path)?,
            name: name.into(),
        });
        Ok(self)
    }

    /// Registers an ignore rule.
    ///
    /// # Errors
    /// Returns `ParseError` if the path does not compile.
    pub fn add_ignore(mut self, path: &str) -> Result<Self, ParseError> {
        self.rules.push(ExceptionRule::Ignore {
            path: Path::compile(path)?,
        });
        Ok(self)
    }

    /// Registers an index rule.
    #[must_use]
    pub fn add_index(mut self, type_name: impl Into<String>, field: impl Into<String>) -> Self {
        self.rules.push(ExceptionRule::Index {
            type_name: type_name.into(),
            field: field.into(),
        });
        self
    }

    /// Registers an enum hint.
    #[must_use]
    pub fn add_enum(mut self, type_name: impl Into<String>) -> Self {
        self.rules.push(ExceptionRule::Enum {
            type_name: type_name.into(),
        });
        self
    }

    /// Returns the rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[ExceptionRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates every rule against `tree`.
    ///
    /// With `ignore_no_export` set, fields without an `export` flag are
    /// ignored unless an enclosing field is exported. Fields flagged
    /// `export="false"` or named `unk_*` are always ignored.
    #[must_use]
    pub fn resolve(&self, tree: &Tree, ignore_no_export: bool) -> ResolvedRules {
        let mut resolved = ResolvedRules::default();

        for rule in &self.rules {
            match rule {
                ExceptionRule::Rename { path, name } => {
                    for id in path.select(tree) {
                        resolved.renames.entry(id).or_insert_with(|| name.clone());
                    }
                }
                ExceptionRule::Ignore { path } => {
                    resolved.ignored.extend(path.select(tree));
                }
                ExceptionRule::Index { type_name, field } => {
                    resolved
                        .index
                        .entry(type_name.clone())
                        .or_insert_with(|| field.clone());
                }
                ExceptionRule::Enum { type_name } => {
                    resolved.enums.insert(type_name.clone());
                }
            }
        }

        for id in tree.ids() {
            if export_ignored(tree, id, ignore_no_export) {
                resolved.ignored.insert(id);
            }
        }

        resolved
    }
}

/// Applies the export flags of a member.
fn export_ignored(tree: &Tree, id: NodeId, ignore_no_export: bool) -> bool {
    if !matches!(tree.tag(id), "field" | "item") {
        return false;
    }
    // converted fields are always rendered
    if tree.attr(id, "export-as").is_some() {
        return false;
    }
    let export = tree.attr(id, "export");
    if export.is_none() && ignore_no_export && !exported_ancestor(tree, id) {
        return true;
    }
    export == Some("false") || tree.attr(id, "name").is_some_and(|n| n.starts_with("unk_"))
}

/// Returns true if an enclosing member (not the type itself) is exported.
fn exported_ancestor(tree: &Tree, id: NodeId) -> bool {
    tree.ancestors(id)
        .take_while(|&a| matches!(tree.tag(a), "field" | "item"))
        .any(|a| tree.attr(a, "export") == Some("true"))
}

/// Rules evaluated against one tree, queried by node identity.
#[derive(Debug, Clone, Default)]
pub struct ResolvedRules {
    renames: HashMap<NodeId, String>,
    ignored: HashSet<NodeId>,
    index: HashMap<String, String>,
    enums: HashSet<String>,
}

impl ResolvedRules {
    /// Returns the schema name override of a node.
    #[must_use]
    pub fn rename(&self, id: NodeId) -> Option<&str> {
        self.renames.get(&id).map(String::as_str)
    }

    /// Returns true if the node must not be rendered.
    #[must_use]
    pub fn is_ignored(&self, id: NodeId) -> bool {
        self.ignored.contains(&id)
    }

    /// Returns the identifier field substituted for pointers to `type_name`.
    #[must_use]
    pub fn index_field(&self, type_name: &str) -> Option<&str> {
        self.index.get(type_name).map(String::as_str)
    }

    /// Returns true if `type_name` is hinted as an enum.
    #[must_use]
    pub fn is_enum(&self, type_name: &str) -> bool {
        self.enums.contains(type_name)
    }
}

/// Options section of a rules file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesOptions {
    /// Target IDL major version (2 or 3).
    pub version: Option<u8>,
    /// IDL package.
    pub package: Option<String>,
    /// Emit a comment for ignored fields.
    pub comment_ignored: Option<bool>,
    /// Ignore fields without an export flag.
    pub ignore_no_export: Option<bool>,
    /// Namespace of the generated IDL classes.
    pub proto_namespace: Option<String>,
    /// Namespace of the generated transcoding functions.
    pub cpp_namespace: Option<String>,
    /// Namespace of the native structures.
    pub native_namespace: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RenameEntry {
    path: String,
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct IgnoreEntry {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct IndexEntry {
    #[serde(rename = "type")]
    type_name: String,
    field: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnumEntry {
    #[serde(rename = "type")]
    type_name: String,
}

/// TOML rules file.
///
/// ```toml
/// [options]
/// version = 2
///
/// [[rename]]
/// path = '//ld:field[@name="squad_size"]'
/// name = "squad_sz"
///
/// [[ignore]]
/// path = '//ld:field[re:test(@name, "^unk_")]'
///
/// [[index]]
/// type = "interaction_target"
/// field = "index"
///
/// [[enum]]
/// type = "vague_relationship"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesFile {
    /// Render options.
    #[serde(default)]
    pub options: RulesOptions,
    #[serde(default)]
    rename: Vec<RenameEntry>,
    #[serde(default)]
    ignore: Vec<IgnoreEntry>,
    #[serde(default)]
    index: Vec<IndexEntry>,
    #[serde(default, rename = "enum")]
    enums: Vec<EnumEntry>,
}

impl RulesFile {
    /// Parses a rules file from TOML text.
    ///
    /// # Errors
    /// Returns `RulesError` for invalid TOML, unknown keys or an
    /// unsupported IDL version.
    pub fn from_toml(content: &str) -> Result<Self, RulesError> {
        let file: Self = toml::from_str(content)?;
        if let Some(version) = file.options.version.filter(|v| !matches!(v, 2 | 3)) {
            return Err(RulesError::InvalidOption {
                option: "version".to_string(),
                message: format!("unsupported version {version}, expected 2 or 3"),
            });
        }
        Ok(file)
    }

    /// Reads and parses a rules file.
    ///
    /// # Errors
    /// Returns `RulesError` if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, RulesError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Compiles the rules into a store, keeping file order per rule kind.
    ///
    /// # Errors
    /// Returns `RulesError` if a path does not compile.
    pub fn to_store(&self) -> Result<ExceptionStore, RulesError> {
        let mut store = ExceptionStore::new();
        for entry in &self.rename {
            store = store.add_rename(&entry.path, entry.name.as_str())?;
        }
        for entry in &self.ignore {
            store = store.add_ignore(&entry.path)?;
        }
        for entry in &self.index {
            store = store.add_index(entry.type_name.as_str(), entry.field.as_str());
        }
        for entry in &self.enums {
            store = store.add_enum(entry.type_name.as_str());
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_tree;

    const XML: &str = r#"
<ld:data-definition xmlns:ld="ns">
  <ld:global-type ld:meta="struct-type" type-name="entity_position_raw">
    <ld:field name="squad_size" ld:meta="number" ld:subtype="int16_t"/>
    <ld:field name="unk_1" ld:meta="number" ld:subtype="int32_t"/>
    <ld:field name="hidden" export="false" ld:meta="number" ld:subtype="int32_t"/>
    <ld:field name="shown" export="true" ld:meta="compound">
      <ld:field name="nested" ld:meta="number" ld:subtype="int32_t"/>
    </ld:field>
    <ld:field name="name" export-as="string" ld:meta="global" type-name="language_name"/>
  </ld:global-type>
</ld:data-definition>
"#;

    fn field(tree: &Tree, name: &str) -> NodeId {
        tree.ids()
            .find(|&id| tree.attr(id, "name") == Some(name))
            .expect("field")
    }

    #[test]
    fn test_rename_first_rule_wins() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let store = ExceptionStore::new()
            .add_rename(r#"//ld:field[@name="squad_size"]"#, "squad_sz")
            .expect("rule")
            .add_rename(r#"*/field[@name="squad_size"]"#, "other")
            .expect("rule");
        let rules = store.resolve(&tree, false);
        assert_eq!(rules.rename(field(&tree, "squad_size")), Some("squad_sz"));
        assert_eq!(rules.rename(field(&tree, "shown")), None);
    }

    #[test]
    fn test_ignore_rule_and_export_flags() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let store = ExceptionStore::new()
            .add_ignore(r#"//field[@name="nested"]"#)
            .expect("rule");
        let rules = store.resolve(&tree, false);
        assert!(rules.is_ignored(field(&tree, "nested")));
        assert!(rules.is_ignored(field(&tree, "unk_1")));
        assert!(rules.is_ignored(field(&tree, "hidden")));
        assert!(!rules.is_ignored(field(&tree, "squad_size")));
        assert!(!rules.is_ignored(field(&tree, "shown")));
    }

    #[test]
    fn test_ignore_no_export() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let rules = ExceptionStore::new().resolve(&tree, true);
        assert!(rules.is_ignored(field(&tree, "squad_size")));
        assert!(!rules.is_ignored(field(&tree, "shown")));
        assert!(!rules.is_ignored(field(&tree, "nested")));
        assert!(!rules.is_ignored(field(&tree, "name")));
    }

    #[test]
    fn test_index_and_enum_rules() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let rules = ExceptionStore::new()
            .add_index("interaction_target", "index")
            .add_index("interaction_target", "id")
            .add_enum("vague_relationship")
            .resolve(&tree, false);
        assert_eq!(rules.index_field("interaction_target"), Some("index"));
        assert_eq!(rules.index_field("unit"), None);
        assert!(rules.is_enum("vague_relationship"));
        assert!(!rules.is_enum("unit"));
    }

    #[test]
    fn test_rules_file() {
        let content = r#"
[options]
version = 3
package = "dfproto"
comment_ignored = true

[[rename]]
path = 'ld:global-type[@type-name="entity_position_raw"]/ld:field[@name="squad_size"]'
name = "squad_sz"

[[ignore]]
path = '//ld:field[re:test(@name, "^unk_")]'

[[index]]
type = "interaction_target"
field = "index"

[[enum]]
type = "vague_relationship"
"#;
        let file = RulesFile::from_toml(content).expect("rules");
        assert_eq!(file.options.version, Some(3));
        assert_eq!(file.options.package.as_deref(), Some("dfproto"));
        assert_eq!(file.options.comment_ignored, Some(true));
        assert_eq!(file.options.ignore_no_export, None);

        let store = file.to_store().expect("store");
        assert_eq!(store.len(), 4);
        assert!(matches!(store.rules()[0], ExceptionRule::Rename { .. }));
        assert!(matches!(store.rules()[3], ExceptionRule::Enum { .. }));
    }

    #[test]
    fn test_rules_file_errors() {
        assert!(matches!(
            RulesFile::from_toml("[options]\nversion = 4\n"),
            Err(RulesError::InvalidOption { .. })
        ));
        assert!(matches!(
            RulesFile::from_toml("[[rename]]\npath = 'x'\n"),
            Err(RulesError::Toml(_))
        ));
        assert!(matches!(
            RulesFile::from_toml("[[bogus]]\n"),
            Err(RulesError::Toml(_))
        ));

        let file = RulesFile::from_toml("[[ignore]]\npath = 'field['\n").expect("rules");
        assert!(matches!(file.to_store(), Err(RulesError::Path(_))));
    }

    #[test]
    fn test_empty_rules_file() {
        let file = RulesFile::from_toml("").expect("rules");
        assert!(file.to_store().expect("store").is_empty());
    }

    #[test]
    fn test_rules_file_from_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.toml");
        std::fs::write(&path, "[[enum]]\ntype = \"x_type\"\n").expect("write");
        let file = RulesFile::from_path(&path).expect("rules");
        assert_eq!(file.to_store().expect("store").len(), 1);
        assert!(matches!(
            RulesFile::from_path(dir.path().join("missing.toml")),
            Err(RulesError::Io(_))
        ));
    }
}
