//! Typed read-only views over tree nodes.
//!
//! [`TypeDecl`] wraps a top-level type definition, [`Field`] wraps any
//! member, container item, union arm, enum item or virtual method.

use crate::error::ParseError;
use crate::tree::{NodeId, Tree};

/// Declared shape of a field (`meta` attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKind {
    /// Primitive value (strings, padding).
    Primitive,
    /// Numeric value.
    Number,
    /// Opaque bytes.
    Bytes,
    /// Inline compound (struct, enum, bitfield or union).
    Compound,
    /// Runtime sized container.
    Container,
    /// Fixed size array.
    StaticArray,
    /// Pointer to another value.
    Pointer,
    /// Reference to a global type by name.
    Global,
}

impl MetaKind {
    /// Parses a meta kind from its attribute value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primitive" => Some(Self::Primitive),
            "number" => Some(Self::Number),
            "bytes" => Some(Self::Bytes),
            "compound" => Some(Self::Compound),
            "container" => Some(Self::Container),
            "static-array" => Some(Self::StaticArray),
            "pointer" => Some(Self::Pointer),
            "global" => Some(Self::Global),
            _ => None,
        }
    }

    /// Returns true for containers and static arrays.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Container | Self::StaticArray)
    }

    /// Returns true for primitives, numbers and bytes.
    #[must_use]
    pub const fn is_simple(self) -> bool {
        matches!(self, Self::Primitive | Self::Number | Self::Bytes)
    }
}

/// Kind of a top-level type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMeta {
    /// Plain structure.
    Struct,
    /// Class, possibly with virtual methods.
    Class,
    /// Enumeration.
    Enum,
    /// Bitfield.
    Bitfield,
}

impl TypeMeta {
    /// Parses a type meta from its attribute value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "struct-type" => Some(Self::Struct),
            "class-type" => Some(Self::Class),
            "enum-type" => Some(Self::Enum),
            "bitfield-type" => Some(Self::Bitfield),
            _ => None,
        }
    }
}

/// View over a field-like node.
#[derive(Debug, Clone, Copy)]
pub struct Field<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> Field<'t> {
    /// Wraps a node of `tree`.
    #[must_use]
    pub fn new(tree: &'t Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// Returns the node handle.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the tree the node belongs to.
    #[must_use]
    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    /// Returns any attribute by local name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&'t str> {
        self.tree.attr(self.id, name)
    }

    /// Returns the element local name (`field`, `item`, `enum-item`, ...).
    #[must_use]
    pub fn tag(&self) -> &'t str {
        self.tree.tag(self.id)
    }

    /// Returns the byte position of the element in the source.
    #[must_use]
    pub fn position(&self) -> usize {
        self.tree.node(self.id).position()
    }

    #[must_use]
    pub fn name(&self) -> Option<&'t str> {
        self.attr("name")
    }

    /// Returns the raw `meta` attribute.
    #[must_use]
    pub fn meta(&self) -> Option<&'t str> {
        self.attr("meta")
    }

    /// Returns the parsed meta kind, `None` when absent or unknown.
    #[must_use]
    pub fn meta_kind(&self) -> Option<MetaKind> {
        self.meta().and_then(MetaKind::parse)
    }

    #[must_use]
    pub fn subtype(&self) -> Option<&'t str> {
        self.attr("subtype")
    }

    #[must_use]
    pub fn type_name(&self) -> Option<&'t str> {
        self.attr("type-name")
    }

    /// Returns the pointee type of a container of pointers.
    #[must_use]
    pub fn pointer_type(&self) -> Option<&'t str> {
        self.attr("pointer-type")
    }

    #[must_use]
    pub fn is_union(&self) -> bool {
        self.attr("is-union") == Some("true")
    }

    /// Returns the static array length, `None` for runtime sized containers.
    #[must_use]
    pub fn count(&self) -> Option<&'t str> {
        self.attr("count")
    }

    #[must_use]
    pub fn comment(&self) -> Option<&'t str> {
        self.attr("comment")
    }

    /// Returns the synthetic name given by the normalization pass.
    #[must_use]
    pub fn anon_name(&self) -> Option<&'t str> {
        self.attr("anon-name")
    }

    /// Returns the local type name given by the normalization pass.
    #[must_use]
    pub fn typedef_name(&self) -> Option<&'t str> {
        self.attr("typedef-name")
    }

    #[must_use]
    pub fn is_anon_compound(&self) -> bool {
        self.attr("anon-compound") == Some("true")
    }

    /// Returns the `export` flag, `None` when absent.
    #[must_use]
    pub fn export(&self) -> Option<bool> {
        self.attr("export").map(|v| v == "true")
    }

    /// Returns the IDL type the field is converted to.
    #[must_use]
    pub fn export_as(&self) -> Option<&'t str> {
        self.attr("export-as")
    }

    /// Returns the return type of a virtual method.
    #[must_use]
    pub fn ret_type(&self) -> Option<&'t str> {
        self.attr("ret-type")
    }

    /// Returns the explicit value of an enum item.
    ///
    /// # Errors
    /// Returns `ParseError` if the value is not an integer.
    pub fn value(&self) -> Result<Option<i64>, ParseError> {
        self.attr("value")
            .map(|v| {
                v.trim()
                    .parse()
                    .map_err(|_| ParseError::invalid_attr(self.tag(), "value", v))
            })
            .transpose()
    }

    /// Returns all child elements.
    pub fn children(self) -> impl Iterator<Item = Field<'t>> + 't {
        let tree = self.tree;
        tree.children(self.id).iter().map(move |&id| Field::new(tree, id))
    }

    /// Returns the child elements tagged `field`.
    pub fn fields(self) -> impl Iterator<Item = Field<'t>> + 't {
        self.children().filter(|f| f.tag() == "field")
    }

    /// Returns the child enum items.
    pub fn enum_items(self) -> impl Iterator<Item = Field<'t>> + 't {
        self.children().filter(|f| f.tag() == "enum-item")
    }

    /// Returns the first child element, the item of a container or pointer.
    #[must_use]
    pub fn item(&self) -> Option<Field<'t>> {
        self.children().next()
    }

    /// Returns the number of `field` children (a union's arm count).
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields().count()
    }

    /// Returns the enclosing element.
    #[must_use]
    pub fn parent(&self) -> Option<Field<'t>> {
        self.tree.parent(self.id).map(|id| Field::new(self.tree, id))
    }
}

impl PartialEq for Field<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Field<'_> {}

/// View over a top-level type definition.
#[derive(Debug, Clone, Copy)]
pub struct TypeDecl<'t> {
    inner: Field<'t>,
}

impl<'t> TypeDecl<'t> {
    /// Wraps a node of `tree`.
    #[must_use]
    pub fn new(tree: &'t Tree, id: NodeId) -> Self {
        Self {
            inner: Field::new(tree, id),
        }
    }

    /// Returns the node handle.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id()
    }

    /// Returns the definition as a plain field view.
    #[must_use]
    pub fn as_field(&self) -> Field<'t> {
        self.inner
    }

    /// Returns the element local name.
    #[must_use]
    pub fn tag(&self) -> &'t str {
        self.inner.tag()
    }

    /// Returns the raw `meta` attribute.
    #[must_use]
    pub fn meta(&self) -> Option<&'t str> {
        self.inner.meta()
    }

    /// Returns the parsed type kind.
    #[must_use]
    pub fn type_meta(&self) -> Option<TypeMeta> {
        self.meta().and_then(TypeMeta::parse)
    }

    #[must_use]
    pub fn type_name(&self) -> Option<&'t str> {
        self.inner.type_name()
    }

    /// Returns the single parent type name.
    #[must_use]
    pub fn inherits_from(&self) -> Option<&'t str> {
        self.inner.attr("inherits-from")
    }

    #[must_use]
    pub fn comment(&self) -> Option<&'t str> {
        self.inner.comment()
    }

    #[must_use]
    pub fn export(&self) -> Option<bool> {
        self.inner.export()
    }

    /// Returns the data members in document order.
    pub fn fields(self) -> impl Iterator<Item = Field<'t>> + 't {
        self.inner.fields()
    }

    /// Returns the enum items of an enum type.
    pub fn enum_items(self) -> impl Iterator<Item = Field<'t>> + 't {
        self.inner.enum_items()
    }

    /// Returns the virtual methods of a class type.
    pub fn methods(self) -> impl Iterator<Item = Field<'t>> + 't {
        self.inner
            .children()
            .filter(|c| c.tag() == "virtual-methods")
            .flat_map(|c| c.children())
            .filter(|m| m.tag() == "vmethod")
    }
}

impl Tree {
    /// Iterates the top-level type definitions in document order.
    pub fn types(&self) -> impl Iterator<Item = TypeDecl<'_>> {
        self.root()
            .map(|root| self.children(root))
            .unwrap_or_default()
            .iter()
            .map(move |&id| TypeDecl::new(self, id))
    }

    /// Looks up a top-level type definition by name.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<TypeDecl<'_>> {
        self.types().find(|t| t.type_name() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_tree;

    const XML: &str = r#"
<ld:data-definition xmlns:ld="ns">
  <ld:global-type ld:meta="class-type" ld:level="0" type-name="adventure_item" inherits-from="adventure_item_interact_choicest" comment="an item">
    <ld:field ld:level="1" ld:meta="pointer" type-name="item" ld:is-container="true">
      <ld:item ld:level="2" ld:meta="global" type-name="item"/>
    </ld:field>
    <ld:field name="data" is-union="true" ld:level="1" ld:meta="compound" ld:typedef-name="T_data">
      <ld:field name="a" ld:level="2" ld:meta="number" ld:subtype="int32_t"/>
      <ld:field name="b" ld:level="2" ld:meta="number" ld:subtype="int32_t"/>
    </ld:field>
    <virtual-methods>
      <vmethod name="getId" ret-type="int32_t"/>
      <vmethod ld:level="1"/>
    </virtual-methods>
  </ld:global-type>
  <ld:global-type ld:meta="enum-type" ld:level="0" type-name="conflict_level">
    <enum-item name="None" value="-1"/>
    <enum-item name="Encounter"/>
    <enum-item name="Bad" value="x"/>
  </ld:global-type>
</ld:data-definition>
"#;

    #[test]
    fn test_meta_kind_parse() {
        assert_eq!(MetaKind::parse("static-array"), Some(MetaKind::StaticArray));
        assert_eq!(MetaKind::parse("global"), Some(MetaKind::Global));
        assert_eq!(MetaKind::parse("vector"), None);
        assert!(MetaKind::Container.is_container());
        assert!(MetaKind::Bytes.is_simple());
        assert!(!MetaKind::Pointer.is_simple());
    }

    #[test]
    fn test_type_meta_parse() {
        assert_eq!(TypeMeta::parse("class-type"), Some(TypeMeta::Class));
        assert_eq!(TypeMeta::parse("bitfield-type"), Some(TypeMeta::Bitfield));
        assert_eq!(TypeMeta::parse("global-object"), None);
    }

    #[test]
    fn test_type_decl_view() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let decl = tree.find_type("adventure_item").expect("type");
        assert_eq!(decl.type_meta(), Some(TypeMeta::Class));
        assert_eq!(decl.inherits_from(), Some("adventure_item_interact_choicest"));
        assert_eq!(decl.comment(), Some("an item"));
        assert_eq!(decl.fields().count(), 2);
        assert_eq!(decl.methods().count(), 2);
        assert_eq!(tree.types().count(), 2);
    }

    #[test]
    fn test_field_view() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let decl = tree.find_type("adventure_item").expect("type");
        let fields: Vec<Field<'_>> = decl.fields().collect();

        let pointer = fields[0];
        assert_eq!(pointer.meta_kind(), Some(MetaKind::Pointer));
        assert_eq!(pointer.name(), None);
        let item = pointer.item().expect("item");
        assert_eq!(item.tag(), "item");
        assert_eq!(item.type_name(), Some("item"));
        assert_eq!(item.parent(), Some(pointer));

        let union = fields[1];
        assert!(union.is_union());
        assert_eq!(union.typedef_name(), Some("T_data"));
        assert_eq!(union.field_count(), 2);
    }

    #[test]
    fn test_enum_item_values() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let decl = tree.find_type("conflict_level").expect("type");
        let items: Vec<Field<'_>> = decl.enum_items().collect();
        assert_eq!(items[0].value().expect("value"), Some(-1));
        assert_eq!(items[1].value().expect("value"), None);
        assert!(matches!(
            items[2].value(),
            Err(ParseError::InvalidAttribute { .. })
        ));
    }
}
