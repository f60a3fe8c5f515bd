//! Per-field rendering context threaded through the tree walker.

use crate::config::ProtoVersion;
use crate::names::Names;

/// Field qualifier on the schema side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Qualifier {
    #[default]
    Required,
    Optional,
    Repeated,
    /// No keyword at all (oneof arms).
    Bare,
}

impl Qualifier {
    /// Returns the keyword emitted for `version`, empty when none applies.
    #[must_use]
    pub const fn keyword(self, version: ProtoVersion) -> &'static str {
        match self {
            Self::Repeated => "repeated",
            Self::Required if version.has_presence_keywords() => "required",
            Self::Optional if version.has_presence_keywords() => "optional",
            _ => "",
        }
    }

    /// Pointers may be null: a required field becomes optional.
    #[must_use]
    pub const fn nullable(self) -> Self {
        match self {
            Self::Required => Self::Optional,
            other => other,
        }
    }
}

/// Stack of enclosing type names, used to qualify local types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OuterTypes(Vec<String>);

impl OuterTypes {
    /// Creates a stack holding the top-level type.
    #[must_use]
    pub fn root(type_name: impl Into<String>) -> Self {
        Self(vec![type_name.into()])
    }

    /// Returns a copy with `type_name` pushed.
    #[must_use]
    pub fn push(&self, type_name: impl Into<String>) -> Self {
        let mut next = self.0.clone();
        next.push(type_name.into());
        Self(next)
    }

    /// Qualified schema-side name: `outer_T_inner`.
    #[must_use]
    pub fn proto_name(&self) -> String {
        self.0.join("_")
    }

    /// Qualified native name: `outer::T_inner`.
    #[must_use]
    pub fn native_name(&self) -> String {
        self.0.join("::")
    }

    /// Qualifies a local type name against the enclosing types.
    #[must_use]
    pub fn qualify_proto(&self, type_name: &str) -> String {
        if self.0.is_empty() {
            type_name.to_string()
        } else {
            format!("{}_{}", self.proto_name(), type_name)
        }
    }

    #[must_use]
    pub fn qualify_native(&self, type_name: &str) -> String {
        if self.0.is_empty() {
            type_name.to_string()
        } else {
            format!("{}::{}", self.native_name(), type_name)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Context of one field render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// Ordinal position of the field (1-based).
    pub position: u32,
    /// Name override; resolved from the node when absent.
    pub names: Option<Names>,
    /// Schema-side qualifier.
    pub qualifier: Qualifier,
    /// Nesting depth; two spaces of indentation per level.
    pub depth: usize,
    /// The native value is reached through a pointer already followed by an
    /// enclosing field.
    pub deref: bool,
    /// Enclosing type names.
    pub outer: OuterTypes,
}

impl RenderContext {
    /// Creates the context of the first member of a top-level type.
    #[must_use]
    pub fn new(outer: OuterTypes) -> Self {
        Self {
            position: 1,
            names: None,
            qualifier: Qualifier::Required,
            depth: 1,
            deref: false,
            outer,
        }
    }

    /// Context of a sibling member at `position`.
    #[must_use]
    pub fn member(&self, position: u32) -> Self {
        Self {
            position,
            names: None,
            qualifier: Qualifier::Required,
            depth: self.depth,
            deref: false,
            outer: self.outer.clone(),
        }
    }

    /// Context of the first member of a local type named `type_name`.
    #[must_use]
    pub fn nested(&self, type_name: &str) -> Self {
        Self {
            position: 1,
            names: None,
            qualifier: Qualifier::Required,
            depth: self.depth + 1,
            deref: false,
            outer: self.outer.push(type_name),
        }
    }

    #[must_use]
    pub fn with_names(mut self, names: Names) -> Self {
        self.names = Some(names);
        self
    }

    #[must_use]
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    #[must_use]
    pub fn with_deref(mut self, deref: bool) -> Self {
        self.deref = deref;
        self
    }

    #[must_use]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Returns true inside a container loop.
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.qualifier == Qualifier::Repeated
    }

    /// Indentation for the current depth.
    #[must_use]
    pub fn indent(&self) -> String {
        "  ".repeat(self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_by_version() {
        assert_eq!(Qualifier::Required.keyword(ProtoVersion::Proto2), "required");
        assert_eq!(Qualifier::Optional.keyword(ProtoVersion::Proto2), "optional");
        assert_eq!(Qualifier::Required.keyword(ProtoVersion::Proto3), "");
        assert_eq!(Qualifier::Optional.keyword(ProtoVersion::Proto3), "");
        assert_eq!(Qualifier::Repeated.keyword(ProtoVersion::Proto3), "repeated");
        assert_eq!(Qualifier::Bare.keyword(ProtoVersion::Proto2), "");
    }

    #[test]
    fn test_nullable() {
        assert_eq!(Qualifier::Required.nullable(), Qualifier::Optional);
        assert_eq!(Qualifier::Repeated.nullable(), Qualifier::Repeated);
    }

    #[test]
    fn test_outer_types() {
        let outer = OuterTypes::root("mytype").push("T_unk");
        assert_eq!(outer.proto_name(), "mytype_T_unk");
        assert_eq!(outer.native_name(), "mytype::T_unk");
        assert_eq!(outer.qualify_proto("T_x"), "mytype_T_unk_T_x");
        assert_eq!(OuterTypes::default().qualify_native("T_x"), "T_x");
    }

    #[test]
    fn test_nested_context() {
        let ctx = RenderContext::new(OuterTypes::root("t"))
            .member(3)
            .with_qualifier(Qualifier::Repeated)
            .with_deref(true);
        assert!(ctx.is_repeated());
        let inner = ctx.nested("T_x");
        assert_eq!(inner.position, 1);
        assert_eq!(inner.depth, 2);
        assert!(!inner.deref);
        assert_eq!(inner.qualifier, Qualifier::Required);
        assert_eq!(inner.outer.proto_name(), "t_T_x");
        assert_eq!(inner.indent(), "    ");
    }

    #[test]
    fn test_outer_stack_is_not_shared() {
        let base = OuterTypes::root("a");
        let pushed = base.push("b");
        assert_eq!(base.proto_name(), "a");
        assert_eq!(pushed.proto_name(), "a_b");
        assert!(!base.is_empty());
    }
}
