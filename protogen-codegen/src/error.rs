//! Error types for code generation.

use protogen_schema::Field;
use thiserror::Error;

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Structure description parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] protogen_schema::ParseError),

    /// Rules file error.
    #[error("rules error: {0}")]
    Rules(#[from] protogen_schema::RulesError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A field declares a shape outside the supported set.
    #[error("not supported: {tag}: meta={meta} (field '{name}' at offset {position})")]
    UnsupportedMeta {
        /// Element name.
        tag: String,
        /// Declared meta kind.
        meta: String,
        /// Field name, or `anon`.
        name: String,
        /// Byte offset in the source.
        position: usize,
    },

    /// A top-level definition is not a struct, class, enum or bitfield.
    #[error("not supported: {tag}: meta={meta} (type '{name}')")]
    UnsupportedType {
        /// Element name.
        tag: String,
        /// Declared meta kind.
        meta: String,
        /// Type name, or `anon`.
        name: String,
    },

    /// A required attribute is absent.
    #[error("missing attribute '{attribute}' on {tag} '{name}'")]
    MissingAttribute {
        /// Element name.
        tag: String,
        /// Attribute name.
        attribute: String,
        /// Field or type name, or `anon`.
        name: String,
    },

    /// Unknown top-level type requested by name.
    #[error("unknown type '{type_name}'")]
    UnknownType {
        /// Type name.
        type_name: String,
    },
}

impl CodegenError {
    /// Creates an unsupported meta error for a field.
    pub fn unsupported_meta(field: Field<'_>) -> Self {
        Self::UnsupportedMeta {
            tag: field.tag().to_string(),
            meta: field.meta().unwrap_or("None").to_string(),
            name: field.name().unwrap_or("anon").to_string(),
            position: field.position(),
        }
    }

    /// Creates an unsupported type error for a top-level definition.
    pub fn unsupported_type(field: Field<'_>) -> Self {
        Self::UnsupportedType {
            tag: field.tag().to_string(),
            meta: field.meta().unwrap_or("None").to_string(),
            name: field.type_name().unwrap_or("anon").to_string(),
        }
    }

    /// Creates a missing attribute error.
    pub fn missing_attr(field: Field<'_>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            tag: field.tag().to_string(),
            attribute: attribute.into(),
            name: field
                .name()
                .or_else(|| field.type_name())
                .unwrap_or("anon")
                .to_string(),
        }
    }
}
