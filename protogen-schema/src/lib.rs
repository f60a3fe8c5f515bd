//! # Protogen Schema
//!
//! Input side of the protogen generator.
//!
//! This crate provides:
//! - Loading of normalized structure descriptions into an immutable tree
//! - Typed read-only views over types and fields
//! - Structural path predicates
//! - Exception rules (rename, ignore, index, enum) and their TOML file format

pub mod error;
pub mod fields;
pub mod parser;
pub mod path;
pub mod rules;
pub mod tree;

pub use error::{ParseError, RulesError};
pub use fields::{Field, MetaKind, TypeDecl, TypeMeta};
pub use parser::{parse_tree, parse_tree_file};
pub use path::Path;
pub use rules::{ExceptionRule, ExceptionStore, ResolvedRules, RulesFile, RulesOptions};
pub use tree::{Node, NodeId, Tree};
