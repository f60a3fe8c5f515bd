//! # Protogen Codegen
//!
//! Generation of IDL declarations and transcoding functions from structure
//! descriptions.
//!
//! This crate provides:
//! - The native-to-IDL type table and field naming rules
//! - A tree walker dispatching each field to a renderer by shape
//! - The IDL renderer (`message`, `enum`, `oneof` declarations)
//! - The C++ renderer (`describe_<T>` copy functions)
//! - A type-level driver assembling `.proto`, `.h` and `.cpp` files

pub mod config;
pub mod context;
pub mod cpp;
pub mod error;
pub mod generator;
pub mod names;
pub mod proto;
pub mod type_table;
pub mod walker;

pub use config::{ProtoVersion, RenderOptions};
pub use context::{OuterTypes, Qualifier, RenderContext};
pub use cpp::CppRenderer;
pub use error::CodegenError;
pub use generator::{Generator, RenderedType};
pub use names::{NameResolver, Names};
pub use proto::ProtoRenderer;
pub use type_table::ProtoScalar;

use protogen_schema::ExceptionStore;

/// Renders the `.proto` file of one type from a structure description.
///
/// # Arguments
/// * `xml` - Structure description content
/// * `type_name` - Name of the top-level type to render
/// * `store` - Exception rules
/// * `options` - Render options
///
/// # Returns
/// The generated `.proto` file.
///
/// # Errors
/// Returns `CodegenError` if parsing fails, the type is unknown or
/// rendering fails.
pub fn generate_proto_from_xml(
    xml: &str,
    type_name: &str,
    store: &ExceptionStore,
    options: RenderOptions,
) -> Result<String, CodegenError> {
    let tree = protogen_schema::parse_tree(xml)?;
    let generator = Generator::new(&tree, store, options);
    generator.proto_file(generator.find(type_name)?)
}

/// Renders the `.cpp` file of one type from a structure description.
///
/// # Arguments
/// * `xml` - Structure description content
/// * `type_name` - Name of the top-level type to render
/// * `store` - Exception rules
/// * `options` - Render options
///
/// # Returns
/// The generated `.cpp` file.
///
/// # Errors
/// Returns `CodegenError` if parsing fails, the type is unknown or
/// rendering fails.
pub fn generate_cpp_from_xml(
    xml: &str,
    type_name: &str,
    store: &ExceptionStore,
    options: RenderOptions,
) -> Result<String, CodegenError> {
    let tree = protogen_schema::parse_tree(xml)?;
    let generator = Generator::new(&tree, store, options);
    generator.source_file(generator.find(type_name)?)
}

/// Renders the `.proto` file of one type from a structure description file.
///
/// # Arguments
/// * `path` - Path to the structure description
/// * `type_name` - Name of the top-level type to render
/// * `store` - Exception rules
/// * `options` - Render options
///
/// # Errors
/// Returns `CodegenError` if reading, parsing or rendering fails.
pub fn generate_proto_from_file(
    path: &std::path::Path,
    type_name: &str,
    store: &ExceptionStore,
    options: RenderOptions,
) -> Result<String, CodegenError> {
    let xml = std::fs::read_to_string(path)?;
    generate_proto_from_xml(&xml, type_name, store, options)
}
