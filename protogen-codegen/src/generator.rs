//! Type-level driver: renders whole types and assembles output files.

use std::collections::BTreeSet;

use crate::config::RenderOptions;
use crate::cpp::{self, CppRenderer};
use crate::error::CodegenError;
use crate::proto::ProtoRenderer;
use protogen_schema::{ExceptionStore, ResolvedRules, Tree, TypeDecl, TypeMeta};
use tracing::debug;

/// Output of one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedType {
    /// Name of the rendered type.
    pub name: String,
    /// Generated text.
    pub body: String,
    /// Types of the same domain the text depends on.
    pub imports: BTreeSet<String>,
    /// Other generated units the text depends on.
    pub foreign_imports: BTreeSet<String>,
}

/// Renders the types of one structure description.
///
/// Rules are resolved once when the generator is created and shared by
/// every render call. Each call starts from a fresh renderer, so types can
/// be rendered in any order or from several threads.
pub struct Generator<'t> {
    tree: &'t Tree,
    rules: ResolvedRules,
    options: RenderOptions,
}

impl<'t> Generator<'t> {
    /// Creates a generator, resolving `store` against `tree`.
    #[must_use]
    pub fn new(tree: &'t Tree, store: &ExceptionStore, options: RenderOptions) -> Self {
        let rules = store.resolve(tree, options.ignore_no_export);
        Self {
            tree,
            rules,
            options,
        }
    }

    /// Returns the render options.
    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Returns the resolved rules.
    #[must_use]
    pub fn rules(&self) -> &ResolvedRules {
        &self.rules
    }

    /// Iterates the named top-level types in document order.
    pub fn types(&self) -> impl Iterator<Item = TypeDecl<'t>> + 't {
        self.tree.types().filter(|t| t.type_name().is_some())
    }

    /// Looks up a top-level type.
    ///
    /// # Errors
    /// Returns `CodegenError::UnknownType` if no type has this name.
    pub fn find(&self, name: &str) -> Result<TypeDecl<'t>, CodegenError> {
        self.tree
            .find_type(name)
            .ok_or_else(|| CodegenError::UnknownType {
                type_name: name.to_string(),
            })
    }

    /// Renders the IDL declaration of a type.
    ///
    /// # Errors
    /// Returns `CodegenError` if the type or one of its fields is not
    /// supported.
    pub fn render_proto(&self, decl: TypeDecl<'_>) -> Result<RenderedType, CodegenError> {
        let name = type_name(decl)?;
        debug!(type_name = name, "rendering IDL declaration");
        let mut renderer = ProtoRenderer::new(&self.rules, &self.options);
        let body = renderer.render_type(decl)?;
        Ok(RenderedType {
            name: name.to_string(),
            body,
            imports: renderer.into_imports(),
            foreign_imports: BTreeSet::new(),
        })
    }

    /// Renders the transcoding function of a type.
    ///
    /// # Errors
    /// Returns `CodegenError` if the type or one of its fields is not
    /// supported.
    pub fn render_cpp(&self, decl: TypeDecl<'_>) -> Result<RenderedType, CodegenError> {
        let name = type_name(decl)?;
        debug!(type_name = name, "rendering transcoding function");
        let mut renderer = CppRenderer::new(&self.rules, &self.options);
        let body = renderer.render_type(decl)?;
        let (imports, foreign_imports) = renderer.into_imports();
        Ok(RenderedType {
            name: name.to_string(),
            body,
            imports,
            foreign_imports,
        })
    }

    /// Renders the transcoding prototype of a type.
    #[must_use]
    pub fn render_prototype(&self, type_name: &str) -> String {
        cpp::prototype(&self.options, type_name)
    }

    /// Assembles the `.proto` file of a type.
    ///
    /// # Errors
    /// Returns `CodegenError` if rendering fails.
    pub fn proto_file(&self, decl: TypeDecl<'_>) -> Result<String, CodegenError> {
        let rendered = self.render_proto(decl)?;
        let mut output = format!("syntax = \"{}\";\n", self.options.version.syntax());
        if let Some(package) = &self.options.proto_package {
            output.push_str(&format!("package {};\n", package));
        }
        output.push('\n');

        let imports: Vec<&String> = rendered
            .imports
            .iter()
            .filter(|i| **i != rendered.name)
            .collect();
        for import in &imports {
            output.push_str(&format!("import \"{}.proto\";\n", import));
        }
        if !imports.is_empty() {
            output.push('\n');
        }

        output.push_str(&rendered.body);
        Ok(output)
    }

    /// Assembles the header declaring the transcoding function of a type.
    #[must_use]
    pub fn header_file(&self, type_name: &str) -> String {
        let guard = format!("{}_{}_H", self.options.cpp_namespace, type_name).to_uppercase();
        let mut output = String::new();
        output.push_str(&format!("#ifndef {}\n", guard));
        output.push_str(&format!("#define {}\n\n", guard));
        output.push_str(&format!("#include \"df/{}.h\"\n", type_name));
        output.push_str(&format!("#include \"{}.pb.h\"\n\n", type_name));
        output.push_str(&format!("namespace {} {{\n", self.options.cpp_namespace));
        output.push_str(&format!("  {}\n", self.render_prototype(type_name)));
        output.push_str("}\n\n");
        output.push_str(&format!("#endif /* {} */\n", guard));
        output
    }

    /// Assembles the `.cpp` file of a type.
    ///
    /// # Errors
    /// Returns `CodegenError` if rendering fails.
    pub fn source_file(&self, decl: TypeDecl<'_>) -> Result<String, CodegenError> {
        let rendered = self.render_cpp(decl)?;
        let mut output = format!("#include \"{}.h\"\n", rendered.name);
        for import in rendered.imports.iter().filter(|i| **i != rendered.name) {
            output.push_str(&format!("#include \"df/{}.h\"\n", import));
        }
        for import in rendered
            .foreign_imports
            .iter()
            .filter(|i| **i != rendered.name)
        {
            output.push_str(&format!("#include \"{}.h\"\n", import));
        }
        output.push('\n');
        output.push_str(&rendered.body);
        Ok(output)
    }

    /// Names of the files a render of every type would produce.
    ///
    /// Enums only produce an IDL file. With `exported_only`, types without
    /// `export="true"` are skipped.
    #[must_use]
    pub fn file_names(&self, exported_only: bool) -> Vec<String> {
        let mut names = Vec::new();
        for decl in self.types() {
            if exported_only && decl.export() != Some(true) {
                continue;
            }
            let Some(name) = decl.type_name() else {
                continue;
            };
            names.push(format!("{}.proto", name));
            if decl.type_meta() != Some(TypeMeta::Enum) {
                names.push(format!("{}.h", name));
                names.push(format!("{}.cpp", name));
            }
        }
        names
    }
}

fn type_name<'a>(decl: TypeDecl<'a>) -> Result<&'a str, CodegenError> {
    decl.type_name()
        .ok_or_else(|| CodegenError::missing_attr(decl.as_field(), "type-name"))
}
