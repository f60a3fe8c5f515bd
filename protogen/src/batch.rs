//! Batch rendering of every selected type into an output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use protogen_codegen::{CodegenError, Generator};
use protogen_schema::{TypeDecl, TypeMeta};
use rayon::prelude::*;
use tracing::{error, info};

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files written, in type order.
    pub written: Vec<PathBuf>,
    /// Types that failed to render, with the error message.
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    /// Returns true if every type rendered.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Selects the types to render: the named ones, or every type (optionally
/// only exported ones).
///
/// # Errors
/// Returns an error if a named type does not exist.
pub fn select<'t>(
    generator: &Generator<'t>,
    names: &[String],
    exported_only: bool,
) -> Result<Vec<TypeDecl<'t>>, CodegenError> {
    if !names.is_empty() {
        return names.iter().map(|name| generator.find(name)).collect();
    }
    Ok(generator
        .types()
        .filter(|decl| !exported_only || decl.export() == Some(true))
        .collect())
}

/// Renders every type of `decls` in parallel and writes its files to
/// `output`. A type that fails is logged and skipped.
///
/// # Errors
/// Returns an error if the output directory cannot be created.
pub fn render_all(
    generator: &Generator<'_>,
    decls: &[TypeDecl<'_>],
    output: &Path,
) -> anyhow::Result<BatchReport> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    let results: Vec<(String, anyhow::Result<Vec<PathBuf>>)> = decls
        .par_iter()
        .map(|decl| {
            let name = decl.type_name().unwrap_or("anon").to_string();
            let result = render_one(generator, *decl, output);
            (name, result)
        })
        .collect();

    let mut report = BatchReport::default();
    for (name, result) in results {
        match result {
            Ok(paths) => {
                info!(type_name = %name, files = paths.len(), "rendered");
                report.written.extend(paths);
            }
            Err(e) => {
                error!(type_name = %name, "failed to render: {e:#}");
                report.failed.push((name, format!("{e:#}")));
            }
        }
    }
    Ok(report)
}

fn render_one(
    generator: &Generator<'_>,
    decl: TypeDecl<'_>,
    output: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    let Some(name) = decl.type_name() else {
        bail!("type without type-name");
    };

    let mut files = vec![(format!("{name}.proto"), generator.proto_file(decl)?)];
    if decl.type_meta() != Some(TypeMeta::Enum) {
        files.push((format!("{name}.h"), generator.header_file(name)));
        files.push((format!("{name}.cpp"), generator.source_file(decl)?));
    }

    let mut written = Vec::with_capacity(files.len());
    for (file_name, content) in files {
        let path = output.join(file_name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protogen_codegen::RenderOptions;
    use protogen_schema::{ExceptionStore, parse_tree};

    const XML: &str = r#"
<ld:data-definition xmlns:ld="ns">
  <ld:global-type ld:meta="enum-type" type-name="profession">
    <enum-item name="MINER"/>
  </ld:global-type>
  <ld:global-type ld:meta="struct-type" type-name="unit" export="true">
    <ld:field ld:subtype="enum" name="profession" type-name="profession" ld:meta="global"/>
  </ld:global-type>
  <ld:global-type ld:meta="struct-type" type-name="broken">
    <ld:field name="x" ld:meta="bogus"/>
  </ld:global-type>
</ld:data-definition>
"#;

    fn names(decls: &[TypeDecl<'_>]) -> Vec<String> {
        decls
            .iter()
            .filter_map(|d| d.type_name())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_select() {
        let tree = parse_tree(XML).expect("Failed to parse");
        let generator = Generator::new(&tree, &ExceptionStore::new(), RenderOptions::default());

        let all = select(&generator, &[], false).expect("select");
        assert_eq!(names(&all), vec!["profession", "unit", "broken"]);

        let exported = select(&generator, &[], true).expect("select");
        assert_eq!(names(&exported), vec!["unit"]);

        let named = select(&generator, &["profession".to_string()], false).expect("select");
        assert_eq!(names(&named), vec!["profession"]);

        assert!(select(&generator, &["missing".to_string()], false).is_err());
    }

    #[test]
    fn test_render_all_writes_files_and_skips_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tree = parse_tree(XML).expect("Failed to parse");
        let generator = Generator::new(&tree, &ExceptionStore::new(), RenderOptions::default());
        let decls = select(&generator, &[], false).expect("select");

        let report = render_all(&generator, &decls, dir.path()).expect("render");
        assert!(!report.is_success());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert_eq!(report.written.len(), 4);

        assert!(dir.path().join("profession.proto").exists());
        assert!(!dir.path().join("profession.cpp").exists());
        let source = std::fs::read_to_string(dir.path().join("unit.cpp")).expect("read");
        assert!(source.contains("#include \"df/profession.h\""));
        let proto = std::fs::read_to_string(dir.path().join("unit.proto")).expect("read");
        assert!(proto.contains("import \"profession.proto\";"));
        assert!(!dir.path().join("broken.proto").exists());
    }
}
