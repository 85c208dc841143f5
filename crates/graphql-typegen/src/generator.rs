use crate::classify::{classify, Classification};
use crate::compiler::{CompileError, DocumentCompiler};
use crate::{ExtractionResult, LocatedError, ModulePrinter, Result, TypegenError};
use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use heck::ToKebabCase;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const GENERATED_DIR: &str = "__generated__";

pub const COMPLEX_DOCUMENT_MESSAGE: &str = "This document node has complex operations.";

/// A generated declaration module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub file_name: PathBuf,
    pub content: String,
}

/// Everything one generation pass produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypegenOutput {
    pub errors: Vec<LocatedError>,
    pub outputs: Vec<GeneratedFile>,
}

/// Turns extracted literals into generated files.
///
/// A failing literal never stops the others: recoverable problems are
/// collected in [`TypegenOutput::errors`] next to every file that could be
/// generated. Only [`CompileError::Internal`] aborts the pass.
pub struct TypeGenerator<C> {
    project_root: PathBuf,
    compiler: C,
    printer: ModulePrinter,
    output_extension: String,
}

impl<C: DocumentCompiler> TypeGenerator<C> {
    pub fn new(project_root: impl Into<PathBuf>, compiler: C) -> Self {
        Self {
            project_root: project_root.into(),
            compiler,
            printer: ModulePrinter::new(),
            output_extension: ".ts".to_string(),
        }
    }

    #[must_use]
    pub fn with_output_extension(mut self, extension: impl Into<String>) -> Self {
        self.output_extension = extension.into();
        self
    }

    pub fn generate(
        &self,
        results: &[ExtractionResult],
        schema: &Valid<Schema>,
    ) -> Result<TypegenOutput> {
        let mut output = TypegenOutput::default();

        for result in results {
            let Some(document) = &result.document else {
                continue;
            };

            let classification = classify(document);
            if classification == Classification::Complex {
                output.errors.push(LocatedError::new(
                    COMPLEX_DOCUMENT_MESSAGE,
                    &result.file_name,
                    Arc::clone(&result.source),
                    result.literal.start,
                    result.literal.end,
                ));
                continue;
            }

            let Some(name) = classification.output_name() else {
                tracing::debug!(
                    file = %self.relative(&result.file_name).display(),
                    "Skipping literal without an operation or fragment name"
                );
                continue;
            };

            let file_name = self.output_path(&result.file_name, name);

            match self.compiler.compile(document, schema) {
                Ok(module) => {
                    tracing::debug!(
                        "Create type source file '{}' from '{}'.",
                        self.relative(&file_name).display(),
                        self.relative(&result.file_name).display()
                    );
                    output.outputs.push(GeneratedFile {
                        file_name,
                        content: self.printer.print(&module),
                    });
                }
                Err(CompileError::Codegen(error)) => {
                    let start = result.resolver.resolve(error.range.start);
                    let end = result.resolver.resolve(error.range.end);
                    if start.is_in_other_expression || end.is_in_other_expression {
                        tracing::debug!(
                            message = %error.message,
                            "Dropping error inside an interpolation"
                        );
                        continue;
                    }

                    output.errors.push(LocatedError::new(
                        error.message,
                        &result.file_name,
                        Arc::clone(&result.source),
                        start.pos,
                        end.pos,
                    ));
                }
                Err(CompileError::Internal(message)) => {
                    return Err(TypegenError::Compiler {
                        file: result.file_name.clone(),
                        message,
                    });
                }
            }
        }

        Ok(output)
    }

    /// `<dir of source>/__generated__/<kebab-case name><ext>`, absolute
    #[must_use]
    pub fn output_path(&self, source_file: &Path, name: &str) -> PathBuf {
        let dir = source_file.parent().unwrap_or_else(|| Path::new(""));
        let path = dir
            .join(GENERATED_DIR)
            .join(format!("{}{}", name.to_kebab_case(), self.output_extension));

        if path.is_absolute() {
            path
        } else {
            self.project_root.join(path)
        }
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.project_root).unwrap_or(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeScriptCompiler;

    #[test]
    fn test_output_path() {
        let generator = TypeGenerator::new("/repo", TypeScriptCompiler::new());

        assert_eq!(
            generator.output_path(Path::new("/repo/src/a.ts"), "GetUser"),
            PathBuf::from("/repo/src/__generated__/get-user.ts")
        );
        assert_eq!(
            generator.output_path(Path::new("src/a.ts"), "UserFields"),
            PathBuf::from("/repo/src/__generated__/user-fields.ts")
        );

        let generator = generator.with_output_extension(".d.ts");
        assert_eq!(
            generator.output_path(Path::new("/repo/a.ts"), "Foo"),
            PathBuf::from("/repo/__generated__/foo.d.ts")
        );
    }
}
