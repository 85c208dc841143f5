use crate::diagnostics::locate_diagnostics;
use crate::{LocatedError, Result, TypegenError};
use apollo_compiler::ast;
use graphql_config::ProjectConfig;
use graphql_extract::{extract_from_source, ExtractConfig, Language, PositionResolver, TextSpan};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One GraphQL literal found in a source file, parsed
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub file_name: PathBuf,

    /// Full text of `file_name`
    pub source: Arc<str>,

    /// The literal in `source`, backticks included
    pub literal: TextSpan,

    /// The GraphQL text that was parsed
    pub text: String,

    /// Present iff `text` parsed without errors
    pub document: Option<ast::Document>,

    pub resolver: PositionResolver,

    /// Syntax errors, located in `source`
    pub parse_errors: Vec<LocatedError>,
}

/// Finds document files for a project and turns their literals into
/// [`ExtractionResult`]s
pub struct Extractor {
    patterns: Vec<String>,
    base_path: Option<PathBuf>,
    extract_config: ExtractConfig,
}

impl Extractor {
    #[must_use]
    pub fn new(extract_config: ExtractConfig) -> Self {
        Self {
            patterns: Vec::new(),
            base_path: None,
            extract_config,
        }
    }

    /// Document patterns and tag taken from a project configuration
    pub fn from_project(project: &ProjectConfig) -> Result<Self> {
        let typegen = project.typegen()?;
        let patterns = project
            .documents
            .as_ref()
            .map(|documents| documents.patterns().into_iter().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self {
            patterns,
            base_path: None,
            extract_config: ExtractConfig::for_tag(typegen.tag),
        })
    }

    #[must_use]
    pub fn with_base_path(mut self, path: impl AsRef<Path>) -> Self {
        self.base_path = Some(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.patterns = patterns;
        self
    }

    #[must_use]
    pub const fn extract_config(&self) -> &ExtractConfig {
        &self.extract_config
    }

    /// All files matched by the document patterns, sorted and deduplicated.
    /// Generated output and `node_modules` are never included.
    pub fn find_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for pattern in &self.patterns {
            // glob has no brace support, so `**/*.{ts,tsx}` is expanded first
            for expanded_pattern in expand_braces(pattern) {
                let full_pattern = self.base_path.as_ref().map_or_else(
                    || expanded_pattern.clone(),
                    |base| base.join(&expanded_pattern).display().to_string(),
                );

                let entries = glob::glob(&full_pattern).map_err(|e| {
                    TypegenError::DocumentLoad(format!("Invalid glob pattern: {e}"))
                })?;

                for entry in entries {
                    let path =
                        entry.map_err(|e| TypegenError::DocumentLoad(format!("Glob error: {e}")))?;
                    if path.is_file() && !is_excluded(&path) {
                        files.push(path);
                    }
                }
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Extract every literal of every matched file, in file order.
    ///
    /// A file that cannot be read or parsed is logged and skipped; the other
    /// files are still extracted.
    pub fn extract_all(&self) -> Result<Vec<ExtractionResult>> {
        let mut results = Vec::new();
        for path in self.find_files()? {
            match self.extract_file(&path) {
                Ok(file_results) => results.extend(file_results),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Skipping file: {e}");
                }
            }
        }
        Ok(results)
    }

    pub fn extract_file(&self, path: &Path) -> Result<Vec<ExtractionResult>> {
        let Some(language) = Language::from_path(path) else {
            tracing::debug!(path = %path.display(), "Skipping file with unknown language");
            return Ok(Vec::new());
        };

        let source = std::fs::read_to_string(path)?;
        self.extract_source(path, &source, language)
    }

    pub fn extract_source(
        &self,
        file_name: &Path,
        source: &str,
        language: Language,
    ) -> Result<Vec<ExtractionResult>> {
        let content: Arc<str> = Arc::from(source);
        let literals = extract_from_source(source, language, &self.extract_config)?;

        Ok(literals
            .into_iter()
            .map(|literal| {
                let (document, parse_errors) =
                    match ast::Document::parse(literal.source.as_str(), file_name) {
                        Ok(document) => (Some(document), Vec::new()),
                        Err(with_errors) => {
                            let errors = locate_diagnostics(
                                &with_errors.errors,
                                &literal.source,
                                literal.source.len(),
                                &literal.resolver,
                                file_name,
                                &content,
                            );
                            (None, errors)
                        }
                    };

                ExtractionResult {
                    file_name: file_name.to_path_buf(),
                    source: Arc::clone(&content),
                    literal: literal.literal,
                    text: literal.source,
                    document,
                    resolver: literal.resolver,
                    parse_errors,
                }
            })
            .collect())
    }
}

fn is_excluded(path: &Path) -> bool {
    path.components().any(|component| {
        let name = component.as_os_str();
        name == "node_modules" || name == "__generated__"
    })
}

/// Expand brace patterns like {ts,tsx} into multiple patterns
fn expand_braces(pattern: &str) -> Vec<String> {
    if let Some(start) = pattern.find('{') {
        if let Some(end) = pattern[start..].find('}').map(|end| start + end) {
            let before = &pattern[..start];
            let after = &pattern[end + 1..];
            let options = &pattern[start + 1..end];

            return options
                .split(',')
                .flat_map(|opt| expand_braces(&format!("{before}{opt}{after}")))
                .collect();
        }
    }

    vec![pattern.to_string()]
}
