//! The host side of the adapter: what an editor's language service can answer
//! for a file, with positions as byte offsets into the file text.

use graphql_extract::TextSpan;
use graphql_typegen::{CompletionItem, LocatedError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic for one file, located by byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDiagnostic {
    pub file_name: PathBuf,
    pub start: usize,
    pub end: usize,
    pub message: String,
    pub severity: Severity,
    pub source: Option<String>,
}

impl From<LocatedError> for ServiceDiagnostic {
    fn from(error: LocatedError) -> Self {
        Self {
            file_name: error.file_name,
            start: error.start,
            end: error.end,
            message: error.message,
            severity: Severity::Error,
            source: Some("graphql".to_string()),
        }
    }
}

/// Markdown shown for the element under the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickInfo {
    pub contents: String,
    pub span: TextSpan,
}

/// The three requests the adapter intercepts
pub trait LanguageService {
    fn completions_at_position(&self, file_name: &Path, position: usize) -> Vec<CompletionItem>;

    fn semantic_diagnostics(&self, file_name: &Path) -> Vec<ServiceDiagnostic>;

    fn quick_info_at_position(&self, file_name: &Path, position: usize) -> Option<QuickInfo>;
}

/// Current text of the files the host knows about
pub trait ScriptSourceHelper {
    fn source_text(&self, file_name: &Path) -> Option<Arc<str>>;
}

impl<T: ScriptSourceHelper + ?Sized> ScriptSourceHelper for Arc<T> {
    fn source_text(&self, file_name: &Path) -> Option<Arc<str>> {
        (**self).source_text(file_name)
    }
}
