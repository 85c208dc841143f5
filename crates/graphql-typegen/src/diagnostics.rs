use crate::LineIndex;
use apollo_compiler::validation::DiagnosticList;
use graphql_extract::{position_from_offset, Position, PositionResolver};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An error pinned to a byte range of an original source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedError {
    pub message: String,

    pub file_name: PathBuf,

    /// Full text of `file_name`; `start` and `end` index into it
    #[serde(skip)]
    pub content: Arc<str>,

    pub start: usize,
    pub end: usize,
}

impl LocatedError {
    pub fn new(
        message: impl Into<String>,
        file_name: impl Into<PathBuf>,
        content: Arc<str>,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            message: message.into(),
            file_name: file_name.into(),
            content,
            start,
            end,
        }
    }

    #[must_use]
    pub fn start_position(&self) -> Position {
        position_from_offset(&self.content, self.start)
    }

    #[must_use]
    pub fn end_position(&self) -> Position {
        position_from_offset(&self.content, self.end)
    }

    /// `path:line:column` with 1-based line and column, path relative to `root`
    /// when possible
    #[must_use]
    pub fn display_location(&self, root: &Path) -> String {
        let position = self.start_position();
        let path = self.file_name.strip_prefix(root).unwrap_or(&self.file_name);
        format!(
            "{}:{}:{}",
            path.display(),
            position.line + 1,
            position.column + 1
        )
    }
}

/// Translate compiler diagnostics on `parsed_text` into errors on the
/// original file.
///
/// Only the first `literal_len` bytes of `parsed_text` belong to the literal;
/// diagnostics starting past them are dropped, as are diagnostics that start
/// or end inside an interpolation.
pub(crate) fn locate_diagnostics(
    diagnostics: &DiagnosticList,
    parsed_text: &str,
    literal_len: usize,
    resolver: &PositionResolver,
    file_name: &Path,
    content: &Arc<str>,
) -> Vec<LocatedError> {
    let index = LineIndex::new(parsed_text);
    let mut located = Vec::new();

    for diagnostic in diagnostics.iter() {
        let message = diagnostic.error.to_string();

        // apollo-compiler reports 1-based lines and character columns
        let (start, end) = diagnostic
            .line_column_range()
            .and_then(|range| {
                let start = index.char_position_to_offset(
                    range.start.line.saturating_sub(1),
                    range.start.column.saturating_sub(1),
                )?;
                let end = index.char_position_to_offset(
                    range.end.line.saturating_sub(1),
                    range.end.column.saturating_sub(1),
                )?;
                Some((start, end.max(start)))
            })
            .unwrap_or((0, literal_len));

        if start > literal_len {
            continue;
        }

        let start = resolver.resolve(start);
        let end = resolver.resolve(end.min(literal_len));
        if start.is_in_other_expression || end.is_in_other_expression {
            tracing::debug!(%message, "Dropping diagnostic inside an interpolation");
            continue;
        }

        located.push(LocatedError::new(
            message,
            file_name,
            Arc::clone(content),
            start.pos,
            end.pos,
        ));
    }

    located
}
