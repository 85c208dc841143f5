use crate::service::{QuickInfo, ScriptSourceHelper, ServiceDiagnostic};
use arc_swap::ArcSwap;
use graphql_extract::{ExtractConfig, Language, TextSpan};
use graphql_typegen::{
    classify, Classification, CompletionItem, CompletionProvider, ExtractionResult, Extractor,
    FragmentCandidate, HoverProvider, LocatedError, Schema, Valid, Validator,
};
use std::path::Path;
use std::sync::Arc;

/// The schema the adapter answers with, replaced as a whole
#[derive(Debug, Default)]
pub enum SchemaState {
    /// Nothing loaded yet
    #[default]
    Pending,
    Ready(Arc<Valid<Schema>>),
    /// Loading failed; the message is reported on every literal
    Failed(String),
}

/// Answers completion, diagnostics and quick info for GraphQL literals and
/// falls through to the host delegate everywhere else.
pub struct GraphQLLanguageServiceAdapter<H> {
    helper: H,
    extractor: Extractor,
    schema: ArcSwap<SchemaState>,
}

impl<H: ScriptSourceHelper> GraphQLLanguageServiceAdapter<H> {
    pub fn new(helper: H, extract_config: ExtractConfig) -> Self {
        Self {
            helper,
            extractor: Extractor::new(extract_config),
            schema: ArcSwap::from_pointee(SchemaState::Pending),
        }
    }

    /// Replace the active schema. Requests in flight keep the one they started with.
    pub fn update_schema(&self, schema: std::result::Result<Valid<Schema>, String>) {
        let state = match schema {
            Ok(schema) => SchemaState::Ready(Arc::new(schema)),
            Err(message) => {
                tracing::warn!(%message, "Schema is unavailable");
                SchemaState::Failed(message)
            }
        };
        self.schema.store(Arc::new(state));
    }

    #[must_use]
    pub fn schema_state(&self) -> Arc<SchemaState> {
        self.schema.load_full()
    }

    pub fn get_completion_at_position<D>(
        &self,
        delegate: D,
        file_name: &Path,
        position: usize,
    ) -> Vec<CompletionItem>
    where
        D: FnOnce(&Path, usize) -> Vec<CompletionItem>,
    {
        let state = self.schema_state();
        let SchemaState::Ready(schema) = state.as_ref() else {
            return delegate(file_name, position);
        };

        let Some(results) = self.extract(file_name) else {
            return delegate(file_name, position);
        };
        let Some((result, offset)) = literal_at(&results, position) else {
            return delegate(file_name, position);
        };

        let fragments = fragment_candidates(&results);
        CompletionProvider::new(schema, &fragments)
            .complete(&result.text, offset)
            .unwrap_or_default()
    }

    pub fn get_semantic_diagnostics<D>(&self, delegate: D, file_name: &Path) -> Vec<ServiceDiagnostic>
    where
        D: FnOnce(&Path) -> Vec<ServiceDiagnostic>,
    {
        let mut diagnostics = delegate(file_name);

        let Some(results) = self.extract(file_name) else {
            return diagnostics;
        };

        let state = self.schema_state();
        let validator = match state.as_ref() {
            SchemaState::Ready(schema) => Some(Validator::new(schema).with_fragments(&results)),
            SchemaState::Pending | SchemaState::Failed(_) => None,
        };

        for result in &results {
            let errors = match (&validator, state.as_ref()) {
                (Some(validator), _) => validator.validate(result),
                (None, SchemaState::Failed(message)) => vec![LocatedError::new(
                    message.clone(),
                    &result.file_name,
                    Arc::clone(&result.source),
                    result.literal.start,
                    result.literal.end,
                )],
                (None, _) => result.parse_errors.clone(),
            };
            diagnostics.extend(errors.into_iter().map(ServiceDiagnostic::from));
        }

        diagnostics
    }

    pub fn get_quick_info_at_position<D>(
        &self,
        delegate: D,
        file_name: &Path,
        position: usize,
    ) -> Option<QuickInfo>
    where
        D: FnOnce(&Path, usize) -> Option<QuickInfo>,
    {
        let state = self.schema_state();
        let SchemaState::Ready(schema) = state.as_ref() else {
            return delegate(file_name, position);
        };

        let Some(results) = self.extract(file_name) else {
            return delegate(file_name, position);
        };
        let Some((result, offset)) = literal_at(&results, position) else {
            return delegate(file_name, position);
        };

        // Punctuation and other spots without schema information stay with the host
        let Some(hover) = HoverProvider::new(schema).hover(&result.text, offset) else {
            return delegate(file_name, position);
        };
        let start = result.resolver.resolve(hover.range.start);
        let end = result.resolver.resolve(hover.range.end);
        if start.is_in_other_expression || end.is_in_other_expression {
            return delegate(file_name, position);
        }

        Some(QuickInfo {
            contents: hover.contents,
            span: TextSpan::new(start.pos, end.pos),
        })
    }

    /// Every literal in the file, or `None` when the file is not one we read
    fn extract(&self, file_name: &Path) -> Option<Vec<ExtractionResult>> {
        let language = Language::from_path(file_name)?;
        let source = self.helper.source_text(file_name)?;

        match self.extractor.extract_source(file_name, &source, language) {
            Ok(results) if !results.is_empty() => Some(results),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(file = %file_name.display(), "Extraction failed: {e}");
                None
            }
        }
    }
}

/// The literal whose content holds `position`, with the offset in its text
fn literal_at(results: &[ExtractionResult], position: usize) -> Option<(&ExtractionResult, usize)> {
    results.iter().find_map(|result| {
        if !result.literal.touches(position) {
            return None;
        }
        let offset = result.resolver.to_extracted(position)?;
        Some((result, offset))
    })
}

fn fragment_candidates(results: &[ExtractionResult]) -> Vec<FragmentCandidate> {
    results
        .iter()
        .filter_map(|result| {
            let document = result.document.as_ref()?;
            let Classification::Fragment { name } = classify(document) else {
                return None;
            };
            let type_condition = document.definitions.iter().find_map(|definition| {
                match definition {
                    apollo_compiler::ast::Definition::FragmentDefinition(fragment) => {
                        Some(fragment.type_condition.to_string())
                    }
                    _ => None,
                }
            })?;
            Some(FragmentCandidate {
                name,
                type_condition,
            })
        })
        .collect()
}
