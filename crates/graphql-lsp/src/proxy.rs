use crate::adapter::GraphQLLanguageServiceAdapter;
use crate::service::{LanguageService, QuickInfo, ScriptSourceHelper, ServiceDiagnostic};
use graphql_typegen::CompletionItem;
use std::path::Path;
use std::sync::Arc;

/// Wraps a host language service, routing its three requests through the
/// adapter with the host's own answers as the delegate.
pub struct LanguageServiceProxy<S, H> {
    service: S,
    adapter: Arc<GraphQLLanguageServiceAdapter<H>>,
}

impl<S, H> LanguageServiceProxy<S, H> {
    pub const fn new(service: S, adapter: Arc<GraphQLLanguageServiceAdapter<H>>) -> Self {
        Self { service, adapter }
    }

    #[must_use]
    pub const fn adapter(&self) -> &Arc<GraphQLLanguageServiceAdapter<H>> {
        &self.adapter
    }
}

impl<S: LanguageService, H: ScriptSourceHelper> LanguageService for LanguageServiceProxy<S, H> {
    fn completions_at_position(&self, file_name: &Path, position: usize) -> Vec<CompletionItem> {
        self.adapter.get_completion_at_position(
            |file_name, position| self.service.completions_at_position(file_name, position),
            file_name,
            position,
        )
    }

    fn semantic_diagnostics(&self, file_name: &Path) -> Vec<ServiceDiagnostic> {
        self.adapter.get_semantic_diagnostics(
            |file_name| self.service.semantic_diagnostics(file_name),
            file_name,
        )
    }

    fn quick_info_at_position(&self, file_name: &Path, position: usize) -> Option<QuickInfo> {
        self.adapter.get_quick_info_at_position(
            |file_name, position| self.service.quick_info_at_position(file_name, position),
            file_name,
            position,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_extract::{ExtractConfig, TextSpan};
    use graphql_typegen::parse_schema;
    use std::collections::HashMap;
    use std::path::PathBuf;

    struct Host {
        files: HashMap<PathBuf, Arc<str>>,
    }

    impl ScriptSourceHelper for Host {
        fn source_text(&self, file_name: &Path) -> Option<Arc<str>> {
            self.files.get(file_name).cloned()
        }
    }

    struct HostService;

    impl LanguageService for HostService {
        fn completions_at_position(&self, _: &Path, _: usize) -> Vec<CompletionItem> {
            vec![CompletionItem::new("console", graphql_typegen::CompletionItemKind::Field)]
        }

        fn semantic_diagnostics(&self, _: &Path) -> Vec<ServiceDiagnostic> {
            Vec::new()
        }

        fn quick_info_at_position(&self, _: &Path, position: usize) -> Option<QuickInfo> {
            Some(QuickInfo {
                contents: "host".to_string(),
                span: TextSpan::new(position, position),
            })
        }
    }

    #[test]
    fn test_proxy_routes_through_adapter() {
        let source = "const n = 1;\nconst q = gql`query Q { viewer { id } }`;";
        let host = Host {
            files: HashMap::from([(PathBuf::from("/a.ts"), Arc::from(source))]),
        };
        let adapter = Arc::new(GraphQLLanguageServiceAdapter::new(host, ExtractConfig::default()));
        adapter.update_schema(Ok(parse_schema(
            "type Query { viewer: User! } type User { id: ID! }",
            "schema.graphql",
        )
        .unwrap()));
        let proxy = LanguageServiceProxy::new(HostService, Arc::clone(&adapter));
        let file = Path::new("/a.ts");

        // Outside the literal the host answers unchanged
        assert_eq!(proxy.completions_at_position(file, 2)[0].label, "console");
        assert_eq!(proxy.quick_info_at_position(file, 2).unwrap().contents, "host");

        // Inside it the schema does
        let id = source.find("id }").unwrap();
        let info = proxy.quick_info_at_position(file, id).unwrap();
        assert!(info.contents.contains("Field: `id`"));
        assert!(proxy.semantic_diagnostics(file).is_empty());
    }
}
