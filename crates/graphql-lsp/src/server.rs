use crate::adapter::GraphQLLanguageServiceAdapter;
use crate::proxy::LanguageServiceProxy;
use crate::service::{LanguageService, QuickInfo, ScriptSourceHelper, ServiceDiagnostic, Severity};
use anyhow::Context;
use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use graphql_config::{find_config, load_config};
use graphql_extract::ExtractConfig;
use graphql_typegen::{CompletionItem, CompletionItemKind, LineIndex, SchemaLoader};
use lsp_types::{
    CompletionItemTag, CompletionOptions, CompletionParams, CompletionResponse, Diagnostic,
    DiagnosticSeverity, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams, Documentation, Hover, HoverContents,
    HoverParams, HoverProviderCapability, InitializeParams, InitializeResult, InitializedParams,
    MarkupContent, MarkupKind, MessageType, Position, Range, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind, Uri,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::{Client, LanguageServer, UriExt};

/// Text of open documents, falling back to the file on disk.
///
/// Also serves as the host language service, which has nothing of its own to
/// add outside GraphQL literals.
#[derive(Clone, Default)]
pub struct OpenDocuments {
    documents: Arc<DashMap<PathBuf, Arc<str>>>,
}

impl OpenDocuments {
    pub fn open(&self, path: PathBuf, text: &str) {
        self.documents.insert(path, Arc::from(text));
    }

    pub fn close(&self, path: &Path) {
        self.documents.remove(path);
    }

    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.documents.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl ScriptSourceHelper for OpenDocuments {
    fn source_text(&self, file_name: &Path) -> Option<Arc<str>> {
        if let Some(text) = self.documents.get(file_name) {
            return Some(Arc::clone(text.value()));
        }
        std::fs::read_to_string(file_name).ok().map(Arc::from)
    }
}

impl LanguageService for OpenDocuments {
    fn completions_at_position(&self, _file_name: &Path, _position: usize) -> Vec<CompletionItem> {
        Vec::new()
    }

    fn semantic_diagnostics(&self, _file_name: &Path) -> Vec<ServiceDiagnostic> {
        Vec::new()
    }

    fn quick_info_at_position(&self, _file_name: &Path, _position: usize) -> Option<QuickInfo> {
        None
    }
}

/// Everything loaded for the workspace project
struct ProjectState {
    name: String,
    loader: SchemaLoader,
    schema_files: Vec<PathBuf>,
    proxy: LanguageServiceProxy<OpenDocuments, OpenDocuments>,
}

pub struct GraphQLLanguageServer {
    client: Client,
    /// Workspace folders from initialization, loaded once the client is ready
    init_workspace_folders: Arc<DashMap<String, PathBuf>>,
    documents: OpenDocuments,
    project: ArcSwapOption<ProjectState>,
}

impl GraphQLLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            init_workspace_folders: Arc::new(DashMap::new()),
            documents: OpenDocuments::default(),
            project: ArcSwapOption::empty(),
        }
    }

    /// Load the first project of the workspace's GraphQL config
    async fn load_workspace_config(&self, workspace_path: &Path) -> anyhow::Result<()> {
        tracing::info!("Loading GraphQL config from {:?}", workspace_path);

        let config_path = find_config(workspace_path)?
            .context("No graphql config found. Place a .graphqlrc.yml in your workspace root.")?;
        let config = load_config(&config_path)?;

        let (name, project) = config
            .projects()
            .into_iter()
            .next()
            .context("GraphQL config defines no project")?;
        let typegen = project.typegen()?;

        let loader = SchemaLoader::new(project.schema.clone()).with_base_path(workspace_path);
        let schema_files = loader
            .paths()
            .unwrap_or_default()
            .into_iter()
            .map(|path| path.canonicalize().unwrap_or(path))
            .collect();

        let adapter = Arc::new(GraphQLLanguageServiceAdapter::new(
            self.documents.clone(),
            ExtractConfig::for_tag(typegen.tag),
        ));
        adapter.update_schema(loader.load().await.map_err(|e| e.to_string()));

        tracing::info!("Loaded GraphQL project '{name}'");
        self.project.store(Some(Arc::new(ProjectState {
            name: name.to_string(),
            loader,
            schema_files,
            proxy: LanguageServiceProxy::new(self.documents.clone(), adapter),
        })));

        Ok(())
    }

    async fn reload_schema(&self, project: &ProjectState) {
        let schema = project.loader.load().await.map_err(|e| e.to_string());
        match &schema {
            Ok(_) => tracing::info!("Reloaded schema for project '{}'", project.name),
            Err(e) => {
                self.client
                    .log_message(
                        MessageType::ERROR,
                        format!("Failed to load schema for project '{}': {e}", project.name),
                    )
                    .await;
            }
        }
        project.proxy.adapter().update_schema(schema);
    }

    /// Diagnostics for one document, converted to LSP positions
    async fn publish_diagnostics(&self, uri: Uri) {
        let Some(path) = uri.to_file_path().map(|path| path.into_owned()) else {
            return;
        };
        let Some(project) = self.project.load_full() else {
            tracing::debug!("No project loaded yet, skipping {:?}", uri);
            return;
        };
        let Some(text) = self.documents.source_text(&path) else {
            return;
        };

        let index = LineIndex::new(&text);
        let diagnostics = project
            .proxy
            .semantic_diagnostics(&path)
            .into_iter()
            .map(|diagnostic| to_lsp_diagnostic(&index, diagnostic))
            .collect();

        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    /// Project, file path and byte offset for a cursor request
    fn resolve_request(
        &self,
        uri: &Uri,
        position: Position,
    ) -> Option<(Arc<ProjectState>, PathBuf, usize)> {
        let project = self.project.load_full()?;
        let path = uri.to_file_path()?.into_owned();
        let text = self.documents.source_text(&path)?;
        let offset = LineIndex::new(&text).position_to_offset(graphql_extract::Position::new(
            position.line as usize,
            position.character as usize,
        ))?;
        Some((project, path, offset))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_lsp_position(position: graphql_extract::Position) -> Position {
    Position {
        line: position.line as u32,
        character: position.column as u32,
    }
}

fn to_lsp_range(index: &LineIndex, start: usize, end: usize) -> Range {
    Range {
        start: to_lsp_position(index.offset_to_position(start)),
        end: to_lsp_position(index.offset_to_position(end)),
    }
}

fn to_lsp_diagnostic(index: &LineIndex, diagnostic: ServiceDiagnostic) -> Diagnostic {
    Diagnostic {
        range: to_lsp_range(index, diagnostic.start, diagnostic.end),
        severity: Some(match diagnostic.severity {
            Severity::Error => DiagnosticSeverity::ERROR,
            Severity::Warning => DiagnosticSeverity::WARNING,
        }),
        source: diagnostic.source,
        message: diagnostic.message,
        ..Default::default()
    }
}

fn to_lsp_completion(item: CompletionItem) -> lsp_types::CompletionItem {
    let kind = match item.kind {
        CompletionItemKind::Field => lsp_types::CompletionItemKind::FIELD,
        CompletionItemKind::Type => lsp_types::CompletionItemKind::CLASS,
        CompletionItemKind::Fragment => lsp_types::CompletionItemKind::SNIPPET,
        CompletionItemKind::Directive => lsp_types::CompletionItemKind::KEYWORD,
        CompletionItemKind::Argument => lsp_types::CompletionItemKind::PROPERTY,
    };

    lsp_types::CompletionItem {
        label: item.label,
        kind: Some(kind),
        detail: item.detail,
        documentation: item.documentation.map(Documentation::String),
        tags: item.deprecated.then(|| vec![CompletionItemTag::DEPRECATED]),
        insert_text: item.insert_text,
        ..Default::default()
    }
}

impl LanguageServer for GraphQLLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("Initializing GraphQL Language Server");

        if let Some(ref folders) = params.workspace_folders {
            tracing::info!("Workspace folders: {} folders", folders.len());
            for folder in folders {
                if let Some(path) = folder.uri.to_file_path() {
                    self.init_workspace_folders
                        .insert(folder.uri.to_string(), path.into_owned());
                }
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![
                        ".".to_string(),
                        "{".to_string(),
                        "@".to_string(),
                        "(".to_string(),
                    ]),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "GraphQL Language Server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        tracing::info!("GraphQL Language Server initialized");

        let folders: Vec<_> = self
            .init_workspace_folders
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for path in folders {
            match self.load_workspace_config(&path).await {
                Ok(()) => {
                    self.client
                        .log_message(MessageType::INFO, "GraphQL config loaded successfully")
                        .await;
                    break;
                }
                Err(e) => {
                    tracing::warn!("Failed to load GraphQL config from {:?}: {e:#}", path);
                    self.client
                        .log_message(MessageType::WARNING, format!("{e:#}"))
                        .await;
                }
            }
        }

        for path in self.documents.paths() {
            if let Some(uri) = Uri::from_file_path(&path) {
                self.publish_diagnostics(uri).await;
            }
        }
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down GraphQL Language Server");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!("Document opened: {:?}", uri);

        if let Some(path) = uri.to_file_path() {
            self.documents
                .open(path.into_owned(), &params.text_document.text);
        }
        self.publish_diagnostics(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::debug!("Document changed: {:?}", uri);

        // Full sync: the last change holds the whole text
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        if let Some(path) = uri.to_file_path() {
            self.documents.open(path.into_owned(), &change.text);
        }
        self.publish_diagnostics(uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!("Document saved: {:?}", uri);

        let Some(project) = self.project.load_full() else {
            return;
        };
        let Some(path) = uri.to_file_path() else {
            return;
        };
        let path = path.canonicalize().unwrap_or_else(|_| path.into_owned());
        if !project.schema_files.contains(&path) {
            return;
        }

        self.reload_schema(&project).await;
        for open in self.documents.paths() {
            if let Some(uri) = Uri::from_file_path(&open) {
                self.publish_diagnostics(uri).await;
            }
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!("Document closed: {:?}", uri);

        if let Some(path) = uri.to_file_path() {
            self.documents.close(&path);
        }
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position;
        tracing::debug!("Completion requested: {:?}", position.text_document.uri);

        let Some((project, path, offset)) =
            self.resolve_request(&position.text_document.uri, position.position)
        else {
            return Ok(None);
        };

        let items: Vec<_> = project
            .proxy
            .completions_at_position(&path, offset)
            .into_iter()
            .map(to_lsp_completion)
            .collect();

        Ok((!items.is_empty()).then_some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        tracing::debug!("Hover requested: {:?}", position.text_document.uri);

        let Some((project, path, offset)) =
            self.resolve_request(&position.text_document.uri, position.position)
        else {
            return Ok(None);
        };
        let Some(info) = project.proxy.quick_info_at_position(&path, offset) else {
            return Ok(None);
        };
        let Some(text) = self.documents.source_text(&path) else {
            return Ok(None);
        };

        let index = LineIndex::new(&text);
        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: info.contents,
            }),
            range: Some(to_lsp_range(&index, info.span.start, info.span.end)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_documents_prefer_editor_text() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("a.ts");
        std::fs::write(&path, "on disk").unwrap();

        let documents = OpenDocuments::default();
        assert_eq!(documents.source_text(&path).as_deref(), Some("on disk"));

        documents.open(path.clone(), "in editor");
        assert_eq!(documents.source_text(&path).as_deref(), Some("in editor"));

        documents.close(&path);
        assert_eq!(documents.source_text(&path).as_deref(), Some("on disk"));
    }

    #[test]
    fn test_diagnostic_positions_are_utf16() {
        let text = "const é = gql`query Q { bad }`;";
        let index = LineIndex::new(text);
        let start = text.find("bad").unwrap();

        let diagnostic = to_lsp_diagnostic(
            &index,
            ServiceDiagnostic {
                file_name: PathBuf::from("a.ts"),
                start,
                end: start + 3,
                message: "Cannot query field \"bad\" on type \"Query\".".to_string(),
                severity: Severity::Error,
                source: Some("graphql".to_string()),
            },
        );

        assert_eq!(diagnostic.range.start, Position { line: 0, character: 24 });
        assert_eq!(diagnostic.range.end, Position { line: 0, character: 27 });
        assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::ERROR));
    }

    #[test]
    fn test_deprecated_completion_is_tagged() {
        let mut item = CompletionItem::new("email", CompletionItemKind::Field).with_detail("String");
        item.deprecated = true;

        let converted = to_lsp_completion(item);
        assert_eq!(converted.kind, Some(lsp_types::CompletionItemKind::FIELD));
        assert_eq!(converted.tags, Some(vec![CompletionItemTag::DEPRECATED]));
        assert_eq!(converted.detail.as_deref(), Some("String"));
    }
}
