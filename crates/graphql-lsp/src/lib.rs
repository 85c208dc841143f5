//! Live GraphQL feedback inside TypeScript and JavaScript files.
//!
//! [`GraphQLLanguageServiceAdapter`] answers completion, diagnostics and quick
//! info for positions inside GraphQL literals and hands every other position to
//! the host service. [`LanguageServiceProxy`] wires a host service through the
//! adapter, and [`GraphQLLanguageServer`] serves the result over LSP.

mod adapter;
mod proxy;
mod server;
mod service;

pub use adapter::{GraphQLLanguageServiceAdapter, SchemaState};
pub use proxy::LanguageServiceProxy;
pub use server::{GraphQLLanguageServer, OpenDocuments};
pub use service::{LanguageService, QuickInfo, ScriptSourceHelper, ServiceDiagnostic, Severity};
