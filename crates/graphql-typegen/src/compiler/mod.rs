//! Compilers turn a parsed document into a declaration [`Module`].

mod typescript;

pub use typescript::TypeScriptCompiler;

use crate::module::Module;
use apollo_compiler::ast;
use apollo_compiler::validation::Valid;
use apollo_compiler::{Node, Schema};
use std::ops::Range;
use thiserror::Error;

/// Schema-aware compilation of one document.
///
/// Implementations must be pure: the same document and schema always give the
/// same module.
pub trait DocumentCompiler {
    fn compile(&self, document: &ast::Document, schema: &Valid<Schema>)
        -> Result<Module, CompileError>;
}

impl<T: DocumentCompiler + ?Sized> DocumentCompiler for &T {
    fn compile(
        &self,
        document: &ast::Document,
        schema: &Valid<Schema>,
    ) -> Result<Module, CompileError> {
        (**self).compile(document, schema)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The document cannot be compiled as written. Recoverable.
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// Anything else; aborts the whole generation pass
    #[error("{0}")]
    Internal(String),
}

/// A problem with a specific node of the document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CodegenError {
    pub message: String,
    /// Byte range of the node in the parsed document text
    pub range: Range<usize>,
}

impl CodegenError {
    pub fn new(message: impl Into<String>, range: Range<usize>) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }

    pub fn at<T>(node: &Node<T>, message: impl Into<String>) -> Self {
        Self::new(message, node_range(node))
    }
}

/// Byte range of a node, empty at 0 for synthesized nodes
pub(crate) fn node_range<T>(node: &Node<T>) -> Range<usize> {
    node.location()
        .map_or(0..0, |span| span.offset()..span.end_offset())
}
