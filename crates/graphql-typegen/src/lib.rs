mod classify;
mod compiler;
mod completion;
mod diagnostics;
mod error;
mod extractor;
mod generator;
mod hover;
mod line_index;
mod module;
mod printer;
mod schema;
mod validation;

pub use classify::{classify, Classification};
pub use compiler::{CodegenError, CompileError, DocumentCompiler, TypeScriptCompiler};
pub use completion::{CompletionItem, CompletionItemKind, CompletionProvider, FragmentCandidate};
pub use diagnostics::LocatedError;
pub use error::{Result, TypegenError};
pub use extractor::{ExtractionResult, Extractor};
pub use generator::{
    GeneratedFile, TypeGenerator, TypegenOutput, COMPLEX_DOCUMENT_MESSAGE, GENERATED_DIR,
};
pub use hover::{HoverInfo, HoverProvider};
pub use line_index::LineIndex;
pub use module::{Keyword, Module, Property, TsType, TypeAlias};
pub use printer::ModulePrinter;
pub use schema::{build_schema, parse_schema, SchemaLoader};
pub use validation::Validator;

// Re-export common types from dependencies
pub use apollo_compiler::validation::Valid;
pub use apollo_compiler::Schema;
pub use graphql_config::{GraphQLConfig, ProjectConfig};
pub use graphql_extract::{ExtractConfig, Language, PositionResolver, SourcePosition, TextSpan};
