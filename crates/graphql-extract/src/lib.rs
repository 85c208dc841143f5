mod error;
mod extractor;
mod language;
mod position;
mod scanner;
mod source_location;

pub use error::{ExtractError, Result};
pub use extractor::{
    extract_from_file, extract_from_source, find_literal_at, ExtractConfig, ExtractedGraphQL,
};
pub use language::Language;
pub use position::{resolve_position, PositionResolver, SourcePosition, Splice, SpliceKind};
pub use source_location::{position_from_offset, Position, Range, SourceLocation, TextSpan};
