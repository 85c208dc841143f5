use crate::position::{PositionResolver, Splice};
use crate::scanner::{self, Piece, RawLiteral};
use crate::source_location::position_from_offset;
use crate::{ExtractError, Language, Range, Result, SourceLocation, TextSpan};
use std::fs;
use std::path::Path;

/// Interpolations of other literals are followed at most this deep
const MAX_INTERPOLATION_DEPTH: usize = 16;

/// Configuration for GraphQL extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Magic comment to look for (default: "GraphQL")
    /// Matches comments like: /* GraphQL */ `query { ... }`
    pub magic_comment: String,

    /// Tag identifiers to extract (default: ["gql", "graphql"])
    /// Matches: gql`query { ... }` or graphql`query { ... }`
    pub tag_identifiers: Vec<String>,

    /// Remove the common leading indentation of literal lines
    pub strip_indentation: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            magic_comment: "GraphQL".to_string(),
            tag_identifiers: vec!["gql".to_string(), "graphql".to_string()],
            strip_indentation: true,
        }
    }
}

impl ExtractConfig {
    /// Only recognise literals tagged with `tag`
    #[must_use]
    pub fn for_tag(tag: impl Into<String>) -> Self {
        Self {
            tag_identifiers: vec![tag.into()],
            ..Self::default()
        }
    }
}

/// Extracted GraphQL content with source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedGraphQL {
    /// The extracted GraphQL source code
    pub source: String,

    /// The whole literal in the original file, backticks included
    pub literal: TextSpan,

    /// Source location of the literal content in the original file
    pub location: SourceLocation,

    /// The tag name used (e.g., "gql", "graphql"), if any
    pub tag_name: Option<String>,

    /// Maps offsets in `source` back to the original file
    pub resolver: PositionResolver,
}

impl ExtractedGraphQL {
    /// Whether an offset in the original file lands in this literal's content
    #[must_use]
    pub fn contains(&self, original_offset: usize) -> bool {
        self.resolver.to_extracted(original_offset).is_some()
    }
}

/// Extract GraphQL from a file
pub fn extract_from_file(path: &Path, config: &ExtractConfig) -> Result<Vec<ExtractedGraphQL>> {
    let language = Language::from_path(path)
        .ok_or_else(|| ExtractError::UnsupportedFileType(path.to_path_buf()))?;

    let source = fs::read_to_string(path)?;
    extract_from_source(&source, language, config)
}

/// Extract GraphQL from source code string
pub fn extract_from_source(
    source: &str,
    language: Language,
    config: &ExtractConfig,
) -> Result<Vec<ExtractedGraphQL>> {
    match language {
        Language::GraphQL => Ok(vec![ExtractedGraphQL {
            source: source.to_string(),
            literal: TextSpan::new(0, source.len()),
            location: location_of(source, 0, source.len()),
            tag_name: None,
            resolver: PositionResolver::identity(0, source.len()),
        }]),
        Language::TypeScript | Language::JavaScript => {
            let literals = scanner::scan(source, language, config)?;
            let builder = LiteralBuilder {
                source,
                literals: &literals,
                strip_indentation: config.strip_indentation,
            };

            Ok(literals
                .iter()
                .enumerate()
                .map(|(index, literal)| {
                    let built = builder.build(index, &mut Vec::new());
                    let content = TextSpan::new(literal.span.start + 1, literal.span.end - 1);

                    ExtractedGraphQL {
                        source: built.text,
                        literal: literal.span,
                        location: location_of(source, content.start, content.end),
                        tag_name: literal.tag_name.clone(),
                        resolver: PositionResolver::new(content.start, content.end, built.splices),
                    }
                })
                .collect())
        }
    }
}

/// The literal whose content contains `offset`, if any
pub fn find_literal_at(
    source: &str,
    language: Language,
    config: &ExtractConfig,
    offset: usize,
) -> Result<Option<ExtractedGraphQL>> {
    Ok(extract_from_source(source, language, config)?
        .into_iter()
        .find(|literal| literal.contains(offset)))
}

fn location_of(source: &str, start: usize, end: usize) -> SourceLocation {
    SourceLocation::new(
        start,
        end - start,
        Range::new(
            position_from_offset(source, start),
            position_from_offset(source, end),
        ),
    )
}

struct Built {
    text: String,
    splices: Vec<Splice>,
}

struct LiteralBuilder<'a> {
    source: &'a str,
    literals: &'a [RawLiteral],
    strip_indentation: bool,
}

impl LiteralBuilder<'_> {
    fn build(&self, index: usize, visiting: &mut Vec<usize>) -> Built {
        let literal = &self.literals[index];
        visiting.push(index);

        let indent = if self.strip_indentation {
            common_indent(self.source, &literal.pieces)
        } else {
            0
        };

        let mut text = String::new();
        let mut splices = Vec::new();
        let mut at_line_start = false;

        for piece in &literal.pieces {
            match piece {
                Piece::Text(span) => {
                    let raw = &self.source[span.start..span.end];
                    let bytes = raw.as_bytes();
                    let mut i = 0;

                    while i < bytes.len() {
                        if at_line_start {
                            at_line_start = false;
                            let strip = bytes[i..]
                                .iter()
                                .take(indent)
                                .take_while(|b| **b == b' ' || **b == b'\t')
                                .count();
                            if strip > 0 {
                                splices.push(Splice::stripped(text.len(), 0, strip));
                                i += strip;
                                continue;
                            }
                        }

                        if bytes[i] == b'\\' && matches!(bytes.get(i + 1), Some(b'`' | b'\\' | b'$')) {
                            splices.push(Splice::stripped(text.len(), 1, 2));
                            text.push(char::from(bytes[i + 1]));
                            i += 2;
                            continue;
                        }

                        let Some(ch) = raw[i..].chars().next() else {
                            break;
                        };
                        text.push(ch);
                        i += ch.len_utf8();
                        at_line_start = ch == '\n';
                    }
                }
                Piece::Interpolation { span, expression } => {
                    let replacement = self
                        .interpolated_literal(*expression, visiting)
                        .unwrap_or_else(|| " ".repeat(span.len()));
                    splices.push(Splice::interpolation(text.len(), replacement.len(), span.len()));
                    text.push_str(&replacement);
                    at_line_start = false;
                }
            }
        }

        visiting.pop();
        Built { text, splices }
    }

    /// Text of another literal in the same file bound to the identifier
    /// `expression`, e.g. `${UserFields}`.
    fn interpolated_literal(&self, expression: TextSpan, visiting: &mut Vec<usize>) -> Option<String> {
        if visiting.len() >= MAX_INTERPOLATION_DEPTH {
            return None;
        }

        let name = self.source[expression.start..expression.end].trim();
        let target = self.literals.iter().enumerate().position(|(index, literal)| {
            literal.binding.as_deref() == Some(name) && !visiting.contains(&index)
        })?;

        Some(self.build(target, visiting).text)
    }
}

/// Smallest leading whitespace of the non-blank lines after the first.
///
/// A line whose only content is an interpolation counts as non-blank; the line
/// holding the closing backtick does not.
fn common_indent(source: &str, pieces: &[Piece]) -> usize {
    let mut indent: Option<usize> = None;

    for (index, piece) in pieces.iter().enumerate() {
        let Piece::Text(span) = piece else {
            continue;
        };
        let raw = &source[span.start..span.end];
        let followed_by_interpolation =
            matches!(pieces.get(index + 1), Some(Piece::Interpolation { .. }));

        for (newline, _) in raw.match_indices('\n') {
            let line = &raw.as_bytes()[newline + 1..];
            let width = line
                .iter()
                .take_while(|b| **b == b' ' || **b == b'\t')
                .count();
            let blank = match line.get(width) {
                Some(b'\n' | b'\r') => true,
                Some(_) => false,
                None => !followed_by_interpolation,
            };
            if !blank {
                indent = Some(indent.map_or(width, |current| current.min(width)));
            }
        }
    }

    indent.unwrap_or(0)
}
