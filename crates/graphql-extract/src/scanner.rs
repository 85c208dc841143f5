//! Finds GraphQL template literals in JavaScript and TypeScript.
//!
//! Sources are parsed with swc. A template counts as GraphQL when its tag is a
//! configured identifier or the magic comment sits right before it.

use crate::{ExtractConfig, ExtractError, Language, Result, TextSpan};
use std::collections::HashMap;
use swc_core::common::{BytePos, Spanned};
use swc_core::ecma::ast::{EsVersion, Expr, Pat, Program, TaggedTpl, Tpl, VarDeclarator};
use swc_core::ecma::parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_core::ecma::visit::{Visit, VisitWith};

/// swc reserves position 0, so the source is placed at 1
const START: u32 = 1;

/// A piece of a template literal body
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    /// Raw literal text, escapes still in place
    Text(TextSpan),
    /// A `${...}` region; `expression` excludes the delimiters
    Interpolation { span: TextSpan, expression: TextSpan },
}

/// A template literal recognised as GraphQL
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawLiteral {
    pub tag_name: Option<String>,
    /// Name the literal is assigned to (`const Name = gql`...``), if any
    pub binding: Option<String>,
    /// Opening backtick to closing backtick, inclusive
    pub span: TextSpan,
    pub pieces: Vec<Piece>,
}

pub(crate) fn scan(
    source: &str,
    language: Language,
    config: &ExtractConfig,
) -> Result<Vec<RawLiteral>> {
    let program = match language {
        // `.ts` and `.tsx` share a language; angle-bracket casts only parse without JSX
        Language::TypeScript => parse(source, ts_syntax(true)).or_else(|error| {
            parse(source, ts_syntax(false)).map_err(|_| error)
        })?,
        Language::JavaScript | Language::GraphQL => parse(
            source,
            Syntax::Es(EsSyntax {
                jsx: true,
                ..Default::default()
            }),
        )?,
    };

    let mut finder = LiteralFinder {
        source,
        config,
        bindings: HashMap::new(),
        literals: Vec::new(),
    };
    program.visit_with(&mut finder);

    let mut literals = finder.literals;
    literals.sort_by_key(|literal| literal.span.start);
    Ok(literals)
}

fn ts_syntax(tsx: bool) -> Syntax {
    Syntax::Typescript(TsSyntax {
        tsx,
        ..Default::default()
    })
}

fn parse(source: &str, syntax: Syntax) -> Result<Program> {
    let end = u32::try_from(source.len())
        .ok()
        .and_then(|len| len.checked_add(START))
        .ok_or_else(|| ExtractError::Parse {
            message: "Source is too large".to_string(),
            offset: 0,
        })?;

    let input = StringInput::new(source, BytePos(START), BytePos(end));
    let lexer = Lexer::new(syntax, EsVersion::EsNext, input, None);

    Parser::new_from(lexer)
        .parse_program()
        .map_err(|error| ExtractError::Parse {
            message: error.kind().msg().to_string(),
            offset: offset(error.span().lo),
        })
}

fn offset(pos: BytePos) -> usize {
    pos.0.saturating_sub(START) as usize
}

struct LiteralFinder<'a> {
    source: &'a str,
    config: &'a ExtractConfig,
    /// Template start → name of the variable it initialises
    bindings: HashMap<BytePos, String>,
    literals: Vec<RawLiteral>,
}

impl LiteralFinder<'_> {
    fn is_tag(&self, name: &str) -> bool {
        self.config.tag_identifiers.iter().any(|tag| tag == name)
    }

    /// `/* GraphQL */` directly before `start`
    fn has_magic_comment(&self, start: usize) -> bool {
        let before = self.source[..start].trim_end();
        let Some(rest) = before.strip_suffix("*/") else {
            return false;
        };
        rest.rfind("/*")
            .is_some_and(|open| rest[open + 2..].trim() == self.config.magic_comment)
    }

    fn record(&mut self, tag_name: Option<String>, tpl: &Tpl) {
        let span = TextSpan::new(offset(tpl.span.lo), offset(tpl.span.hi));
        let content_end = span.end - 1;
        let mut cursor = span.start + 1;
        let mut pieces = Vec::new();

        for expr in &tpl.exprs {
            let expr_span = expr.span();
            let expression = TextSpan::new(offset(expr_span.lo), offset(expr_span.hi));

            // Only whitespace or comments sit between the delimiters and the expression
            let Some(open) = self.source[cursor..expression.start].rfind("${") else {
                return;
            };
            let Some(close) = self.source[expression.end..content_end].find('}') else {
                return;
            };
            let open = cursor + open;
            let close = expression.end + close + 1;

            if cursor < open {
                pieces.push(Piece::Text(TextSpan::new(cursor, open)));
            }
            pieces.push(Piece::Interpolation {
                span: TextSpan::new(open, close),
                expression,
            });
            cursor = close;
        }
        if cursor < content_end {
            pieces.push(Piece::Text(TextSpan::new(cursor, content_end)));
        }

        self.literals.push(RawLiteral {
            tag_name,
            binding: self.bindings.get(&tpl.span.lo).cloned(),
            span,
            pieces,
        });
    }
}

impl Visit for LiteralFinder<'_> {
    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        if let (Pat::Ident(binding), Some(init)) = (&declarator.name, declarator.init.as_deref()) {
            let tpl = match init {
                Expr::TaggedTpl(tagged) => Some(&*tagged.tpl),
                Expr::Tpl(tpl) => Some(tpl),
                _ => None,
            };
            if let Some(tpl) = tpl {
                self.bindings.insert(tpl.span.lo, binding.id.sym.to_string());
            }
        }
        declarator.visit_children_with(self);
    }

    fn visit_tagged_tpl(&mut self, tagged: &TaggedTpl) {
        match tagged.tag.as_ref() {
            Expr::Ident(ident) if self.is_tag(&ident.sym) => {
                self.record(Some(ident.sym.to_string()), &tagged.tpl);
            }
            tag => tag.visit_with(self),
        }
        for expr in &tagged.tpl.exprs {
            expr.visit_with(self);
        }
    }

    fn visit_tpl(&mut self, tpl: &Tpl) {
        if self.has_magic_comment(offset(tpl.span.lo)) {
            self.record(None, tpl);
        }
        tpl.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_default(source: &str) -> Vec<RawLiteral> {
        scan(source, Language::TypeScript, &ExtractConfig::default()).unwrap()
    }

    #[test]
    fn test_finds_tagged_literal_and_binding() {
        let source = "const GetUser = gql`query GetUser { id }`;";
        let literals = scan_default(source);

        assert_eq!(literals.len(), 1);
        let literal = &literals[0];
        assert_eq!(literal.tag_name.as_deref(), Some("gql"));
        assert_eq!(literal.binding.as_deref(), Some("GetUser"));
        assert_eq!(&source[literal.span.start..literal.span.end], "`query GetUser { id }`");
        assert_eq!(literal.pieces, vec![Piece::Text(TextSpan::new(20, 40))]);
    }

    #[test]
    fn test_ignores_untagged_and_other_tags() {
        let source = "const a = `query A { id }`; const b = css`color: red`;";
        assert!(scan_default(source).is_empty());
    }

    #[test]
    fn test_magic_comment() {
        let source = "const q = /* GraphQL */ `query Q { id }`;";
        let literals = scan_default(source);

        assert_eq!(literals.len(), 1);
        assert_eq!(literals[0].tag_name, None);
        assert_eq!(literals[0].binding.as_deref(), Some("q"));
    }

    #[test]
    fn test_skips_strings_and_comments() {
        let source = r#"
// gql`query Commented { id }`
const s = "gql`query InString { id }`";
/* gql`query Block { id }` */
const real = gql`query Real { id }`;
"#;
        let literals = scan_default(source);
        assert_eq!(literals.len(), 1);
        assert_eq!(literals[0].binding.as_deref(), Some("real"));
    }

    #[test]
    fn test_backtick_in_regex_literal() {
        let source = "const re = /`/;\nexport const q = gql`query Foo { field }`;\n";
        let literals = scan_default(source);

        assert_eq!(literals.len(), 1);
        assert_eq!(literals[0].binding.as_deref(), Some("q"));
        assert_eq!(
            &source[literals[0].span.start..literals[0].span.end],
            "`query Foo { field }`"
        );
    }

    #[test]
    fn test_interpolation_pieces() {
        let source = "gql`query Q { ${fields} }`";
        let literals = scan_default(source);
        let pieces = &literals[0].pieces;

        assert_eq!(pieces.len(), 3);
        let Piece::Interpolation { span, expression } = &pieces[1] else {
            panic!("expected interpolation, got {:?}", pieces[1]);
        };
        assert_eq!(&source[span.start..span.end], "${fields}");
        assert_eq!(&source[expression.start..expression.end], "fields");
    }

    #[test]
    fn test_nested_braces_and_templates_in_interpolation() {
        let source = "gql`query Q { ${cond ? `a${b}` : { x: 1 }.x} }` + gql`query R { id }`";
        let literals = scan_default(source);
        assert_eq!(literals.len(), 2);

        let Piece::Interpolation { span, .. } = &literals[0].pieces[1] else {
            panic!("expected interpolation, got {:?}", literals[0].pieces[1]);
        };
        assert_eq!(&source[span.start..span.end], "${cond ? `a${b}` : { x: 1 }.x}");
    }

    #[test]
    fn test_angle_bracket_cast_in_ts() {
        let source = "const n = <number>value;\nconst q = gql`query Q { id }`;";
        let literals = scan_default(source);
        assert_eq!(literals.len(), 1);
    }

    #[test]
    fn test_jsx_in_tsx() {
        let source = "const q = gql`query Q { id }`;\nexport const C = () => <div>{q}</div>;";
        let literals = scan_default(source);
        assert_eq!(literals.len(), 1);
    }

    #[test]
    fn test_comparison_is_not_a_binding() {
        let source = "if (x == gql`query Q { id }`) {}";
        let literals = scan_default(source);
        assert_eq!(literals[0].binding, None);
    }

    #[test]
    fn test_syntax_error() {
        let err = scan("const q = gql`query Q {", Language::TypeScript, &ExtractConfig::default())
            .unwrap_err();
        assert!(matches!(err, ExtractError::Parse { .. }));
    }
}
