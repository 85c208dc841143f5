use std::ops::Range;

/// Why a stretch of extracted text differs from the original source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceKind {
    /// Original characters were dropped or collapsed: stripped indentation,
    /// or an escape sequence such as `\``.
    Stripped,
    /// A `${...}` expression was replaced by other text.
    Interpolation,
}

/// One edit between the original literal content and the extracted text.
///
/// `extracted` is the range the edit occupies in the extracted text (empty for
/// pure removals), `original_len` the number of bytes it replaced in the
/// original file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub extracted: Range<usize>,
    pub original_len: usize,
    pub kind: SpliceKind,
}

impl Splice {
    #[must_use]
    pub const fn stripped(at: usize, extracted_len: usize, original_len: usize) -> Self {
        Self {
            extracted: at..at + extracted_len,
            original_len,
            kind: SpliceKind::Stripped,
        }
    }

    #[must_use]
    pub const fn interpolation(at: usize, extracted_len: usize, original_len: usize) -> Self {
        Self {
            extracted: at..at + extracted_len,
            original_len,
            kind: SpliceKind::Interpolation,
        }
    }
}

/// An offset in the original source file produced by [`PositionResolver::resolve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    pub pos: usize,
    /// The extracted offset fell inside an interpolated expression, so `pos`
    /// is only the start of that expression.
    pub is_in_other_expression: bool,
}

/// Maps offsets between one literal's extracted text and its original file.
///
/// Built once per literal from the offset where the literal content starts,
/// where it ends, and the ordered splice table recorded during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionResolver {
    origin: usize,
    origin_end: usize,
    splices: Vec<Splice>,
}

impl PositionResolver {
    /// `splices` must be sorted by extracted offset and must not overlap.
    #[must_use]
    pub fn new(origin: usize, origin_end: usize, splices: Vec<Splice>) -> Self {
        debug_assert!(splices
            .windows(2)
            .all(|w| w[0].extracted.end <= w[1].extracted.start));
        Self {
            origin,
            origin_end,
            splices,
        }
    }

    /// A literal copied verbatim, such as a whole `.graphql` file
    #[must_use]
    pub const fn identity(origin: usize, origin_end: usize) -> Self {
        Self {
            origin,
            origin_end,
            splices: Vec::new(),
        }
    }

    #[must_use]
    pub const fn origin(&self) -> usize {
        self.origin
    }

    #[must_use]
    pub fn splices(&self) -> &[Splice] {
        &self.splices
    }

    /// Map an offset in the extracted text to an offset in the original file.
    #[must_use]
    pub fn resolve(&self, extracted_offset: usize) -> SourcePosition {
        resolve_position(extracted_offset, self.origin, &self.splices)
    }

    /// Map an offset in the original file into the extracted text.
    ///
    /// Returns `None` outside the literal content and inside interpolations.
    #[must_use]
    pub fn to_extracted(&self, original_offset: usize) -> Option<usize> {
        if original_offset < self.origin || original_offset > self.origin_end {
            return None;
        }

        let mut original_cursor = self.origin;
        let mut extracted_cursor = 0;

        for splice in &self.splices {
            let original_start = original_cursor + (splice.extracted.start - extracted_cursor);
            if original_offset < original_start {
                break;
            }

            let original_end = original_start + splice.original_len;
            if original_offset < original_end {
                return match splice.kind {
                    SpliceKind::Interpolation => None,
                    SpliceKind::Stripped => Some(
                        splice.extracted.start
                            + (original_offset - original_start).min(splice.extracted.len()),
                    ),
                };
            }

            original_cursor = original_end;
            extracted_cursor = splice.extracted.end;
        }

        Some(extracted_cursor + (original_offset - original_cursor))
    }
}

/// Pure form of [`PositionResolver::resolve`].
///
/// `origin` is the original offset of extracted offset 0 and `splices` the
/// sorted splice table of the literal.
#[must_use]
pub fn resolve_position(extracted_offset: usize, origin: usize, splices: &[Splice]) -> SourcePosition {
    let mut original_extra = 0;
    let mut extracted_consumed = 0;

    for splice in splices {
        if extracted_offset < splice.extracted.start {
            break;
        }

        if extracted_offset < splice.extracted.end {
            let start = origin + original_extra + (splice.extracted.start - extracted_consumed);
            return match splice.kind {
                SpliceKind::Interpolation => SourcePosition {
                    pos: start,
                    is_in_other_expression: true,
                },
                SpliceKind::Stripped => SourcePosition {
                    pos: start + (extracted_offset - splice.extracted.start).min(splice.original_len),
                    is_in_other_expression: false,
                },
            };
        }

        original_extra += splice.original_len;
        extracted_consumed += splice.extracted.len();
    }

    SourcePosition {
        pos: origin + original_extra + (extracted_offset - extracted_consumed),
        is_in_other_expression: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(pos: usize) -> SourcePosition {
        SourcePosition {
            pos,
            is_in_other_expression: false,
        }
    }

    #[test]
    fn test_identity_mapping() {
        let resolver = PositionResolver::identity(10, 30);
        assert_eq!(resolver.resolve(0), at(10));
        assert_eq!(resolver.resolve(7), at(17));
        assert_eq!(resolver.to_extracted(17), Some(7));
        assert_eq!(resolver.to_extracted(9), None);
        assert_eq!(resolver.to_extracted(31), None);
    }

    #[test]
    fn test_stripped_indentation() {
        // original content: "\n    query {\n      id\n    }\n"
        // extracted:        "\nquery {\n  id\n}\n"
        let splices = vec![
            Splice::stripped(1, 0, 4),
            Splice::stripped(9, 0, 4),
            Splice::stripped(14, 0, 4),
        ];
        let resolver = PositionResolver::new(100, 100 + 29, splices);

        // "q" of query
        assert_eq!(resolver.resolve(1), at(105));
        // "i" of id: extracted 11, original 100 + 1 + 4 + 8 + 4 + 2 = 119
        assert_eq!(resolver.resolve(11), at(119));
        // closing brace
        assert_eq!(resolver.resolve(14), at(126));

        assert_eq!(resolver.to_extracted(105), Some(1));
        assert_eq!(resolver.to_extracted(119), Some(11));
        // inside stripped whitespace snaps to the following character
        assert_eq!(resolver.to_extracted(102), Some(1));
    }

    #[test]
    fn test_interpolation_is_flagged() {
        // original: "query { ${fields} }" -> extracted "query { id name }"
        let splices = vec![Splice::interpolation(8, 7, 9)];
        let resolver = PositionResolver::new(50, 50 + 19, splices.clone());

        let inside = resolver.resolve(10);
        assert!(inside.is_in_other_expression);
        assert_eq!(inside.pos, 58);

        // after the interpolation: extracted 16 ("}") -> original 50 + 18
        assert_eq!(resolver.resolve(16), at(68));
        assert_eq!(resolve_position(16, 50, &splices), at(68));

        assert_eq!(resolver.to_extracted(60), None);
        assert_eq!(resolver.to_extracted(68), Some(16));
    }

    #[test]
    fn test_collapsed_escape() {
        // original: "a\`b" -> extracted "a`b"
        let resolver = PositionResolver::new(0, 4, vec![Splice::stripped(1, 1, 2)]);
        assert_eq!(resolver.resolve(1), at(1));
        assert_eq!(resolver.resolve(2), at(3));
        assert_eq!(resolver.to_extracted(3), Some(2));
    }

    #[test]
    fn test_resolver_is_reusable() {
        let resolver = PositionResolver::new(5, 40, vec![Splice::interpolation(3, 2, 6)]);
        let first: Vec<_> = (0..10).map(|o| resolver.resolve(o)).collect();
        let second: Vec<_> = (0..10).map(|o| resolver.resolve(o)).collect();
        assert_eq!(first, second);
    }
}
