use graphql_extract::Position;

/// Line-to-offset and offset-to-line conversion using a pre-built index.
///
/// Columns are UTF-16 code units, which is what editors speak. The index keeps
/// a copy of the text so columns can be converted within a line.
///
/// # Example
///
/// ```
/// use graphql_extract::Position;
/// use graphql_typegen::LineIndex;
///
/// let index = LineIndex::new("line 0\nline 1\nline 2");
///
/// let offset = index.position_to_offset(Position::new(1, 0)).unwrap();
/// assert_eq!(offset, 7);
///
/// assert_eq!(index.offset_to_position(7), Position::new(1, 0));
/// ```
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: String,
    /// Byte offset of the start of each line; index 0 is always 0
    line_starts: Vec<usize>,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(idx, _)| idx + 1));

        Self {
            text: text.to_string(),
            line_starts,
        }
    }

    fn line_text(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.text.len(), |next| next - 1);
        Some(&self.text[start..end])
    }

    /// Convert a line/column position to a byte offset.
    ///
    /// Returns `None` if the line is out of bounds. Columns past the end of
    /// the line clamp to the line end.
    #[must_use]
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let line_start = *self.line_starts.get(position.line)?;
        let text = self.line_text(position.line)?;

        let mut units = 0;
        for (idx, ch) in text.char_indices() {
            if units >= position.column {
                return Some(line_start + idx);
            }
            units += ch.len_utf16();
        }
        Some(line_start + text.len())
    }

    /// Like [`Self::position_to_offset`], but the column counts characters
    #[must_use]
    pub fn char_position_to_offset(&self, line: usize, column: usize) -> Option<usize> {
        let line_start = *self.line_starts.get(line)?;
        let text = self.line_text(line)?;

        Some(
            text.char_indices()
                .nth(column)
                .map_or(line_start + text.len(), |(idx, _)| line_start + idx),
        )
    }

    /// Convert a byte offset to a line/column position
    #[must_use]
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };

        let line_start = self.line_starts[line];
        let column = self.text[line_start..]
            .char_indices()
            .take_while(|(idx, _)| line_start + idx < offset)
            .map(|(_, ch)| ch.len_utf16())
            .sum();

        Position::new(line, column)
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get the byte offset of the start of a line
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_start(0), Some(0));
        assert_eq!(index.position_to_offset(Position::new(0, 0)), Some(0));
    }

    #[test]
    fn test_multiple_lines() {
        let index = LineIndex::new("line 0\nline 1\nline 2");

        assert_eq!(index.line_count(), 3);
        assert_eq!(index.position_to_offset(Position::new(0, 0)), Some(0));
        assert_eq!(index.position_to_offset(Position::new(1, 0)), Some(7));
        assert_eq!(index.position_to_offset(Position::new(2, 0)), Some(14));
        assert_eq!(index.position_to_offset(Position::new(1, 5)), Some(12));

        assert_eq!(index.offset_to_position(10), Position::new(1, 3));
        assert_eq!(index.offset_to_position(14), Position::new(2, 0));
    }

    #[test]
    fn test_out_of_bounds() {
        let index = LineIndex::new("line 0\nline 1");

        assert_eq!(index.position_to_offset(Position::new(10, 0)), None);
        // past the end of the line clamps to the newline
        assert_eq!(index.position_to_offset(Position::new(0, 1000)), Some(6));
    }

    #[test]
    fn test_utf16_columns() {
        // "世" and "界" are 3 bytes each and one UTF-16 unit; "😀" is 4 bytes and two units
        let index = LineIndex::new("a 世界 😀 b\nnext");

        assert_eq!(index.line_start(1), Some(16));
        assert_eq!(index.position_to_offset(Position::new(0, 2)), Some(2));
        assert_eq!(index.position_to_offset(Position::new(0, 3)), Some(5));
        assert_eq!(index.position_to_offset(Position::new(0, 7)), Some(13));

        assert_eq!(index.offset_to_position(13), Position::new(0, 7));
        assert_eq!(index.char_position_to_offset(0, 6), Some(13));
    }

    #[test]
    fn test_windows_line_endings() {
        let index = LineIndex::new("line 0\r\nline 1\r\nline 2");
        assert_eq!(index.position_to_offset(Position::new(1, 0)), Some(8));
        assert_eq!(index.position_to_offset(Position::new(2, 0)), Some(16));
    }

    #[test]
    fn test_roundtrip() {
        let index = LineIndex::new("query {\n    user { id }\n}\n");

        for pos in [
            Position::new(0, 0),
            Position::new(0, 5),
            Position::new(1, 4),
            Position::new(2, 0),
        ] {
            let offset = index.position_to_offset(pos).unwrap();
            let roundtrip = index.offset_to_position(offset);
            assert_eq!(pos, roundtrip, "Position {pos:?} -> offset {offset} -> {roundtrip:?}");
        }
    }
}
