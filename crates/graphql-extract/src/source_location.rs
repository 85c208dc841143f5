/// Position in a source file (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, UTF-16 code units)
    pub column: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Range in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Half-open byte range `[start, end)` in the original source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Both ends inclusive, so a cursor sitting right after the span still counts
    #[must_use]
    pub const fn touches(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Where the content of an extracted literal lives in the original file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Byte offset of the first content character in the original source file
    pub offset: usize,
    /// Length of the content in bytes
    pub length: usize,
    /// Line/column range of the content in the original source file
    pub range: Range,
}

impl SourceLocation {
    #[must_use]
    pub const fn new(offset: usize, length: usize, range: Range) -> Self {
        Self {
            offset,
            length,
            range,
        }
    }
}

/// Calculate a line/column position from a byte offset
#[must_use]
pub fn position_from_offset(source: &str, offset: usize) -> Position {
    let mut line = 0;
    let mut column = 0;

    for (idx, ch) in source.char_indices() {
        if idx >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += ch.len_utf16();
        }
    }

    Position::new(line, column)
}
