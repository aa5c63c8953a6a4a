//! Positions and source spans.
//!
//! Offsets are immutable value data: copied freely, never mutated after the
//! lexer produces them. `row`/`col` are 0-based; `char_index` is a byte offset
//! into the UTF-8 source text.

use serde::Serialize;

use crate::SourceId;

/// A single position within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FileOffset {
    /// Byte offset into the source text.
    pub char_index: usize,
    /// 0-based line number.
    pub row: usize,
    /// 0-based column within the line.
    pub col: usize,
}

impl FileOffset {
    pub fn new(char_index: usize, row: usize, col: usize) -> Self {
        Self {
            char_index,
            row,
            col,
        }
    }
}

impl std::fmt::Display for FileOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Rows and columns are 1-based when shown to users.
        write!(f, "{}:{}", self.row + 1, self.col + 1)
    }
}

/// A half-open span `[start, end)` within one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub source: SourceId,
    pub start: FileOffset,
    pub end: FileOffset,
}

impl Location {
    /// Invariant: `end` is never strictly before `start`.
    pub fn new(source: SourceId, start: FileOffset, end: FileOffset) -> Self {
        debug_assert!(
            start.char_index <= end.char_index,
            "location ends before it starts: {start:?}..{end:?}"
        );
        Self { source, start, end }
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn until(self, other: Location) -> Location {
        debug_assert_eq!(self.source, other.source);
        Location::new(self.source, self.start, other.end)
    }

    /// Collapses the span to a single character at its start.
    pub fn beginning(self) -> Location {
        let end = FileOffset::new(self.start.char_index + 1, self.start.row, self.start.col + 1);
        Location::new(self.source, self.start, end)
    }

    pub fn char_range(&self) -> std::ops::Range<usize> {
        self.start.char_index..self.end.char_index
    }
}
