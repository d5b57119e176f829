use std::fmt::{self, Display, Formatter};
use std::ops::Range;

use codespan_reporting::files::{Files, Location, SimpleFile};

pub type Spanned<T> = (T, Span);
pub type Span = Range<usize>;

/// A 1-based line and column, derived from a byte offset into the source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Offsets past the end of `source` are clamped to the end.
    pub fn new(source: &str, offset: usize) -> Self {
        let file = SimpleFile::new("", source);
        match file.location((), offset.min(source.len())) {
            Ok(Location { line_number, column_number }) => {
                Self { line: line_number, column: column_number }
            }
            Err(_) => Self { line: 1, column: 1 },
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn position_first_line() {
        assert_eq!(Position::new("var x = 1;", 4), Position { line: 1, column: 5 });
    }

    #[test]
    fn position_after_newlines() {
        let source = "var x = 1;\n\n  x = 2;";
        assert_eq!(Position::new(source, 14), Position { line: 3, column: 3 });
    }

    #[test]
    fn position_clamped_to_end() {
        assert_eq!(Position::new("ab", 10), Position { line: 1, column: 3 });
    }
}
