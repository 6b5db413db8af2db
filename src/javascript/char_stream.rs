use super::error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
use std::fmt;

/// Line/column of a character in the source. Lines start at 1, columns at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

pub struct CharStream {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl CharStream {
    pub fn new(source: &str) -> Self {
        Self {
            input: source.chars().collect(),
            position: 0,
            line: 1,
            column: 0,
        }
    }

    /// Returns the current character and advances past it.
    pub fn next(&mut self) -> SyntaxResult<char> {
        let c = self
            .input
            .get(self.position)
            .copied()
            .ok_or_else(|| self.error(SyntaxErrorKind::OutOfInput))?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Ok(c)
    }

    pub fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    pub fn peek_ahead(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.position >= self.input.len()
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    pub fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(kind, self.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_lines_and_columns() {
        let mut stream = CharStream::new("ab\nc");
        assert_eq!(stream.next(), Ok('a'));
        assert_eq!(stream.next(), Ok('b'));
        assert_eq!(stream.position(), Position { line: 1, column: 2 });
        assert_eq!(stream.next(), Ok('\n'));
        assert_eq!(stream.position(), Position { line: 2, column: 0 });
        assert_eq!(stream.peek(), Some('c'));
        assert_eq!(stream.peek_ahead(), None);
    }

    #[test]
    fn test_reading_past_end_fails() {
        let mut stream = CharStream::new("x");
        assert_eq!(stream.next(), Ok('x'));
        assert!(stream.is_end_of_stream());

        let err = stream.next().expect_err("stream is exhausted");
        assert_eq!(err.kind, SyntaxErrorKind::OutOfInput);
        assert_eq!(err.to_string(), "Unexpected end of input (1:1)");
    }
}
