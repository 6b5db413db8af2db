use super::char_stream::{CharStream, Position};
use super::error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
use log::{debug, trace};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Identifier,
    String,
    Punctuation,
    Operator,
    Keyword,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Number => "Number",
            TokenKind::Identifier => "Identifier",
            TokenKind::String => "String",
            TokenKind::Punctuation => "Punctuation",
            TokenKind::Operator => "Operator",
            TokenKind::Keyword => "Keyword",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    /// Where the token starts.
    pub position: Position,
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind, position: Position) -> Self {
        Self {
            value: value.into(),
            kind,
            position,
        }
    }

    pub fn is(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.kind)
    }
}

pub const KEYWORDS: &[&str] = &[
    "if", "else", "var", "const", "let", "true", "false", "function", "for", "of", "return", "break",
];

const PUNCTUATION: &[char] = &[',', ';', '(', ')', '{', '}', '[', ']', '.'];

const OPERATOR_CHARS: &[char] = &['+', '-', '*', '/', '%', '=', '&', '|', '<', '>', '!', '^', '?'];

// Every prefix of a multi-character operator is itself listed, which lets the
// reader grow an operator one character at a time.
const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "=", "&", "|", "<", ">", "!", "^", "?",
    "++", "--", "**", "==", "!=", "<=", ">=", "&&", "||", "??", "<<", ">>", "=>",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
    "===", "!==", ">>>", "**=", "<<=", ">>=", "&&=", "||=", "??=", ">>>=",
];

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit() || c == '.'
}

/// Lazily tokenizes source text with one token of lookahead.
pub struct TokenStream {
    chars: CharStream,
    peeked: Option<Token>,
}

impl TokenStream {
    pub fn new(source: &str) -> Self {
        debug!(target: "javascript", "Starting tokenization of {} characters", source.len());
        Self {
            chars: CharStream::new(source),
            peeked: None,
        }
    }

    /// Materializes the next token without consuming it. `None` at end of input.
    pub fn peek(&mut self) -> SyntaxResult<Option<&Token>> {
        if self.peeked.is_none() {
            self.peeked = self.read_next()?;
        }
        Ok(self.peeked.as_ref())
    }

    pub fn next_token(&mut self) -> SyntaxResult<Option<Token>> {
        self.peek()?;
        Ok(self.peeked.take())
    }

    /// Consumes the next token if it has the given kind and value, fails otherwise.
    pub fn consume(&mut self, kind: TokenKind, value: &str) -> SyntaxResult<Token> {
        match self.next_token()? {
            Some(token) if token.is(kind, value) => Ok(token),
            Some(token) => Err(SyntaxError::unexpected(&token, Some(value))),
            None => Err(self.error(SyntaxErrorKind::UnexpectedEnd)),
        }
    }

    pub fn is_end_of_stream(&mut self) -> SyntaxResult<bool> {
        Ok(self.peek()?.is_none())
    }

    pub fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        self.chars.error(kind)
    }

    fn read_next(&mut self) -> SyntaxResult<Option<Token>> {
        loop {
            self.read_while(char::is_whitespace);
            let Some(c) = self.chars.peek() else {
                return Ok(None);
            };
            match (c, self.chars.peek_ahead()) {
                ('/', Some('/')) => self.skip_line(),
                ('/', Some('*')) => self.skip_block_comment()?,
                _ => break,
            }
        }

        let position = self.chars.position();
        let c = match self.chars.peek() {
            Some(c) => c,
            None => return Ok(None),
        };
        let token = if c == '"' || c == '\'' {
            Token::new(self.read_escaped(c)?, TokenKind::String, position)
        } else if c.is_ascii_digit() {
            Token::new(self.read_number(), TokenKind::Number, position)
        } else if is_identifier_start(c) {
            let word = self.read_while(is_identifier_part);
            let kind = if KEYWORDS.contains(&word.as_str()) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            Token::new(word, kind, position)
        } else if PUNCTUATION.contains(&c) {
            Token::new(self.chars.next()?, TokenKind::Punctuation, position)
        } else if OPERATOR_CHARS.contains(&c) {
            Token::new(self.read_operator()?, TokenKind::Operator, position)
        } else {
            self.chars.next()?;
            return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedCharacter(c), position));
        };

        trace!(target: "javascript", "Token: {}", token);
        Ok(Some(token))
    }

    fn read_number(&mut self) -> String {
        let mut seen_dot = false;
        self.read_while(|c| {
            if c == '.' {
                if seen_dot {
                    return false;
                }
                seen_dot = true;
                return true;
            }
            c.is_ascii_digit()
        })
    }

    fn read_operator(&mut self) -> SyntaxResult<String> {
        let mut operator = String::new();
        operator.push(self.chars.next()?);
        while let Some(c) = self.chars.peek() {
            if !OPERATOR_CHARS.contains(&c) {
                break;
            }
            operator.push(c);
            if !OPERATORS.contains(&operator.as_str()) {
                operator.pop();
                break;
            }
            self.chars.next()?;
        }
        Ok(operator)
    }

    // The character after a backslash is taken literally.
    fn read_escaped(&mut self, quote: char) -> SyntaxResult<String> {
        let mut text = String::new();
        let mut escaped = false;
        self.chars.next()?;
        loop {
            let c = self.chars.next()?;
            if escaped {
                text.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                return Ok(text);
            } else {
                text.push(c);
            }
        }
    }

    fn skip_line(&mut self) {
        self.read_while(|c| c != '\n');
    }

    fn skip_block_comment(&mut self) -> SyntaxResult<()> {
        self.chars.next()?;
        self.chars.next()?;
        loop {
            if self.chars.next()? == '*' && self.chars.peek() == Some('/') {
                self.chars.next()?;
                return Ok(());
            }
        }
    }

    fn read_while(&mut self, mut predicate: impl FnMut(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.chars.peek() {
            if !predicate(c) {
                break;
            }
            text.push(c);
            // peek() just returned a character, so this cannot run out.
            if self.chars.next().is_err() {
                break;
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<(TokenKind, String)> {
        let mut stream = TokenStream::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = stream.next_token().expect("source should tokenize") {
            tokens.push((token.kind, token.value));
        }
        tokens
    }

    fn first_error(source: &str) -> SyntaxError {
        let mut stream = TokenStream::new(source);
        loop {
            match stream.next_token() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("{:?} should fail to tokenize", source),
                Err(err) => return err,
            }
        }
    }

    fn kinds_and_values(expected: &[(TokenKind, &str)]) -> Vec<(TokenKind, String)> {
        expected.iter().map(|(kind, value)| (*kind, value.to_string())).collect()
    }

    #[test]
    fn test_simple_assignment() {
        assert_eq!(
            tokenize("let x = 25;"),
            kinds_and_values(&[
                (TokenKind::Keyword, "let"),
                (TokenKind::Identifier, "x"),
                (TokenKind::Operator, "="),
                (TokenKind::Number, "25"),
                (TokenKind::Punctuation, ";"),
            ])
        );
    }

    #[test]
    fn test_numbers_take_one_decimal_point() {
        assert_eq!(
            tokenize("3.14.5"),
            kinds_and_values(&[
                (TokenKind::Number, "3.14"),
                (TokenKind::Punctuation, "."),
                (TokenKind::Number, "5"),
            ])
        );
    }

    #[test]
    fn test_member_like_identifiers_and_keywords() {
        assert_eq!(
            tokenize("for (const n of arr.items) break"),
            kinds_and_values(&[
                (TokenKind::Keyword, "for"),
                (TokenKind::Punctuation, "("),
                (TokenKind::Keyword, "const"),
                (TokenKind::Identifier, "n"),
                (TokenKind::Keyword, "of"),
                (TokenKind::Identifier, "arr.items"),
                (TokenKind::Punctuation, ")"),
                (TokenKind::Keyword, "break"),
            ])
        );
    }

    #[test]
    fn test_operators_are_greedy_but_known() {
        assert_eq!(
            tokenize("a === b !== c => d += e++ x=-1 >>>= **"),
            kinds_and_values(&[
                (TokenKind::Identifier, "a"),
                (TokenKind::Operator, "==="),
                (TokenKind::Identifier, "b"),
                (TokenKind::Operator, "!=="),
                (TokenKind::Identifier, "c"),
                (TokenKind::Operator, "=>"),
                (TokenKind::Identifier, "d"),
                (TokenKind::Operator, "+="),
                (TokenKind::Identifier, "e"),
                (TokenKind::Operator, "++"),
                (TokenKind::Identifier, "x"),
                (TokenKind::Operator, "="),
                (TokenKind::Operator, "-"),
                (TokenKind::Number, "1"),
                (TokenKind::Operator, ">>>="),
                (TokenKind::Operator, "**"),
            ])
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            tokenize(r#""say \"hi\"" 'it\'s'"#),
            kinds_and_values(&[
                (TokenKind::String, "say \"hi\""),
                (TokenKind::String, "it's"),
            ])
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "1 // one\n/* two\n */ 3 / 4";
        assert_eq!(
            tokenize(source),
            kinds_and_values(&[
                (TokenKind::Number, "1"),
                (TokenKind::Number, "3"),
                (TokenKind::Operator, "/"),
                (TokenKind::Number, "4"),
            ])
        );
    }

    #[test]
    fn test_peek_caches_until_next() {
        let mut stream = TokenStream::new("a b");
        let peeked = stream.peek().expect("valid").cloned();
        assert_eq!(peeked.map(|t| t.value), Some("a".to_string()));
        assert_eq!(stream.next_token().expect("valid").map(|t| t.value), Some("a".to_string()));
        assert_eq!(stream.next_token().expect("valid").map(|t| t.value), Some("b".to_string()));
        assert!(stream.is_end_of_stream().expect("valid"));
    }

    #[test]
    fn test_consume_checks_kind_and_value() {
        let mut stream = TokenStream::new("( x");
        assert!(stream.consume(TokenKind::Punctuation, "(").is_ok());
        let err = stream.consume(TokenKind::Punctuation, ")").expect_err("x is not ')'");
        assert!(matches!(err.kind, SyntaxErrorKind::UnexpectedToken { .. }));
        assert_eq!(err.position, Position { line: 1, column: 2 });
    }

    #[test]
    fn test_errors_carry_positions() {
        let err = first_error("let a = 1;\nlet b = #");
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedCharacter('#'));
        assert_eq!(err.position, Position { line: 2, column: 8 });

        let err = first_error("\"open");
        assert_eq!(err.kind, SyntaxErrorKind::OutOfInput);
    }
}
