use super::char_stream::Position;
use super::tokenizer::Token;
use std::fmt;

pub type SyntaxResult<T> = Result<T, SyntaxError>;
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxErrorKind {
    OutOfInput,
    UnexpectedCharacter(char),
    UnexpectedToken {
        found: Token,
        expected: Option<String>,
    },
    UnexpectedEnd,
    UnknownOperator(String),
    InvalidNumber(String),
    InvalidIdentifier(String),
    InvalidAssignmentTarget,
    InvalidParameter,
    MissingInitializer(String),
    IllegalBreak,
    IllegalReturn,
    TooDeeplyNested,
}

/// A parse-time failure. Always carries the source position it was raised at.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub position: Position,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, position: Position) -> Self {
        Self { kind, position }
    }

    pub fn unexpected(found: &Token, expected: Option<&str>) -> Self {
        Self::new(
            SyntaxErrorKind::UnexpectedToken {
                found: found.clone(),
                expected: expected.map(str::to_string),
            },
            found.position,
        )
    }
}

impl std::error::Error for SyntaxError {}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::OutOfInput => write!(f, "Unexpected end of input"),
            SyntaxErrorKind::UnexpectedCharacter(c) => write!(f, "Can't handle character: {:?}", c),
            SyntaxErrorKind::UnexpectedToken { found, expected: Some(expected) } => {
                write!(f, "Unexpected token: {}, Expected={}", found, expected)
            }
            SyntaxErrorKind::UnexpectedToken { found, expected: None } => {
                write!(f, "Unexpected token: {}", found)
            }
            SyntaxErrorKind::UnexpectedEnd => write!(f, "Unexpected end of script"),
            SyntaxErrorKind::UnknownOperator(op) => write!(f, "Unknown operator: {}", op),
            SyntaxErrorKind::InvalidNumber(text) => write!(f, "Invalid number literal: {}", text),
            SyntaxErrorKind::InvalidIdentifier(name) => write!(f, "Invalid identifier: {}", name),
            SyntaxErrorKind::InvalidAssignmentTarget => write!(f, "Invalid left-hand side in assignment"),
            SyntaxErrorKind::InvalidParameter => write!(f, "Function parameters must be plain identifiers"),
            SyntaxErrorKind::MissingInitializer(name) => {
                write!(f, "Missing initializer in const declaration: \"{}\"", name)
            }
            SyntaxErrorKind::IllegalBreak => write!(f, "Illegal break statement"),
            SyntaxErrorKind::IllegalReturn => write!(f, "Illegal return statement"),
            SyntaxErrorKind::TooDeeplyNested => write!(f, "Expression nested too deeply"),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.position)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    UndefinedVariable(String),
    IllegalConstAssignment(String),
    DuplicateBinding(String),
    UnsupportedOperandTypes {
        operator: String,
        left: &'static str,
        right: &'static str,
    },
    NotIndexable(&'static str),
    InvalidIndex(String),
    NotCallable(String),
    NotIterable(&'static str),
    InvalidArgument {
        method: &'static str,
        expected: &'static str,
    },
    InvalidAssignmentTarget,
    TooManyArguments {
        function: String,
        expected: usize,
        found: usize,
    },
    UnknownMember {
        kind: &'static str,
        member: String,
    },
    CallStackExceeded(usize),
}

impl RuntimeError {
    /// The error category reported to callers, e.g. `ReferenceError`.
    pub fn category(&self) -> &'static str {
        match self {
            RuntimeError::UndefinedVariable(_) => "ReferenceError",
            RuntimeError::IllegalConstAssignment(_) | RuntimeError::DuplicateBinding(_) => {
                "AssignmentError"
            }
            RuntimeError::UnsupportedOperandTypes { .. }
            | RuntimeError::NotIndexable(_)
            | RuntimeError::InvalidIndex(_)
            | RuntimeError::NotCallable(_)
            | RuntimeError::NotIterable(_)
            | RuntimeError::InvalidArgument { .. }
            | RuntimeError::InvalidAssignmentTarget => "TypeError",
            RuntimeError::TooManyArguments { .. } => "ArityError",
            RuntimeError::UnknownMember { .. } => "UnsupportedFeature",
            RuntimeError::CallStackExceeded(_) => "RangeError",
        }
    }
}

impl std::error::Error for RuntimeError {}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UndefinedVariable(name) => write!(f, "Undefined variable: \"{}\"", name),
            RuntimeError::IllegalConstAssignment(name) => {
                write!(f, "Illegal assignment on const variable: \"{}\"", name)
            }
            RuntimeError::DuplicateBinding(name) => write!(f, "Already defined in scope: \"{}\"", name),
            RuntimeError::UnsupportedOperandTypes { operator, left, right } => {
                write!(f, "Unsupported operand types for '{}': {} and {}", operator, left, right)
            }
            RuntimeError::NotIndexable(kind) => write!(f, "Cannot index into a value of type {}", kind),
            RuntimeError::InvalidIndex(index) => write!(f, "Invalid index: {}", index),
            RuntimeError::NotCallable(callee) => write!(f, "{} is not a function", callee),
            RuntimeError::NotIterable(kind) => write!(f, "Value of type {} is not iterable", kind),
            RuntimeError::InvalidArgument { method, expected } => {
                write!(f, "{} expects {}", method, expected)
            }
            RuntimeError::InvalidAssignmentTarget => write!(f, "Invalid assignment target"),
            RuntimeError::TooManyArguments { function, expected, found } => write!(
                f,
                "Too many arguments for {}: expected at most {}, got {}",
                function, expected, found
            ),
            RuntimeError::UnknownMember { kind, member } => {
                write!(f, "Member doesn't exist on {}: {}", kind, member)
            }
            RuntimeError::CallStackExceeded(depth) => {
                write!(f, "Maximum call stack size exceeded ({} calls)", depth)
            }
        }
    }
}

/// Any failure of a parse-then-evaluate run.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Syntax(SyntaxError),
    Runtime(RuntimeError),
}

impl Error {
    pub fn category(&self) -> &'static str {
        match self {
            Error::Syntax(_) => "SyntaxError",
            Error::Runtime(err) => err.category(),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Syntax(err) => Some(err),
            Error::Runtime(err) => Some(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax(err) => write!(f, "{}: {}", self.category(), err),
            Error::Runtime(err) => write!(f, "{}: {}", self.category(), err),
        }
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::Syntax(err)
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        Error::Runtime(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_reference_wording() {
        assert_eq!(
            RuntimeError::IllegalConstAssignment("x".to_string()).to_string(),
            "Illegal assignment on const variable: \"x\""
        );
        assert_eq!(
            RuntimeError::DuplicateBinding("a".to_string()).to_string(),
            "Already defined in scope: \"a\""
        );
    }

    #[test]
    fn test_categories() {
        let err: Error = RuntimeError::UndefinedVariable("y".to_string()).into();
        assert_eq!(err.category(), "ReferenceError");
        assert_eq!(err.to_string(), "ReferenceError: Undefined variable: \"y\"");

        let err: Error = SyntaxError::new(SyntaxErrorKind::IllegalBreak, Position { line: 2, column: 4 }).into();
        assert_eq!(err.to_string(), "SyntaxError: Illegal break statement (2:4)");
    }
}
