pub mod config;
mod javascript;
pub mod logger;

pub use config::InterpreterConfig;
pub use javascript::{
    Error, Interpreter, Node, Position, RuntimeError, SyntaxError, SyntaxErrorKind, Value, evaluate, parse,
    print,
};
