mod ast;
mod builtins;
mod char_stream;
mod error;
mod operators;
mod parser;
mod printer;
mod runtime;
mod scope;
mod tokenizer;
mod value;
mod visitor;

#[cfg(test)]
mod test_cases;

use crate::config::InterpreterConfig;
use log::debug;
use runtime::Evaluator;
use scope::Scope;

pub use ast::Node;
pub use char_stream::Position;
pub use error::{Error, RuntimeError, SyntaxError, SyntaxErrorKind};
pub use parser::parse;
pub use printer::print;
pub use value::Value;

/// Parses and evaluates scripts. Each evaluation runs in a fresh global scope
/// chained to a shared prelude, so runs never see each other's bindings.
pub struct Interpreter {
    config: InterpreterConfig,
    prelude: Scope,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        let prelude = Scope::new();
        if config.enable_prelude {
            builtins::prelude::install(&prelude);
        }
        debug!(target: "javascript", "Interpreter created with {:?}", config);
        Self { config, prelude }
    }

    pub fn parse(&self, source: &str) -> Result<Node, SyntaxError> {
        parse(source)
    }

    /// Yields the value of the last top-level statement.
    pub fn evaluate(&self, ast: &Node) -> Result<Value, RuntimeError> {
        let mut evaluator = Evaluator::new(self.prelude.extend(), self.config.max_call_depth);
        evaluator.execute(ast)
    }

    /// Parses and evaluates `source` in one step.
    pub fn run(&self, source: &str) -> Result<Value, Error> {
        let ast = self.parse(source)?;
        Ok(self.evaluate(&ast)?)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates `ast` with the default configuration.
pub fn evaluate(ast: &Node) -> Result<Value, RuntimeError> {
    Interpreter::new().evaluate(ast)
}
