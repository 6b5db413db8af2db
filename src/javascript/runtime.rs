use super::ast::*;
use super::builtins::{self, Invoke};
use super::error::{RuntimeError, RuntimeResult};
use super::operators;
use super::scope::Scope;
use super::value::{Function, Value};
use super::visitor::Visitor;
use log::{debug, trace};
use std::rc::Rc;

/// Outcome of evaluating one node. `Return` and `Break` travel up through
/// enclosing blocks until a function call or loop consumes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal(Value),
    Return(Value),
    Break,
}

impl Default for Completion {
    fn default() -> Self {
        Completion::Normal(Value::Undefined)
    }
}

/// Unwraps a normal completion, returning early with any other.
macro_rules! value {
    ($completion:expr) => {
        match $completion? {
            Completion::Normal(value) => value,
            abrupt => return Ok(abrupt),
        }
    };
}

/// Tree-walking evaluator. Owns the current scope for the duration of a run.
pub struct Evaluator {
    scope: Scope,
    depth: usize,
    max_call_depth: usize,
}

impl Evaluator {
    pub fn new(scope: Scope, max_call_depth: usize) -> Self {
        Self {
            scope,
            depth: 0,
            max_call_depth,
        }
    }

    /// Runs `ast` and yields the value of its last statement.
    pub fn execute(&mut self, ast: &Node) -> RuntimeResult<Value> {
        match self.visit(ast)? {
            Completion::Normal(value) | Completion::Return(value) => Ok(value),
            Completion::Break => Ok(Value::Undefined),
        }
    }

    /// Evaluates every node as an expression, in order.
    fn values(&mut self, nodes: &[Node]) -> RuntimeResult<Vec<Value>> {
        nodes.iter().map(|node| self.execute(node)).collect()
    }

    /// Runs `f` with `scope` as the current scope, restoring the previous one
    /// afterwards, whether `f` fails or not.
    fn in_scope<T>(&mut self, scope: Scope, f: impl FnOnce(&mut Self) -> RuntimeResult<T>) -> RuntimeResult<T> {
        let previous = std::mem::replace(&mut self.scope, scope);
        let result = f(self);
        self.scope = previous;
        result
    }

    fn run_sequence(&mut self, body: &[Node]) -> RuntimeResult<Completion> {
        let mut last = Value::Undefined;
        for node in body {
            last = value!(self.visit(node));
        }
        Ok(Completion::Normal(last))
    }

    /// Consumes the completion of a loop body. `None` means keep looping.
    fn loop_exit(completion: Completion) -> Option<Completion> {
        match completion {
            Completion::Normal(_) => None,
            Completion::Break => Some(Completion::Normal(Value::Undefined)),
            Completion::Return(value) => Some(Completion::Return(value)),
        }
    }

    pub fn call(&mut self, callee: &Value, arguments: Vec<Value>, this: Option<Value>) -> RuntimeResult<Value> {
        match callee {
            Value::Native(native) => {
                trace!(target: "javascript", "Calling native {}", native.name);
                (native.call)(&arguments)
            }
            Value::Function(function) => self.call_function(function, arguments, this),
            other => Err(RuntimeError::NotCallable(other.to_string())),
        }
    }

    fn call_function(&mut self, function: &Function, arguments: Vec<Value>, this: Option<Value>) -> RuntimeResult<Value> {
        let declaration = function.declaration.clone();
        if arguments.len() > declaration.params.len() {
            return Err(RuntimeError::TooManyArguments {
                function: declaration.display_name().to_string(),
                expected: declaration.params.len(),
                found: arguments.len(),
            });
        }
        if self.depth >= self.max_call_depth {
            return Err(RuntimeError::CallStackExceeded(self.max_call_depth));
        }
        debug!(
            target: "javascript",
            "Calling {} with {} arguments (depth {})",
            declaration.display_name(),
            arguments.len(),
            self.depth + 1
        );

        let scope = function.closure.extend();
        if let Some(this) = this {
            scope.def("this", this, DeclarationKind::Const)?;
        }
        let mut arguments = arguments.into_iter();
        for param in &declaration.params {
            let value = arguments.next().unwrap_or(Value::Undefined);
            scope.def(param, value, DeclarationKind::Let)?;
        }

        self.depth += 1;
        let result = self.in_scope(scope, |evaluator| evaluator.visit(&declaration.body));
        self.depth -= 1;

        match result? {
            Completion::Return(value) => Ok(value),
            // Arrow functions with an expression body yield that expression.
            Completion::Normal(value) if !declaration.has_block_body() => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    fn assign(&mut self, expr: &BinaryExpression) -> RuntimeResult<Completion> {
        let value = value!(self.visit(&expr.right));
        let compound = expr.operator != BinaryOperator::Assign;
        match expr.left.as_ref() {
            Node::Identifier(name) => {
                let value = if compound {
                    operators::binary(expr.operator, &self.scope.get(name)?, &value)?
                } else {
                    value
                };
                self.scope.set(name, value.clone())?;
                Ok(Completion::Normal(value))
            }
            Node::IndexerCall(indexer) => {
                let target = value!(self.visit(&indexer.target));
                let index = value!(self.visit(&indexer.index));
                let value = if compound {
                    operators::binary(expr.operator, &read_index(&target, &index)?, &value)?
                } else {
                    value
                };
                write_index(&target, &index, value.clone())?;
                Ok(Completion::Normal(value))
            }
            _ => Err(RuntimeError::InvalidAssignmentTarget),
        }
    }

    /// `++` and `--`. Identifiers and indexers are written back; any other
    /// operand is only read.
    fn update(&mut self, expr: &UnaryExpression) -> RuntimeResult<Completion> {
        let pick = |old: Value, new: Value| if expr.is_suffix { old } else { new };
        match expr.operand.as_ref() {
            Node::Identifier(name) => {
                let old = self.scope.get(name)?;
                let new = operators::unary(expr.operator, &old)?;
                self.scope.set(name, new.clone())?;
                Ok(Completion::Normal(pick(old, new)))
            }
            Node::IndexerCall(indexer) => {
                let target = value!(self.visit(&indexer.target));
                let index = value!(self.visit(&indexer.index));
                let old = read_index(&target, &index)?;
                let new = operators::unary(expr.operator, &old)?;
                write_index(&target, &index, new.clone())?;
                Ok(Completion::Normal(pick(old, new)))
            }
            operand => {
                let old = value!(self.visit(operand));
                let new = operators::unary(expr.operator, &old)?;
                Ok(Completion::Normal(pick(old, new)))
            }
        }
    }

    fn call_method(&mut self, object: Value, call: &FunctionCall) -> RuntimeResult<Value> {
        let Node::Identifier(name) = call.callee.as_ref() else {
            return Err(RuntimeError::NotCallable(call.callee.kind_name().to_string()));
        };
        let arguments = self.values(&call.arguments)?;
        if let Some(method) = builtins::method(&object, name) {
            trace!(target: "javascript", "Calling built-in {}.{}", object.type_name(), name);
            return method.call(arguments, self);
        }
        // Not a built-in: a user function in scope, called with `this` bound.
        match self.scope.get(name) {
            Ok(callee @ Value::Function(_)) => self.call(&callee, arguments, Some(object)),
            _ => Err(RuntimeError::UnknownMember {
                kind: object.type_name(),
                member: name.clone(),
            }),
        }
    }
}

impl Invoke for Evaluator {
    fn invoke(&mut self, callee: &Value, arguments: Vec<Value>) -> RuntimeResult<Value> {
        self.call(callee, arguments, None)
    }
}

/// Converts an index value to a position. `Ok(None)` for negative indices.
fn position(index: &Value) -> RuntimeResult<Option<usize>> {
    match index {
        Value::Integer(n) => Ok(usize::try_from(*n).ok()),
        Value::Float(n) if n.fract() == 0.0 && n.is_finite() => Ok(usize::try_from(*n as i64).ok()),
        other => Err(RuntimeError::InvalidIndex(other.to_string())),
    }
}

/// Out-of-range reads yield `Undefined`.
fn read_index(target: &Value, index: &Value) -> RuntimeResult<Value> {
    let position = position(index)?;
    match target {
        Value::Array(array) => Ok(position.and_then(|i| array.get(i)).unwrap_or(Value::Undefined)),
        Value::String(s) => Ok(position
            .and_then(|i| s.chars().nth(i))
            .map_or(Value::Undefined, Value::Char)),
        other => Err(RuntimeError::NotIndexable(other.type_name())),
    }
}

fn write_index(target: &Value, index: &Value, value: Value) -> RuntimeResult<()> {
    let Value::Array(array) = target else {
        return Err(RuntimeError::NotIndexable(target.type_name()));
    };
    let written = match position(index)? {
        Some(i) => array.set(i, value),
        None => false,
    };
    if written {
        Ok(())
    } else {
        Err(RuntimeError::InvalidIndex(index.to_string()))
    }
}

/// Name of a callee for error messages.
fn describe(callee: &Node) -> String {
    match callee {
        Node::Identifier(name) => name.clone(),
        other => other.kind_name().to_string(),
    }
}

impl Visitor for Evaluator {
    type Output = Completion;
    type Error = RuntimeError;

    fn visit_program(&mut self, body: &[Node]) -> RuntimeResult<Completion> {
        debug!(target: "javascript", "Evaluating program with {} statements", body.len());
        self.run_sequence(body)
    }

    fn visit_block(&mut self, body: &[Node]) -> RuntimeResult<Completion> {
        let scope = self.scope.extend();
        self.in_scope(scope, |evaluator| evaluator.run_sequence(body))
    }

    fn visit_variable_declaration(&mut self, decl: &VariableDeclaration) -> RuntimeResult<Completion> {
        let value = value!(self.visit(&decl.init));
        self.scope.def(&decl.name, value.clone(), decl.kind)?;
        Ok(Completion::Normal(value))
    }

    fn visit_identifier(&mut self, name: &str) -> RuntimeResult<Completion> {
        Ok(Completion::Normal(self.scope.get(name)?))
    }

    fn visit_literal(&mut self, literal: &Literal) -> RuntimeResult<Completion> {
        let value = match literal {
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Float(n) => Value::number(*n),
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::String(s) => Value::String(s.clone()),
        };
        Ok(Completion::Normal(value))
    }

    fn visit_binary_expression(&mut self, expr: &BinaryExpression) -> RuntimeResult<Completion> {
        if expr.kind == BinaryKind::Assignment {
            return self.assign(expr);
        }
        let left = value!(self.visit(&expr.left));
        let short_circuits = match expr.operator {
            BinaryOperator::LogicalAnd => !left.is_truthy(),
            BinaryOperator::LogicalOr => left.is_truthy(),
            BinaryOperator::Nullish => !matches!(left, Value::Undefined),
            _ => false,
        };
        if short_circuits {
            return Ok(Completion::Normal(left));
        }
        let right = value!(self.visit(&expr.right));
        Ok(Completion::Normal(operators::binary(expr.operator, &left, &right)?))
    }

    fn visit_unary_expression(&mut self, expr: &UnaryExpression) -> RuntimeResult<Completion> {
        match expr.operator {
            UnaryOperator::Increment | UnaryOperator::Decrement => self.update(expr),
            operator => {
                let operand = value!(self.visit(&expr.operand));
                Ok(Completion::Normal(operators::unary(operator, &operand)?))
            }
        }
    }

    fn visit_if_statement(&mut self, stmt: &IfStatement) -> RuntimeResult<Completion> {
        let test = value!(self.visit(&stmt.test));
        if test.is_truthy() {
            self.visit(&stmt.consequent)
        } else {
            self.visit(&stmt.alternate)
        }
    }

    fn visit_for_statement(&mut self, stmt: &ForStatement) -> RuntimeResult<Completion> {
        let scope = self.scope.extend();
        self.in_scope(scope, |evaluator| {
            value!(evaluator.visit(&stmt.init));
            loop {
                // An absent test loops until `break`.
                if !stmt.test.is_dead() && !value!(evaluator.visit(&stmt.test)).is_truthy() {
                    break;
                }
                if let Some(exit) = Self::loop_exit(evaluator.visit(&stmt.body)?) {
                    return Ok(exit);
                }
                value!(evaluator.visit(&stmt.update));
            }
            Ok(Completion::Normal(Value::Undefined))
        })
    }

    fn visit_for_of_statement(&mut self, stmt: &ForOfStatement) -> RuntimeResult<Completion> {
        let iterable = value!(self.visit(&stmt.iterable));
        let cursor = match builtins::accessor(&iterable, "@@iterator")? {
            Value::Iterator(cursor) => cursor,
            _ => return Err(RuntimeError::NotIterable(iterable.type_name())),
        };
        let scope = self.scope.extend();
        self.in_scope(scope, |evaluator| {
            while let Some(item) = cursor.next() {
                evaluator.scope.redef(&stmt.binding, item, stmt.kind);
                if let Some(exit) = Self::loop_exit(evaluator.visit(&stmt.body)?) {
                    return Ok(exit);
                }
            }
            Ok(Completion::Normal(Value::Undefined))
        })
    }

    fn visit_array_literal(&mut self, items: &[Node]) -> RuntimeResult<Completion> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(value!(self.visit(item)));
        }
        Ok(Completion::Normal(Value::from(values)))
    }

    fn visit_member_expression(&mut self, expr: &MemberExpression) -> RuntimeResult<Completion> {
        let object = value!(self.visit(&expr.object));
        let value = match expr.property.as_ref() {
            Node::Identifier(name) => builtins::accessor(&object, name)?,
            Node::FunctionCall(call) => self.call_method(object, call)?,
            other => {
                return Err(RuntimeError::UnknownMember {
                    kind: object.type_name(),
                    member: other.kind_name().to_string(),
                });
            }
        };
        Ok(Completion::Normal(value))
    }

    fn visit_indexer_call(&mut self, expr: &IndexerCall) -> RuntimeResult<Completion> {
        let target = value!(self.visit(&expr.target));
        let index = value!(self.visit(&expr.index));
        Ok(Completion::Normal(read_index(&target, &index)?))
    }

    fn visit_function_call(&mut self, call: &FunctionCall) -> RuntimeResult<Completion> {
        let callee = value!(self.visit(&call.callee));
        if !callee.is_callable() {
            return Err(RuntimeError::NotCallable(describe(&call.callee)));
        }
        let arguments = self.values(&call.arguments)?;
        Ok(Completion::Normal(self.call(&callee, arguments, None)?))
    }

    fn visit_named_function_declaration(&mut self, decl: &Rc<FunctionDeclaration>) -> RuntimeResult<Completion> {
        let function = Value::Function(Function::new(decl.clone(), self.scope.clone()));
        self.scope.def(decl.display_name(), function.clone(), DeclarationKind::Var)?;
        Ok(Completion::Normal(function))
    }

    fn visit_anonymous_function_declaration(&mut self, decl: &Rc<FunctionDeclaration>) -> RuntimeResult<Completion> {
        let function = Function::new(decl.clone(), self.scope.clone());
        Ok(Completion::Normal(Value::Function(function)))
    }

    fn visit_function_return(&mut self, expr: &Node) -> RuntimeResult<Completion> {
        let value = value!(self.visit(expr));
        Ok(Completion::Return(value))
    }

    fn visit_break_statement(&mut self) -> RuntimeResult<Completion> {
        Ok(Completion::Break)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::javascript::parse;

    fn run(source: &str) -> RuntimeResult<Value> {
        let ast = parse(source).expect("source should parse");
        Evaluator::new(Scope::new(), 64).execute(&ast)
    }

    #[test]
    fn test_last_statement_is_the_result() {
        assert_eq!(run("1 + 2;"), Ok(Value::Integer(3)));
        assert_eq!(run("let x = 5;"), Ok(Value::Integer(5)));
        assert_eq!(run(""), Ok(Value::Undefined));
    }

    #[test]
    fn test_scope_is_restored_after_errors() {
        let mut evaluator = Evaluator::new(Scope::new(), 64);
        let failing = parse("{ let inner = 1; missing; }").expect("valid");
        assert!(evaluator.execute(&failing).is_err());
        let probe = parse("inner;").expect("valid");
        assert_eq!(
            evaluator.execute(&probe),
            Err(RuntimeError::UndefinedVariable("inner".to_string()))
        );
    }

    #[test]
    fn test_short_circuit_skips_right_side() {
        assert_eq!(run("false && missing;"), Ok(Value::Boolean(false)));
        assert_eq!(run("1 || missing;"), Ok(Value::Integer(1)));
        let err = run("true && missing;").expect_err("right side is evaluated");
        assert_eq!(err.category(), "ReferenceError");
    }

    #[test]
    fn test_updates() {
        assert_eq!(run("let i = 1; i++;"), Ok(Value::Integer(1)));
        assert_eq!(run("let i = 1; ++i;"), Ok(Value::Integer(2)));
        assert_eq!(run("let a = [1]; a[0]++; a[0];"), Ok(Value::Integer(2)));
        assert_eq!(run("let a = [5]; a.length++;"), Ok(Value::Integer(1)));
    }

    #[test]
    fn test_break_stops_loop() {
        let source = "let n = 0; for (;;) { n++; if (n == 3) { break; } } n;";
        assert_eq!(run(source), Ok(Value::Integer(3)));
    }

    #[test]
    fn test_call_depth_is_bounded() {
        let ast = parse("function down(n) { return down(n + 1); } down(0);").expect("valid");
        let err = Evaluator::new(Scope::new(), 16).execute(&ast).expect_err("unbounded recursion");
        assert_eq!(err, RuntimeError::CallStackExceeded(16));
        assert_eq!(err.category(), "RangeError");
    }

    #[test]
    fn test_index_errors() {
        assert_eq!(run("let n = 1; n[0];"), Err(RuntimeError::NotIndexable("number")));
        assert_eq!(
            run("let a = []; a[-1] = 1;"),
            Err(RuntimeError::InvalidIndex("-1".to_string()))
        );
        assert_eq!(
            run("let a = []; a[100000000000000] = 1; a.length;"),
            Err(RuntimeError::InvalidIndex("100000000000000".to_string()))
        );
        assert_eq!(run("let a = [1]; a[3] = 4; a.length;"), Ok(Value::Integer(4)));
        assert_eq!(run("'abc'[1];"), Ok(Value::Char('b')));
        assert_eq!(run("[1, 2][5];"), Ok(Value::Undefined));
    }

    #[test]
    fn test_calling_a_non_function() {
        let err = run("let x = 1; x();").expect_err("x is a number");
        assert_eq!(err.to_string(), "x is not a function");
    }
}
