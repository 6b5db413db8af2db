//! Built-in members of arrays and strings, and the prelude of global
//! functions.

pub mod array;
pub mod prelude;
pub mod string;

use super::error::{RuntimeError, RuntimeResult};
use super::value::{Array, Cursor, Value};

/// Calls back into the evaluator, e.g. for the predicate given to `some`.
pub trait Invoke {
    fn invoke(&mut self, callee: &Value, arguments: Vec<Value>) -> RuntimeResult<Value>;
}

/// A built-in method resolved against its receiver.
pub enum BoundMethod {
    Array(Array, array::ArrayMethod),
    String(String, string::StringMethod),
}

impl BoundMethod {
    pub fn call(self, arguments: Vec<Value>, invoker: &mut dyn Invoke) -> RuntimeResult<Value> {
        match self {
            BoundMethod::Array(receiver, method) => method(&receiver, arguments, invoker),
            BoundMethod::String(receiver, method) => method(&receiver, arguments),
        }
    }
}

/// Looks up a method by name on the receiver's kind. `None` when the kind has
/// no such built-in.
pub fn method(object: &Value, name: &str) -> Option<BoundMethod> {
    match object {
        Value::Array(receiver) => array::method(name).map(|m| BoundMethod::Array(receiver.clone(), m)),
        Value::String(receiver) => {
            string::method(name).map(|m| BoundMethod::String(receiver.clone(), m))
        }
        Value::Char(c) => string::method(name).map(|m| BoundMethod::String(c.to_string(), m)),
        _ => None,
    }
}

/// Property reads such as `length`.
pub fn accessor(object: &Value, name: &str) -> RuntimeResult<Value> {
    match (object, name) {
        (Value::Array(array), "length") => Ok(Value::Integer(array.len() as i64)),
        (Value::String(s), "length") => Ok(Value::Integer(s.chars().count() as i64)),
        (Value::Char(_), "length") => Ok(Value::Integer(1)),
        (_, "@@iterator") => Ok(Value::Iterator(iterator(object)?)),
        _ => Err(RuntimeError::UnknownMember {
            kind: object.type_name(),
            member: name.to_string(),
        }),
    }
}

pub fn iterator(object: &Value) -> RuntimeResult<Cursor> {
    match object {
        Value::Array(array) => Ok(Cursor::over_array(array)),
        Value::String(s) => Ok(Cursor::over_chars(s)),
        Value::Char(c) => Ok(Cursor::over_chars(&c.to_string())),
        Value::Iterator(cursor) => Ok(cursor.clone()),
        other => Err(RuntimeError::NotIterable(other.type_name())),
    }
}

/// The first argument as a callable, for methods taking a callback.
fn callback(arguments: Vec<Value>, method: &'static str) -> RuntimeResult<Value> {
    match arguments.into_iter().next() {
        Some(callee) if callee.is_callable() => Ok(callee),
        _ => Err(RuntimeError::InvalidArgument {
            method,
            expected: "a function",
        }),
    }
}

/// Argument `index` as text. Chars count as one-character strings.
fn text_argument(arguments: &[Value], index: usize, method: &'static str) -> RuntimeResult<String> {
    match arguments.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Char(c)) => Ok(c.to_string()),
        _ => Err(RuntimeError::InvalidArgument {
            method,
            expected: "a string",
        }),
    }
}
