use super::ast::FunctionDeclaration;
use super::error::RuntimeResult;
use super::scope::Scope;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    NaN,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Char(char),
    Array(Array),
    Function(Function),
    Native(NativeFunction),
    Iterator(Cursor),
}

impl Value {
    /// Wraps a float, folding NaN results into the `NaN` sentinel.
    pub fn number(value: f64) -> Self {
        if value.is_nan() {
            Value::NaN
        } else {
            Value::Float(value)
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::NaN | Value::Integer(_) | Value::Float(_) => "number",
            Value::Boolean(_) => "bool",
            Value::String(_) => "string",
            Value::Char(_) => "char",
            Value::Array(_) => "array",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Iterator(_) => "iterator",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::NaN => false,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Char(_)
            | Value::Array(_)
            | Value::Function(_)
            | Value::Native(_)
            | Value::Iterator(_) => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Char(c) => write!(f, "{:?}", c),
            other => write!(f, "{}", other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::NaN, Value::NaN) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b) || *a.0.borrow() == *b.0.borrow(),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Native(a), Value::Native(b)) => a.name == b.name,
            (Value::Iterator(a), Value::Iterator(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::NaN => f.write_str("NaN"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Float(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => f.write_str(s),
            Value::Char(c) => write!(f, "{}", c),
            Value::Array(array) => {
                f.write_str("[")?;
                for (i, item) in array.0.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            Value::Function(function) => write!(f, "function {}", function.name()),
            Value::Native(native) => write!(f, "function {}", native.name),
            Value::Iterator(_) => f.write_str("[iterator]"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::new(items))
    }
}

/// Largest length an indexed write may grow an array to.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

/// A shared, mutable sequence. Clones alias the same storage.
#[derive(Debug, Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Writes past the end grow the array, filling any gap with `Undefined`.
    /// Returns `false`, leaving the array untouched, when the array would
    /// grow beyond [`MAX_ARRAY_LENGTH`] or the storage cannot be allocated.
    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut items = self.0.borrow_mut();
        let len = items.len();
        if index >= len {
            if index >= MAX_ARRAY_LENGTH || items.try_reserve(index + 1 - len).is_err() {
                return false;
            }
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value;
        true
    }

    pub fn push(&self, value: Value) -> usize {
        let mut items = self.0.borrow_mut();
        items.push(value);
        items.len()
    }

    pub fn pop(&self) -> Option<Value> {
        self.0.borrow_mut().pop()
    }

    pub fn shift(&self) -> Option<Value> {
        let mut items = self.0.borrow_mut();
        if items.is_empty() {
            None
        } else {
            Some(items.remove(0))
        }
    }

    pub fn reverse(&self) {
        self.0.borrow_mut().reverse();
    }

    /// Copy of the current elements. Callbacks iterate over this so they are
    /// free to mutate the array itself.
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A user function together with the scope it was declared in.
#[derive(Clone)]
pub struct Function {
    pub declaration: Rc<FunctionDeclaration>,
    pub closure: Scope,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDeclaration>, closure: Scope) -> Self {
        Self { declaration, closure }
    }

    pub fn name(&self) -> &str {
        self.declaration.display_name()
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.declaration, &other.declaration) && self.closure.ptr_eq(&other.closure)
    }
}

// The closure can reach this function again, so it is left out.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("params", &self.declaration.params)
            .finish_non_exhaustive()
    }
}

pub type NativeFn = fn(&[Value]) -> RuntimeResult<Value>;

#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub call: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

#[derive(Debug)]
enum CursorSource {
    Array(Array),
    Chars(Vec<char>),
}

#[derive(Debug)]
struct CursorState {
    source: CursorSource,
    position: usize,
}

/// Forward-only, single-pass cursor. Array cursors read the live array, so
/// elements pushed during iteration are visited.
#[derive(Debug, Clone)]
pub struct Cursor(Rc<RefCell<CursorState>>);

impl Cursor {
    pub fn over_array(array: &Array) -> Self {
        Self::from_source(CursorSource::Array(array.clone()))
    }

    pub fn over_chars(text: &str) -> Self {
        Self::from_source(CursorSource::Chars(text.chars().collect()))
    }

    fn from_source(source: CursorSource) -> Self {
        Self(Rc::new(RefCell::new(CursorState { source, position: 0 })))
    }

    pub fn next(&self) -> Option<Value> {
        let mut state = self.0.borrow_mut();
        let item = match &state.source {
            CursorSource::Array(array) => array.get(state.position)?,
            CursorSource::Chars(chars) => Value::Char(*chars.get(state.position)?),
        };
        state.position += 1;
        Some(item)
    }
}
