use super::ast::DeclarationKind;
use super::error::{RuntimeError, RuntimeResult};
use super::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    kind: DeclarationKind,
}

#[derive(Default)]
struct Frame {
    bindings: HashMap<String, Binding>,
    parent: Option<Scope>,
}

/// One link of the scope chain. Clones share the same frame, and a child only
/// refers to its parent, never copies from it.
#[derive(Clone, Default)]
pub struct Scope(Rc<RefCell<Frame>>);

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self) -> Scope {
        Scope(Rc::new(RefCell::new(Frame {
            bindings: HashMap::new(),
            parent: Some(self.clone()),
        })))
    }

    /// Declares `name` in this scope. Shadowing a parent binding is fine,
    /// declaring the same name twice in one scope is not.
    pub fn def(&self, name: &str, value: Value, kind: DeclarationKind) -> RuntimeResult<()> {
        let mut frame = self.0.borrow_mut();
        if frame.bindings.contains_key(name) {
            return Err(RuntimeError::DuplicateBinding(name.to_string()));
        }
        trace!(target: "javascript", "def {} {} = {}", kind.as_str(), name, value);
        frame.bindings.insert(name.to_string(), Binding { value, kind });
        Ok(())
    }

    /// Binds `name` in this scope, replacing any existing binding.
    pub fn redef(&self, name: &str, value: Value, kind: DeclarationKind) {
        trace!(target: "javascript", "redef {} {} = {}", kind.as_str(), name, value);
        self.0
            .borrow_mut()
            .bindings
            .insert(name.to_string(), Binding { value, kind });
    }

    pub fn get(&self, name: &str) -> RuntimeResult<Value> {
        let scope = self
            .lookup(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))?;
        let frame = scope.0.borrow();
        frame
            .bindings
            .get(name)
            .map(|binding| binding.value.clone())
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
    }

    /// Overwrites the binding in the scope that declared it.
    pub fn set(&self, name: &str, value: Value) -> RuntimeResult<()> {
        let scope = self
            .lookup(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))?;
        let mut frame = scope.0.borrow_mut();
        let binding = frame
            .bindings
            .get_mut(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))?;
        if binding.kind == DeclarationKind::Const {
            return Err(RuntimeError::IllegalConstAssignment(name.to_string()));
        }
        binding.value = value;
        Ok(())
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// The nearest scope, starting here, that binds `name`.
    pub fn lookup(&self, name: &str) -> Option<Scope> {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            if scope.has_own(name) {
                return Some(scope);
            }
            current = scope.0.borrow().parent.clone();
        }
        None
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
