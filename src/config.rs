/// Settings for an [`Interpreter`](crate::Interpreter).
#[derive(Clone, Debug)]
pub struct InterpreterConfig {
    /// Nested user-function calls allowed before evaluation fails with a
    /// `RangeError`.
    pub max_call_depth: usize,
    /// Bind the native prelude functions (`print`) in the global scope.
    pub enable_prelude: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 512,
            enable_prelude: true,
        }
    }
}
