use crate::javascript::ast::DeclarationKind;
use crate::javascript::error::RuntimeResult;
use crate::javascript::scope::Scope;
use crate::javascript::value::{NativeFunction, Value};
use crate::logger::CONSOLE_TARGET;
use log::info;

const PRELUDE: &[NativeFunction] = &[NativeFunction { name: "print", call: print }];

/// Binds the prelude functions as constants in `scope`.
pub fn install(scope: &Scope) {
    for native in PRELUDE {
        scope.redef(native.name, Value::Native(*native), DeclarationKind::Const);
    }
}

/// Writes its arguments, space separated, to the script console.
fn print(arguments: &[Value]) -> RuntimeResult<Value> {
    let line = arguments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    info!(target: CONSOLE_TARGET, "{}", line);
    Ok(Value::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_binds_constants() {
        let scope = Scope::new();
        install(&scope);
        let print = scope.get("print").expect("installed");
        assert!(print.is_callable());
        assert!(scope.set("print", Value::Undefined).is_err());
    }

    #[test]
    fn test_print_returns_undefined() {
        assert_eq!(print(&[Value::from("a"), Value::Integer(1)]), Ok(Value::Undefined));
    }
}
