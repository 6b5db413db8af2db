//! Golden programs run end to end through the interpreter.
//!
//! Each case is a small script together with the value of its last statement,
//! or the error it has to fail with.

use super::{Error, Interpreter, RuntimeError, Value};

fn run(source: &str) -> Result<Value, Error> {
    Interpreter::new().run(source)
}

fn ints(values: &[i64]) -> Value {
    Value::from(values.iter().map(|n| Value::Integer(*n)).collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(run("1 + 2 * 3;"), Ok(Value::Integer(7)));
        assert_eq!(run("(1 + 2) * 3;"), Ok(Value::Integer(9)));
        assert_eq!(run("2 ** 3 ** 2;"), Ok(Value::Integer(512)));
        assert_eq!(run("1 + 2;"), Ok(Value::Integer(3)));
    }

    #[test]
    fn test_reassignment() {
        assert_eq!(run("let x = 1; x = 2; x;"), Ok(Value::Integer(2)));
    }

    #[test]
    fn test_for_loop_sum() {
        let source = "let sum = 0; for (let i = 1; i <= 5; i++) { sum += i; } sum;";
        assert_eq!(run(source), Ok(Value::Integer(15)));
    }

    #[test]
    fn test_function_call() {
        assert_eq!(run("function add(a, b) { return a + b; } add(3, 4);"), Ok(Value::Integer(7)));
    }

    #[test]
    fn test_nested_functions() {
        let source = "
            function outer(a) {
                function inner(b) { return a * b; }
                return inner(10) + a;
            }
            outer(10);";
        assert_eq!(run(source), Ok(Value::Integer(110)));
    }

    #[test]
    fn test_recursion() {
        let source = "
            function fib(n) {
                if (n < 2) { return n; }
                return fib(n - 1) + fib(n - 2);
            }
            fib(10);";
        assert_eq!(run(source), Ok(Value::Integer(55)));
    }

    #[test]
    fn test_early_return() {
        let source = "function sign(n) { if (n < 0) { return -1; } return 1; } sign(-5);";
        assert_eq!(run(source), Ok(Value::Integer(-1)));

        let source = "
            function first(xs) {
                for (const x of xs) {
                    if (x > 1) { return x; }
                }
                return 0;
            }
            first([1, 5, 7]);";
        assert_eq!(run(source), Ok(Value::Integer(5)));
    }

    #[test]
    fn test_if_else_chain() {
        let source = "
            let grade = 75;
            let label = 'none';
            if (grade >= 90) { label = 'A'; }
            else if (grade >= 70) { label = 'B'; }
            else { label = 'C'; }
            label;";
        assert_eq!(run(source), Ok(Value::from("B")));
    }

    #[test]
    fn test_for_of_sum() {
        let source = "let total = 0; for (const n of [1, 2, 3]) { total += n; } total;";
        assert_eq!(run(source), Ok(Value::Integer(6)));
    }

    #[test]
    fn test_for_of_binding_does_not_leak() {
        let err = run("for (let n of [1, 2]) { n; } n;").expect_err("n is loop scoped");
        assert_eq!(err, Error::Runtime(RuntimeError::UndefinedVariable("n".to_string())));
    }

    #[test]
    fn test_for_of_const_binding() {
        let err = run("for (const n of [1]) { n = 2; }").expect_err("n is const");
        assert_eq!(err.category(), "AssignmentError");
    }

    #[test]
    fn test_for_of_over_string() {
        let source = "let out = ''; for (const c of 'abc') { out = c + out; } out;";
        assert_eq!(run(source), Ok(Value::from("cba")));
    }

    #[test]
    fn test_array_aliasing() {
        let result = run("let a = [1, 2, 3]; let b = a; b[1] = 10; a;").expect("valid program");
        assert_eq!(result, ints(&[1, 10, 3]));
        assert_eq!(result.to_string(), "[1, 10, 3]");
    }

    #[test]
    fn test_array_methods() {
        assert_eq!(run("[1, 2, 3].map(n => n * 2);"), Ok(ints(&[2, 4, 6])));
        assert_eq!(run("[1, 2, 3].some(n => n > 2);"), Ok(Value::Boolean(true)));
        assert_eq!(
            run("let a = [3, 1]; a.push(4); a.shift(); a.reverse(); a;"),
            Ok(ints(&[4, 1]))
        );
        assert_eq!(
            run("[1, 2, 3, 4].filter(n => n % 2 == 0).join('-');"),
            Ok(Value::from("2-4"))
        );
        assert_eq!(run("let a = [1, 2]; a.pop(); a.length;"), Ok(Value::Integer(1)));
    }

    #[test]
    fn test_closures_capture_their_scope() {
        let source = "
            function counter() {
                let count = 0;
                return () => { count++; return count; };
            }
            let next = counter();
            next();
            next();";
        assert_eq!(run(source), Ok(Value::Integer(2)));

        assert_eq!(run("let k = 3; [1, 2].map(n => n * k);"), Ok(ints(&[3, 6])));
    }

    #[test]
    fn test_method_fallback_binds_this() {
        let source = "function double() { return this * 2; } let n = 21; n.double();";
        assert_eq!(run(source), Ok(Value::Integer(42)));

        let err = run("let n = 1; n.missing();").expect_err("no such member");
        assert_eq!(err.category(), "UnsupportedFeature");
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(run("'a-b-c'.split('-').length;"), Ok(Value::Integer(3)));
        assert_eq!(
            run("\"hello world\".replaceAll(\"o\", \"0\").toUpperCase();"),
            Ok(Value::from("HELL0 W0RLD"))
        );
        assert_eq!(run("'total: ' + 3;"), Ok(Value::from("total: 3")));
    }

    #[test]
    fn test_print_returns_undefined() {
        assert_eq!(run("print('sum', 1 + 2);"), Ok(Value::Undefined));
    }

    #[test]
    fn test_division() {
        assert_eq!(run("7 / 2;"), Ok(Value::Integer(3)));
        assert_eq!(run("7 / 0;").map(|value| value.to_string()), Ok("Infinity".to_string()));
    }

    #[test]
    fn test_const_assignment_message() {
        let err = run("const x = 1; x = 2;").expect_err("x is const");
        assert_eq!(
            err.to_string(),
            "AssignmentError: Illegal assignment on const variable: \"x\""
        );
    }

    #[test]
    fn test_redeclaration() {
        let err = run("let a = 1; let a = 2;").expect_err("same scope");
        assert_eq!(err.to_string(), "AssignmentError: Already defined in scope: \"a\"");
        assert_eq!(run("let a = 1; { let a = 2; } a;"), Ok(Value::Integer(1)));
    }

    #[test]
    fn test_too_many_arguments() {
        let err = run("function one(a) { return a; } one(1, 2);").expect_err("extra argument");
        assert_eq!(err.category(), "ArityError");
    }

    #[test]
    fn test_syntax_errors_are_reported() {
        let err = run("let x = 1;\nlet = 2;").expect_err("missing name");
        assert_eq!(err.category(), "SyntaxError");
        assert!(err.to_string().ends_with("(2:4)"));
    }
}
