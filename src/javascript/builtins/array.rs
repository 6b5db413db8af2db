use super::{Invoke, callback};
use crate::javascript::error::RuntimeResult;
use crate::javascript::operators;
use crate::javascript::value::{Array, Value};

pub type ArrayMethod = fn(&Array, Vec<Value>, &mut dyn Invoke) -> RuntimeResult<Value>;

pub fn method(name: &str) -> Option<ArrayMethod> {
    let method: ArrayMethod = match name {
        "push" => push,
        "pop" => pop,
        "shift" => shift,
        "reverse" => reverse,
        "some" => some,
        "map" => map,
        "filter" => filter,
        "forEach" => for_each,
        "join" => join,
        "includes" => includes,
        "indexOf" => index_of,
        _ => return None,
    };
    Some(method)
}

/// Returns the new length.
fn push(array: &Array, arguments: Vec<Value>, _: &mut dyn Invoke) -> RuntimeResult<Value> {
    let mut length = array.len();
    for value in arguments {
        length = array.push(value);
    }
    Ok(Value::Integer(length as i64))
}

fn pop(array: &Array, _: Vec<Value>, _: &mut dyn Invoke) -> RuntimeResult<Value> {
    Ok(array.pop().unwrap_or(Value::Undefined))
}

fn shift(array: &Array, _: Vec<Value>, _: &mut dyn Invoke) -> RuntimeResult<Value> {
    Ok(array.shift().unwrap_or(Value::Undefined))
}

/// Reverses in place and returns the same array.
fn reverse(array: &Array, _: Vec<Value>, _: &mut dyn Invoke) -> RuntimeResult<Value> {
    array.reverse();
    Ok(Value::Array(array.clone()))
}

fn some(array: &Array, arguments: Vec<Value>, invoker: &mut dyn Invoke) -> RuntimeResult<Value> {
    let predicate = callback(arguments, "some")?;
    for item in array.snapshot() {
        if invoker.invoke(&predicate, vec![item])?.is_truthy() {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

fn map(array: &Array, arguments: Vec<Value>, invoker: &mut dyn Invoke) -> RuntimeResult<Value> {
    let mapper = callback(arguments, "map")?;
    let items = array
        .snapshot()
        .into_iter()
        .map(|item| invoker.invoke(&mapper, vec![item]))
        .collect::<RuntimeResult<Vec<_>>>()?;
    Ok(Value::from(items))
}

fn filter(array: &Array, arguments: Vec<Value>, invoker: &mut dyn Invoke) -> RuntimeResult<Value> {
    let predicate = callback(arguments, "filter")?;
    let mut kept = Vec::new();
    for item in array.snapshot() {
        if invoker.invoke(&predicate, vec![item.clone()])?.is_truthy() {
            kept.push(item);
        }
    }
    Ok(Value::from(kept))
}

fn for_each(array: &Array, arguments: Vec<Value>, invoker: &mut dyn Invoke) -> RuntimeResult<Value> {
    let action = callback(arguments, "forEach")?;
    for item in array.snapshot() {
        invoker.invoke(&action, vec![item])?;
    }
    Ok(Value::Undefined)
}

fn join(array: &Array, arguments: Vec<Value>, _: &mut dyn Invoke) -> RuntimeResult<Value> {
    let separator = match arguments.first() {
        None | Some(Value::Undefined) => ",".to_string(),
        Some(_) => super::text_argument(&arguments, 0, "join")?,
    };
    let parts: Vec<String> = array
        .snapshot()
        .iter()
        .map(|item| match item {
            Value::Undefined => String::new(),
            other => other.to_string(),
        })
        .collect();
    Ok(Value::String(parts.join(&separator)))
}

fn includes(array: &Array, arguments: Vec<Value>, _: &mut dyn Invoke) -> RuntimeResult<Value> {
    let needle = arguments.into_iter().next().unwrap_or(Value::Undefined);
    let found = array.snapshot().iter().any(|item| operators::equal(item, &needle));
    Ok(Value::Boolean(found))
}

/// `-1` when absent.
fn index_of(array: &Array, arguments: Vec<Value>, _: &mut dyn Invoke) -> RuntimeResult<Value> {
    let needle = arguments.into_iter().next().unwrap_or(Value::Undefined);
    let index = array
        .snapshot()
        .iter()
        .position(|item| operators::equal(item, &needle))
        .map_or(-1, |index| index as i64);
    Ok(Value::Integer(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::javascript::error::RuntimeError;

    /// Applies native callbacks directly, without an evaluator.
    struct NativeInvoker;

    impl Invoke for NativeInvoker {
        fn invoke(&mut self, callee: &Value, arguments: Vec<Value>) -> RuntimeResult<Value> {
            match callee {
                Value::Native(native) => (native.call)(&arguments),
                _ => Err(RuntimeError::NotCallable(callee.to_string())),
            }
        }
    }

    fn native(name: &'static str, call: crate::javascript::value::NativeFn) -> Value {
        Value::Native(crate::javascript::value::NativeFunction { name, call })
    }

    fn double(arguments: &[Value]) -> RuntimeResult<Value> {
        match arguments.first() {
            Some(Value::Integer(n)) => Ok(Value::Integer(n * 2)),
            _ => Ok(Value::Undefined),
        }
    }

    fn is_even(arguments: &[Value]) -> RuntimeResult<Value> {
        Ok(Value::Boolean(matches!(arguments.first(), Some(Value::Integer(n)) if n % 2 == 0)))
    }

    fn ints(values: &[i64]) -> Array {
        Array::new(values.iter().map(|n| Value::Integer(*n)).collect())
    }

    fn call(array: &Array, name: &str, arguments: Vec<Value>) -> RuntimeResult<Value> {
        let method = method(name).expect("known method");
        method(array, arguments, &mut NativeInvoker)
    }

    #[test]
    fn test_push_pop_shift() {
        let array = ints(&[1, 2]);
        assert_eq!(call(&array, "push", vec![Value::Integer(3), Value::Integer(4)]), Ok(Value::Integer(4)));
        assert_eq!(call(&array, "pop", vec![]), Ok(Value::Integer(4)));
        assert_eq!(call(&array, "shift", vec![]), Ok(Value::Integer(1)));
        assert_eq!(array.snapshot(), ints(&[2, 3]).snapshot());

        let empty = ints(&[]);
        assert_eq!(call(&empty, "pop", vec![]), Ok(Value::Undefined));
        assert_eq!(call(&empty, "shift", vec![]), Ok(Value::Undefined));
    }

    #[test]
    fn test_reverse_is_in_place() {
        let array = ints(&[1, 2, 3]);
        let Ok(Value::Array(result)) = call(&array, "reverse", vec![]) else {
            panic!("reverse returns the array");
        };
        assert!(result.ptr_eq(&array));
        assert_eq!(array.snapshot(), ints(&[3, 2, 1]).snapshot());
    }

    #[test]
    fn test_callbacks() {
        let array = ints(&[1, 2, 3]);
        assert_eq!(
            call(&array, "map", vec![native("double", double)]),
            Ok(Value::from(ints(&[2, 4, 6]).snapshot()))
        );
        assert_eq!(
            call(&array, "filter", vec![native("is_even", is_even)]),
            Ok(Value::from(ints(&[2]).snapshot()))
        );
        assert_eq!(call(&array, "some", vec![native("is_even", is_even)]), Ok(Value::Boolean(true)));
        assert_eq!(
            call(&ints(&[1, 3]), "some", vec![native("is_even", is_even)]),
            Ok(Value::Boolean(false))
        );
    }

    #[test]
    fn test_callback_must_be_callable() {
        let err = call(&ints(&[1]), "map", vec![Value::Integer(1)]).expect_err("not a function");
        assert_eq!(err.to_string(), "map expects a function");
    }

    #[test]
    fn test_join_includes_index_of() {
        let array = Array::new(vec![Value::Integer(1), Value::from("a"), Value::Undefined]);
        assert_eq!(call(&array, "join", vec![]), Ok(Value::from("1,a,")));
        assert_eq!(call(&array, "join", vec![Value::from(" - ")]), Ok(Value::from("1 - a - ")));
        assert_eq!(call(&array, "includes", vec![Value::from("a")]), Ok(Value::Boolean(true)));
        assert_eq!(call(&array, "indexOf", vec![Value::from("a")]), Ok(Value::Integer(1)));
        assert_eq!(call(&array, "indexOf", vec![Value::Integer(7)]), Ok(Value::Integer(-1)));
    }

    #[test]
    fn test_unknown_method() {
        assert!(method("splice").is_none());
    }
}
