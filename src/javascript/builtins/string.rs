use super::text_argument;
use crate::javascript::error::RuntimeResult;
use crate::javascript::value::Value;

pub type StringMethod = fn(&str, Vec<Value>) -> RuntimeResult<Value>;

pub fn method(name: &str) -> Option<StringMethod> {
    let method: StringMethod = match name {
        "split" => split,
        "replaceAll" => replace_all,
        "toUpperCase" => |s, _| Ok(Value::from(s.to_uppercase())),
        "toLowerCase" => |s, _| Ok(Value::from(s.to_lowercase())),
        "trim" => |s, _| Ok(Value::from(s.trim())),
        "includes" => includes,
        _ => return None,
    };
    Some(method)
}

/// An empty separator splits into single characters; no separator yields the
/// whole string as the only element.
fn split(text: &str, arguments: Vec<Value>) -> RuntimeResult<Value> {
    if arguments.is_empty() {
        return Ok(Value::from(vec![Value::from(text)]));
    }
    let separator = text_argument(&arguments, 0, "split")?;
    let parts: Vec<Value> = if separator.is_empty() {
        text.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        text.split(separator.as_str()).map(Value::from).collect()
    };
    Ok(Value::from(parts))
}

fn replace_all(text: &str, arguments: Vec<Value>) -> RuntimeResult<Value> {
    let from = text_argument(&arguments, 0, "replaceAll")?;
    let to = text_argument(&arguments, 1, "replaceAll")?;
    Ok(Value::String(text.replace(&from, &to)))
}

fn includes(text: &str, arguments: Vec<Value>) -> RuntimeResult<Value> {
    let needle = text_argument(&arguments, 0, "includes")?;
    Ok(Value::Boolean(text.contains(&needle)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(text: &str, name: &str, arguments: Vec<Value>) -> RuntimeResult<Value> {
        let method = method(name).expect("known method");
        method(text, arguments)
    }

    fn strings(parts: &[&str]) -> Value {
        Value::from(parts.iter().map(|part| Value::from(*part)).collect::<Vec<_>>())
    }

    #[test]
    fn test_split() {
        assert_eq!(
            call("the quick fox", "split", vec![Value::from(" ")]),
            Ok(strings(&["the", "quick", "fox"]))
        );
        assert_eq!(call("abc", "split", vec![Value::from("")]), Ok(strings(&["a", "b", "c"])));
        assert_eq!(call("a,b", "split", vec![Value::Char(',')]), Ok(strings(&["a", "b"])));
        assert_eq!(call("abc", "split", vec![]), Ok(strings(&["abc"])));
    }

    #[test]
    fn test_replace_all() {
        assert_eq!(
            call("a-b-c", "replaceAll", vec![Value::from("-"), Value::from("+")]),
            Ok(Value::from("a+b+c"))
        );
        let err = call("abc", "replaceAll", vec![Value::from("a")]).expect_err("missing replacement");
        assert_eq!(err.to_string(), "replaceAll expects a string");
    }

    #[test]
    fn test_case_trim_includes() {
        assert_eq!(call("Hey", "toUpperCase", vec![]), Ok(Value::from("HEY")));
        assert_eq!(call("Hey", "toLowerCase", vec![]), Ok(Value::from("hey")));
        assert_eq!(call("  pad ", "trim", vec![]), Ok(Value::from("pad")));
        assert_eq!(call("haystack", "includes", vec![Value::from("st")]), Ok(Value::Boolean(true)));
        assert!(method("charAt").is_none());
    }
}
