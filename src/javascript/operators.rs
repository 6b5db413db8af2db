//! Operator semantics over runtime values.
//!
//! Integer pairs use checked integer arithmetic and fall back to floating
//! point on overflow; any float operand promotes both sides. Division by zero
//! follows IEEE rules and produces `Infinity` or `NaN`. Nothing is coerced
//! implicitly apart from `+` building strings.

use super::ast::{BinaryOperator, UnaryOperator};
use super::error::{RuntimeError, RuntimeResult};
use super::value::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(n) => Some(Numeric::Int(*n)),
            Value::Float(n) => Some(Numeric::Float(*n)),
            Value::NaN => Some(Numeric::Float(f64::NAN)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(n) => n as f64,
            Numeric::Float(n) => n,
        }
    }

    fn to_int32(self) -> i32 {
        match self {
            Numeric::Int(n) => n as i32,
            Numeric::Float(n) if n.is_finite() => n.trunc() as i64 as i32,
            Numeric::Float(_) => 0,
        }
    }
}

fn unsupported(operator: &str, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::UnsupportedOperandTypes {
        operator: operator.to_string(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

fn concatenable(value: &Value) -> bool {
    matches!(
        value,
        Value::String(_)
            | Value::Char(_)
            | Value::Integer(_)
            | Value::Float(_)
            | Value::NaN
            | Value::Boolean(_)
            | Value::Undefined
    )
}

pub fn binary(operator: BinaryOperator, left: &Value, right: &Value) -> RuntimeResult<Value> {
    use BinaryOperator::*;
    match operator {
        Assign => Ok(right.clone()),
        Add => add(left, right),
        Subtract | Multiply | Divide | Remainder | Exponent => arithmetic(operator, left, right),
        Equal | StrictEqual => Ok(Value::Boolean(equal(left, right))),
        NotEqual | StrictNotEqual => Ok(Value::Boolean(!equal(left, right))),
        LessThan | LessThanEqual | GreaterThan | GreaterThanEqual => compare(operator, left, right),
        LogicalAnd => Ok(if left.is_truthy() { right.clone() } else { left.clone() }),
        LogicalOr => Ok(if left.is_truthy() { left.clone() } else { right.clone() }),
        Nullish => Ok(match left {
            Value::Undefined => right.clone(),
            other => other.clone(),
        }),
        BitwiseAnd | BitwiseOr | BitwiseXor | ShiftLeft | ShiftRight | UnsignedShiftRight => {
            bitwise(operator, left, right)
        }
    }
}

fn add(left: &Value, right: &Value) -> RuntimeResult<Value> {
    let is_text = |value: &Value| matches!(value, Value::String(_) | Value::Char(_));
    if (is_text(left) || is_text(right)) && concatenable(left) && concatenable(right) {
        return Ok(Value::String(format!("{}{}", left, right)));
    }
    arithmetic(BinaryOperator::Add, left, right)
}

fn arithmetic(operator: BinaryOperator, left: &Value, right: &Value) -> RuntimeResult<Value> {
    let (Some(a), Some(b)) = (Numeric::of(left), Numeric::of(right)) else {
        return Err(unsupported(operator.symbol(), left, right));
    };
    if let (Numeric::Int(a), Numeric::Int(b)) = (a, b) {
        if let Some(result) = integer_arithmetic(operator, a, b) {
            return Ok(Value::Integer(result));
        }
    }
    let (a, b) = (a.as_f64(), b.as_f64());
    let result = match operator {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => a / b,
        BinaryOperator::Remainder => a % b,
        BinaryOperator::Exponent => a.powf(b),
        _ => return Err(unsupported(operator.symbol(), left, right)),
    };
    Ok(Value::number(result))
}

/// `None` when the result does not fit an integer.
fn integer_arithmetic(operator: BinaryOperator, a: i64, b: i64) -> Option<i64> {
    match operator {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Subtract => a.checked_sub(b),
        BinaryOperator::Multiply => a.checked_mul(b),
        BinaryOperator::Divide => a.checked_div(b),
        BinaryOperator::Remainder => a.checked_rem(b),
        BinaryOperator::Exponent => u32::try_from(b).ok().and_then(|b| a.checked_pow(b)),
        _ => None,
    }
}

/// `==` and `===` alike: same kind and same content. Strings and chars
/// compare by text, arrays and functions by identity.
pub fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Char(a), Value::Char(b)) => a == b,
        (Value::String(s), Value::Char(c)) | (Value::Char(c), Value::String(s)) => {
            let mut chars = s.chars();
            chars.next() == Some(*c) && chars.next().is_none()
        }
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Undefined, Value::Undefined) => true,
        (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
        (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
        (Value::Native(a), Value::Native(b)) => a.name == b.name,
        _ => match (Numeric::of(left), Numeric::of(right)) {
            (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
            _ => false,
        },
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Char(c) => Some(c.to_string()),
        _ => None,
    }
}

fn compare(operator: BinaryOperator, left: &Value, right: &Value) -> RuntimeResult<Value> {
    let ordering = match (Numeric::of(left), Numeric::of(right)) {
        (Some(Numeric::Int(a)), Some(Numeric::Int(b))) => Some(a.cmp(&b)),
        (Some(a), Some(b)) => a.as_f64().partial_cmp(&b.as_f64()),
        _ => match (text(left), text(right)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => return Err(unsupported(operator.symbol(), left, right)),
        },
    };
    // NaN compares false with everything.
    let Some(ordering) = ordering else {
        return Ok(Value::Boolean(false));
    };
    let result = match operator {
        BinaryOperator::LessThan => ordering == Ordering::Less,
        BinaryOperator::LessThanEqual => ordering != Ordering::Greater,
        BinaryOperator::GreaterThan => ordering == Ordering::Greater,
        BinaryOperator::GreaterThanEqual => ordering != Ordering::Less,
        _ => return Err(unsupported(operator.symbol(), left, right)),
    };
    Ok(Value::Boolean(result))
}

fn bitwise(operator: BinaryOperator, left: &Value, right: &Value) -> RuntimeResult<Value> {
    let (Some(a), Some(b)) = (Numeric::of(left), Numeric::of(right)) else {
        return Err(unsupported(operator.symbol(), left, right));
    };
    let (a, b) = (a.to_int32(), b.to_int32());
    let shift = (b as u32) & 31;
    let result = match operator {
        BinaryOperator::BitwiseAnd => i64::from(a & b),
        BinaryOperator::BitwiseOr => i64::from(a | b),
        BinaryOperator::BitwiseXor => i64::from(a ^ b),
        BinaryOperator::ShiftLeft => i64::from(a.wrapping_shl(shift)),
        BinaryOperator::ShiftRight => i64::from(a >> shift),
        BinaryOperator::UnsignedShiftRight => i64::from((a as u32) >> shift),
        _ => return Err(unsupported(operator.symbol(), left, right)),
    };
    Ok(Value::Integer(result))
}

pub fn unary(operator: UnaryOperator, operand: &Value) -> RuntimeResult<Value> {
    let numeric = Numeric::of(operand);
    match (operator, numeric) {
        (UnaryOperator::Not, _) => Ok(Value::Boolean(!operand.is_truthy())),
        (UnaryOperator::Plus, Some(_)) => Ok(operand.clone()),
        (UnaryOperator::Negate, Some(Numeric::Int(n))) => Ok(match n.checked_neg() {
            Some(negated) => Value::Integer(negated),
            None => Value::number(-(n as f64)),
        }),
        (UnaryOperator::Negate, Some(Numeric::Float(n))) => Ok(Value::number(-n)),
        (UnaryOperator::Increment, Some(_)) => arithmetic(BinaryOperator::Add, operand, &Value::Integer(1)),
        (UnaryOperator::Decrement, Some(_)) => {
            arithmetic(BinaryOperator::Subtract, operand, &Value::Integer(1))
        }
        (_, None) => Err(RuntimeError::UnsupportedOperandTypes {
            operator: operator.symbol().to_string(),
            left: operand.type_name(),
            right: "nothing",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(operator: BinaryOperator, left: impl Into<Value>, right: impl Into<Value>) -> Value {
        binary(operator, &left.into(), &right.into()).expect("operands are supported")
    }

    #[test]
    fn test_integer_arithmetic_stays_integral() {
        assert_eq!(apply(BinaryOperator::Add, 1_i64, 2_i64), Value::Integer(3));
        assert_eq!(apply(BinaryOperator::Divide, 7_i64, 2_i64), Value::Integer(3));
        assert_eq!(apply(BinaryOperator::Remainder, -7_i64, 3_i64), Value::Integer(-1));
        assert_eq!(apply(BinaryOperator::Exponent, 2_i64, 10_i64), Value::Integer(1024));
    }

    #[test]
    fn test_float_promotion_and_overflow() {
        assert_eq!(apply(BinaryOperator::Add, 1_i64, 0.5), Value::Float(1.5));
        assert_eq!(apply(BinaryOperator::Exponent, 2_i64, -1_i64), Value::Float(0.5));
        assert_eq!(
            apply(BinaryOperator::Add, i64::MAX, 1_i64),
            Value::Float(i64::MAX as f64 + 1.0)
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(apply(BinaryOperator::Divide, 1_i64, 0_i64), Value::Float(f64::INFINITY));
        assert_eq!(apply(BinaryOperator::Divide, 0_i64, 0_i64), Value::NaN);
        assert_eq!(apply(BinaryOperator::Remainder, 5_i64, 0_i64), Value::NaN);
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(apply(BinaryOperator::Add, "ab", "cd"), Value::from("abcd"));
        assert_eq!(apply(BinaryOperator::Add, "n=", 4_i64), Value::from("n=4"));
        assert_eq!(apply(BinaryOperator::Add, Value::Char('x'), "y"), Value::from("xy"));
    }

    #[test]
    fn test_equality_does_not_coerce() {
        assert_eq!(apply(BinaryOperator::Equal, 1_i64, 1.0), Value::Boolean(true));
        assert_eq!(apply(BinaryOperator::StrictEqual, "1", 1_i64), Value::Boolean(false));
        assert_eq!(apply(BinaryOperator::Equal, Value::Char('a'), "a"), Value::Boolean(true));
        assert_eq!(apply(BinaryOperator::NotEqual, Value::NaN, Value::NaN), Value::Boolean(true));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(apply(BinaryOperator::LessThanEqual, 2_i64, 2_i64), Value::Boolean(true));
        assert_eq!(apply(BinaryOperator::GreaterThan, "b", "a"), Value::Boolean(true));
        assert_eq!(apply(BinaryOperator::LessThan, Value::NaN, 1_i64), Value::Boolean(false));
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(apply(BinaryOperator::BitwiseAnd, 6_i64, 3_i64), Value::Integer(2));
        assert_eq!(apply(BinaryOperator::BitwiseXor, 6_i64, 3_i64), Value::Integer(5));
        assert_eq!(apply(BinaryOperator::ShiftLeft, 1_i64, 4_i64), Value::Integer(16));
        assert_eq!(apply(BinaryOperator::UnsignedShiftRight, -1_i64, 28_i64), Value::Integer(15));
    }

    #[test]
    fn test_unsupported_operands() {
        let err = binary(BinaryOperator::Subtract, &Value::from("a"), &Value::Integer(1))
            .expect_err("strings cannot be subtracted");
        assert_eq!(err.category(), "TypeError");
        assert_eq!(err.to_string(), "Unsupported operand types for '-': string and number");

        let err = unary(UnaryOperator::Negate, &Value::Boolean(true)).expect_err("not a number");
        assert!(matches!(err, RuntimeError::UnsupportedOperandTypes { .. }));
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOperator::Not, &Value::Integer(0)), Ok(Value::Boolean(true)));
        assert_eq!(unary(UnaryOperator::Negate, &Value::Integer(3)), Ok(Value::Integer(-3)));
        assert_eq!(unary(UnaryOperator::Increment, &Value::Float(1.5)), Ok(Value::Float(2.5)));
    }
}
