use std::cmp::Ordering;

use crate::ast::Operator;
use crate::object::{EvaluationError, Value};

/// Longest string, in bytes, that string repetition may build.
pub const MAX_STRING_BYTES: usize = 1 << 30;

pub type OperatorFn = fn(&[Value]) -> Result<Value, EvaluationError>;

/// Which operands an operator consumes and how it combines them.
#[derive(Clone, Copy)]
pub struct Primitive {
    pub needs_left: bool,
    pub needs_right: bool,
    pub apply: OperatorFn,
}

/// Looks up the primitive behind `operator`. Assignment binds a name rather
/// than combining values, so it has no entry.
pub fn primitive(operator: Operator) -> Option<Primitive> {
    use Operator::*;
    let (needs_left, needs_right, apply): (bool, bool, OperatorFn) = match operator {
        Add => (true, true, add),
        Subtract => (true, true, subtract),
        Multiply => (true, true, multiply),
        Divide => (true, true, divide),
        Modulo => (true, true, modulo),
        Assign => return None,
        Equal => (true, true, equal),
        GreaterThan => (true, true, greater_than),
        GreaterEqual => (true, true, greater_equal),
        LessThan => (true, true, less_than),
        LessEqual => (true, true, less_equal),
        ToInt => (false, true, to_int),
        ToFloat => (false, true, to_float),
        ToBool => (false, true, to_bool),
        Not => (false, true, not),
        And => (true, true, and),
        Or => (true, true, or),
        Return => (false, true, ret),
    };
    Some(Primitive {
        needs_left,
        needs_right,
        apply,
    })
}

fn binary(operator: Operator, args: &[Value]) -> Result<(&Value, &Value), EvaluationError> {
    match args {
        [left, right] => Ok((left, right)),
        _ => Err(EvaluationError::OperatorArityViolation {
            operator,
            expected: 2,
            actual: args.len(),
        }),
    }
}

fn unary(operator: Operator, args: &[Value]) -> Result<&Value, EvaluationError> {
    match args {
        [operand] => Ok(operand),
        _ => Err(EvaluationError::OperatorArityViolation {
            operator,
            expected: 1,
            actual: args.len(),
        }),
    }
}

fn type_error(operator: Operator, args: &[Value]) -> EvaluationError {
    let operands = args
        .iter()
        .map(|arg| format!("'{}'", arg.type_name()))
        .collect::<Vec<_>>()
        .join(" and ");
    EvaluationError::TypeError {
        operator,
        operands: operands.into(),
    }
}

fn arithmetic(
    operator: Operator,
    args: &[Value],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, EvaluationError> {
    match binary(operator, args)? {
        (Value::Int(left), Value::Int(right)) => int_op(*left, *right)
            .map(Value::Int)
            .ok_or(EvaluationError::ArithmeticOverflow(operator)),
        (left, right) => match (left.as_float(), right.as_float()) {
            (Some(left), Some(right)) => Ok(Value::Float(float_op(left, right))),
            _ => Err(type_error(operator, args)),
        },
    }
}

fn add(args: &[Value]) -> Result<Value, EvaluationError> {
    match binary(Operator::Add, args)? {
        (Value::Str(left), Value::Str(right)) => Ok(Value::Str(format!("{}{}", left, right).into())),
        _ => arithmetic(Operator::Add, args, i64::checked_add, |a, b| a + b),
    }
}

fn subtract(args: &[Value]) -> Result<Value, EvaluationError> {
    arithmetic(Operator::Subtract, args, i64::checked_sub, |a, b| a - b)
}

fn multiply(args: &[Value]) -> Result<Value, EvaluationError> {
    match binary(Operator::Multiply, args)? {
        (Value::Str(text), Value::Int(count)) | (Value::Int(count), Value::Str(text)) => {
            let count = usize::try_from(*count).map_err(|_| type_error(Operator::Multiply, args))?;
            text.len()
                .checked_mul(count)
                .filter(|len| *len <= MAX_STRING_BYTES)
                .ok_or(EvaluationError::ArithmeticOverflow(Operator::Multiply))?;
            Ok(Value::Str(text.repeat(count).into()))
        }
        _ => arithmetic(Operator::Multiply, args, i64::checked_mul, |a, b| a * b),
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Int(value) => *value == 0,
        Value::Float(value) => *value == 0.0,
        _ => false,
    }
}

fn divide(args: &[Value]) -> Result<Value, EvaluationError> {
    let (left, right) = binary(Operator::Divide, args)?;
    if left.as_float().is_some() && is_zero(right) {
        return Err(EvaluationError::DivisionByZero);
    }
    arithmetic(Operator::Divide, args, i64::checked_div, |a, b| a / b)
}

fn modulo(args: &[Value]) -> Result<Value, EvaluationError> {
    let (left, right) = binary(Operator::Modulo, args)?;
    if left.as_float().is_some() && is_zero(right) {
        return Err(EvaluationError::DivisionByZero);
    }
    arithmetic(Operator::Modulo, args, i64::checked_rem, |a, b| a % b)
}

/// Orders two numbers or two strings; `None` for unordered floats.
pub fn compare(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    match (left, right) {
        (Value::Int(left), Value::Int(right)) => Some(Some(left.cmp(right))),
        (Value::Str(left), Value::Str(right)) => Some(Some(left.cmp(right))),
        _ => match (left.as_float(), right.as_float()) {
            (Some(left), Some(right)) => Some(left.partial_cmp(&right)),
            _ => None,
        },
    }
}

fn comparison(
    operator: Operator,
    args: &[Value],
    accept: fn(Ordering) -> bool,
) -> Result<Value, EvaluationError> {
    let (left, right) = binary(operator, args)?;
    let ordering = compare(left, right).ok_or_else(|| type_error(operator, args))?;
    Ok(Value::Bool(ordering.is_some_and(accept)))
}

fn equal(args: &[Value]) -> Result<Value, EvaluationError> {
    let (left, right) = binary(Operator::Equal, args)?;
    let equal = match compare(left, right) {
        Some(ordering) => ordering == Some(Ordering::Equal),
        None => left == right,
    };
    Ok(Value::Bool(equal))
}

fn greater_than(args: &[Value]) -> Result<Value, EvaluationError> {
    comparison(Operator::GreaterThan, args, Ordering::is_gt)
}

fn greater_equal(args: &[Value]) -> Result<Value, EvaluationError> {
    comparison(Operator::GreaterEqual, args, Ordering::is_ge)
}

fn less_than(args: &[Value]) -> Result<Value, EvaluationError> {
    comparison(Operator::LessThan, args, Ordering::is_lt)
}

fn less_equal(args: &[Value]) -> Result<Value, EvaluationError> {
    comparison(Operator::LessEqual, args, Ordering::is_le)
}

fn to_int(args: &[Value]) -> Result<Value, EvaluationError> {
    let invalid = |value: &Value| EvaluationError::InvalidConversion {
        target: "int",
        value: value.to_string().into(),
    };

    match unary(Operator::ToInt, args)? {
        Value::Int(value) => Ok(Value::Int(*value)),
        Value::Bool(value) => Ok(Value::Int(i64::from(*value))),
        value @ Value::Float(float) => {
            let truncated = float.trunc();
            if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Ok(Value::Int(truncated as i64))
            } else {
                Err(invalid(value))
            }
        }
        value @ Value::Str(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid(value)),
        _ => Err(type_error(Operator::ToInt, args)),
    }
}

fn to_float(args: &[Value]) -> Result<Value, EvaluationError> {
    match unary(Operator::ToFloat, args)? {
        Value::Int(value) => Ok(Value::Float(*value as f64)),
        Value::Float(value) => Ok(Value::Float(*value)),
        Value::Bool(value) => Ok(Value::Float(f64::from(u8::from(*value)))),
        value @ Value::Str(text) => text.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            EvaluationError::InvalidConversion {
                target: "float",
                value: value.to_string().into(),
            }
        }),
        _ => Err(type_error(Operator::ToFloat, args)),
    }
}

fn to_bool(args: &[Value]) -> Result<Value, EvaluationError> {
    unary(Operator::ToBool, args)?.truthiness().map(Value::Bool)
}

fn not(args: &[Value]) -> Result<Value, EvaluationError> {
    unary(Operator::Not, args)?
        .truthiness()
        .map(|value| Value::Bool(!value))
}

fn and(args: &[Value]) -> Result<Value, EvaluationError> {
    let (left, right) = binary(Operator::And, args)?;
    Ok(Value::Bool(left.truthiness()? && right.truthiness()?))
}

fn or(args: &[Value]) -> Result<Value, EvaluationError> {
    let (left, right) = binary(Operator::Or, args)?;
    let left = left.truthiness()?;
    let right = right.truthiness()?;
    Ok(Value::Bool(left || right))
}

fn ret(args: &[Value]) -> Result<Value, EvaluationError> {
    let value = unary(Operator::Return, args)?;
    Ok(Value::Return(Box::new(value.clone())))
}
