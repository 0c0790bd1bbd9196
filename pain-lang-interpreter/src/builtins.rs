use std::cmp::Ordering;
use std::rc::Rc;

use crate::ast::{Block, Expression};
use crate::environment::Scope;
use crate::object::{BuiltinFunction, Function, Value};
use crate::operators::compare;

fn unexpected_number_of_arguments_error(expected: usize, got: usize) -> String {
    format!(
        "unexpected number of arguments. Expected {} got {}",
        expected, got
    )
}

/// Wraps a host function as a script function whose body hands its
/// parameters to `func` and returns the result.
pub fn native_function(
    name: &str,
    parameters: &[&str],
    func: impl Fn(&[Value]) -> Result<Value, String> + 'static,
    scope: &Scope,
) -> Value {
    let builtin = BuiltinFunction::new(name, func);
    let arguments = parameters
        .iter()
        .map(|parameter| Expression::name(parameter))
        .collect();
    let body = Block::new(vec![Expression::builtin_call(builtin, arguments)]);

    Value::Function(Function {
        parameters: parameters.iter().map(|parameter| Rc::from(*parameter)).collect(),
        body: Rc::new(body),
        scope: scope.clone(),
        line: None,
    })
}

/// Binds `print`, `min` and `max` in `scope`.
pub fn install(scope: &Scope) {
    scope.define("print".into(), native_function("print", &["x"], builtin_print, scope));
    scope.define("min".into(), native_function("min", &["x", "y"], builtin_min, scope));
    scope.define("max".into(), native_function("max", &["x", "y"], builtin_max, scope));
}

fn builtin_print(args: &[Value]) -> Result<Value, String> {
    let [value] = args else {
        return Err(unexpected_number_of_arguments_error(1, args.len()));
    };
    println!("{}", value);
    Ok(Value::Void)
}

fn pick(args: &[Value], keep_left: fn(Ordering) -> bool) -> Result<Value, String> {
    let [left, right] = args else {
        return Err(unexpected_number_of_arguments_error(2, args.len()));
    };
    match compare(left, right) {
        Some(Some(ordering)) if keep_left(ordering) => Ok(left.clone()),
        Some(_) => Ok(right.clone()),
        None => Err(format!(
            "unexpected argument types. Cannot compare {} and {}",
            left.type_name(),
            right.type_name()
        )),
    }
}

fn builtin_min(args: &[Value]) -> Result<Value, String> {
    pick(args, Ordering::is_le)
}

fn builtin_max(args: &[Value]) -> Result<Value, String> {
    pick(args, Ordering::is_ge)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::evaluator::eval_program;
    use crate::cipher::encode;
    use crate::object::EvaluationError;
    use crate::parser::parse_program;

    fn run(template: &str) -> Result<Value, EvaluationError> {
        let scope = Scope::new();
        install(&scope);
        let program = parse_program(&encode(template)).unwrap();
        eval_program(&program, &scope).map_err(|traceback| traceback.error().clone())
    }

    #[test]
    fn test_min_max() {
        assert_eq!(run("max )4, 3("), Ok(Value::Int(4)));
        assert_eq!(run("max )3, 4("), Ok(Value::Int(4)));
        assert_eq!(run("min )3, 4("), Ok(Value::Int(3)));
        assert_eq!(run("min )2.5, 4("), Ok(Value::Float(2.5)));
        assert_eq!(run("max )\"a\", \"b\"("), Ok(Value::string("b")));
        assert_eq!(run("x {=} max )1, min )7, 5(( | x"), Ok(Value::Int(5)));
    }

    #[test]
    fn test_wrapper_arity_is_checked() {
        assert_eq!(
            run("max )1("),
            Err(EvaluationError::ArityMismatch {
                function: "max".into(),
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_native_errors() {
        assert_eq!(
            run("max )1, \"a\"("),
            Err(EvaluationError::Builtin {
                name: "max".into(),
                message: "unexpected argument types. Cannot compare int and str".into(),
            })
        );
    }

    #[test]
    fn test_native_function_sees_arguments() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let recorder = seen.clone();
        let scope = Scope::new();
        let function = native_function(
            "record",
            &["a", "b"],
            move |args| {
                recorder.borrow_mut().extend_from_slice(args);
                Ok(Value::Int(args.len() as i64))
            },
            &scope,
        );
        scope.define("record".into(), function);

        let program = parse_program("record )1, \"two\"(").unwrap();
        assert_eq!(eval_program(&program, &scope), Ok(Value::Int(2)));
        assert_eq!(*seen.borrow(), vec![Value::Int(1), Value::string("two")]);
    }
}
