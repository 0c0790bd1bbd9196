use std::fmt::Display;
use std::rc::Rc;

use gc::{Finalize, Trace};
use thiserror::Error;

use crate::ast::{Block, Literal, Operator};
use crate::environment::Scope;
use crate::traceback::Traceback;

#[derive(Debug, Clone, Trace, Finalize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Rc<str>),
    Function(Function),
    Void,
    /// A `return` that escaped the expression it was evaluated from.
    Return(Box<Value>),
}

impl Value {
    pub fn string(value: &str) -> Value {
        Value::Str(value.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Function(_) => "function",
            Value::Void => "void",
            Value::Return(_) => "return",
        }
    }

    /// Coerces the value to a boolean for conditions and boolean operators.
    pub fn truthiness(&self) -> Result<bool, EvaluationError> {
        match self {
            Value::Int(value) => Ok(*value != 0),
            Value::Float(value) => Ok(*value != 0.0),
            Value::Bool(value) => Ok(*value),
            Value::Str(value) => Ok(!value.is_empty()),
            _ => Err(EvaluationError::NonBooleanCondition(self.type_name())),
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Int(value) => Value::Int(*value),
            Literal::Float(value) => Value::Float(*value),
            Literal::Str(value) => Value::Str(value.clone()),
            Literal::Bool(value) => Value::Bool(*value),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(left), Value::Int(right)) => left == right,
            (Value::Float(left), Value::Float(right)) => left == right,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Str(left), Value::Str(right)) => left == right,
            (Value::Function(left), Value::Function(right)) => left == right,
            (Value::Void, Value::Void) => true,
            (Value::Return(left), Value::Return(right)) => left == right,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{:?}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Str(value) => write!(f, "{}", value),
            Value::Function(function) => write!(f, "<fun {}>", function.parameters.join(" ")),
            Value::Void => write!(f, "void"),
            Value::Return(value) => write!(f, "{}", value),
        }
    }
}

/// A script function closed over the scope it was defined in.
#[derive(Clone, Trace, Finalize)]
pub struct Function {
    #[unsafe_ignore_trace]
    pub parameters: Rc<[Rc<str>]>,
    #[unsafe_ignore_trace]
    pub body: Rc<Block>,
    pub scope: Scope,
    pub line: Option<usize>,
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && self.scope.ptr_eq(&other.scope)
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("line", &self.line)
            .finish()
    }
}

/// Host function callable from scripts. Implementations must not hold on to
/// script scopes, since the collector does not see inside them.
pub type NativeFunction = dyn Fn(&[Value]) -> Result<Value, String>;

#[derive(Clone)]
pub struct BuiltinFunction {
    pub name: Rc<str>,
    pub func: Rc<NativeFunction>,
}

impl BuiltinFunction {
    pub fn new(name: &str, func: impl Fn(&[Value]) -> Result<Value, String> + 'static) -> Self {
        BuiltinFunction {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    pub fn call(&self, arguments: &[Value]) -> Result<Value, String> {
        (self.func)(arguments)
    }
}

impl PartialEq for BuiltinFunction {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.func) as *const () == Rc::as_ptr(&other.func) as *const ()
    }
}

impl std::fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinFunction")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum EvaluationError {
    #[error("Name '{0}' is not defined.")]
    UndefinedName(Rc<str>),
    #[error("Function '{0}' is not defined.")]
    UndefinedFunction(Rc<str>),
    #[error("Symbol '{0}' is not a function.")]
    NotCallable(Rc<str>),
    #[error("Function '{function}' requires exactly {expected} parameters, got {actual}.")]
    ArityMismatch {
        function: Rc<str>,
        expected: usize,
        actual: usize,
    },
    #[error("{operator:?} operator requires exactly {expected} operands, got {actual}.")]
    OperatorArityViolation {
        operator: Operator,
        expected: usize,
        actual: usize,
    },
    #[error("Missing {side} operand for {operator:?}.")]
    MissingOperand {
        operator: Operator,
        side: &'static str,
    },
    #[error("Unsupported operand type(s) for {operator:?}: {operands}")]
    TypeError { operator: Operator, operands: Rc<str> },
    #[error("division by zero")]
    DivisionByZero,
    #[error("{0:?} overflowed")]
    ArithmeticOverflow(Operator),
    #[error("Value of type '{0}' cannot be used as a boolean.")]
    NonBooleanCondition(&'static str),
    #[error("Cannot convert {value:?} to {target}.")]
    InvalidConversion { target: &'static str, value: Rc<str> },
    #[error("ASSIGN operator requires assignable left operand.")]
    InvalidAssignmentTarget,
    #[error("Builtin function '{name}' failed: {message}")]
    Builtin { name: Rc<str>, message: Rc<str> },
}

/// Unwinds evaluation through `?`: a `return` travels up to the nearest
/// function call, a failure all the way out.
#[derive(Debug, PartialEq)]
pub enum QuickReturn {
    Return(Value),
    Error(Traceback),
}

impl From<Traceback> for QuickReturn {
    fn from(traceback: Traceback) -> Self {
        QuickReturn::Error(traceback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert_eq!(Value::Int(0).truthiness(), Ok(false));
        assert_eq!(Value::Int(-3).truthiness(), Ok(true));
        assert_eq!(Value::Float(0.0).truthiness(), Ok(false));
        assert_eq!(Value::string("").truthiness(), Ok(false));
        assert_eq!(Value::string("a").truthiness(), Ok(true));
        assert_eq!(
            Value::Void.truthiness(),
            Err(EvaluationError::NonBooleanCondition("void"))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(5).to_string(), "5");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::string("hi").to_string(), "hi");
        assert_eq!(Value::Return(Box::new(Value::Bool(true))).to_string(), "true");
    }

    #[test]
    fn test_functions_compare_by_identity() {
        let scope = Scope::new();
        let body = Rc::new(Block::default());
        let function = Function {
            parameters: Rc::new([]),
            body: body.clone(),
            scope: scope.clone(),
            line: None,
        };
        let same = function.clone();
        let other = Function {
            parameters: Rc::new([]),
            body: Rc::new(Block::default()),
            scope,
            line: None,
        };

        assert_eq!(Value::Function(function.clone()), Value::Function(same));
        assert_ne!(Value::Function(function), Value::Function(other));
    }
}
