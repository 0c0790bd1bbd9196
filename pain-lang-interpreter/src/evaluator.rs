use std::rc::Rc;

use log::{debug, trace};

use crate::ast::{Block, Expression, ExpressionKind, Operator};
use crate::environment::Scope;
use crate::object::{BuiltinFunction, EvaluationError, Function, QuickReturn, Value};
use crate::operators::primitive;
use crate::traceback::{Traceback, Traced};

pub type EvalResult = Result<Value, Traceback>;

type Unwinding = Result<Value, QuickReturn>;

impl Expression {
    /// Evaluates one node. A `return` that escapes it comes back as
    /// `Value::Return`.
    pub fn evaluate(&self, scope: &Scope) -> EvalResult {
        match eval_expression(self, scope) {
            Ok(value) => Ok(value),
            Err(QuickReturn::Return(value)) => Ok(Value::Return(Box::new(value))),
            Err(QuickReturn::Error(traceback)) => Err(traceback),
        }
    }
}

/// Runs top-level statements in order. Stops at the first failure or at a
/// top-level `return`, otherwise yields the value of the last statement.
pub fn eval_program(statements: &[Expression], scope: &Scope) -> EvalResult {
    let mut output = Value::Void;
    for statement in statements {
        trace!("evaluating {}", statement);
        match eval_expression(statement, scope) {
            Ok(value) => output = value,
            Err(QuickReturn::Return(value)) => return Ok(value),
            Err(QuickReturn::Error(traceback)) => return Err(traceback),
        }
    }
    Ok(output)
}

fn eval_expression(expression: &Expression, scope: &Scope) -> Unwinding {
    let line = expression.line;
    match &expression.kind {
        ExpressionKind::Constant(literal) => Ok(Value::from(literal)),
        ExpressionKind::NameRef(name) => scope.get(name).ok_or_else(|| {
            Traceback::new(EvaluationError::UndefinedName(name.clone()), line).into()
        }),
        ExpressionKind::Operation {
            left,
            operator,
            right,
        } => eval_operation(left.as_deref(), *operator, right.as_deref(), scope, line),
        ExpressionKind::Block(block) => eval_block(block, scope).traced(line),
        ExpressionKind::If { branches } => eval_conditional(branches, scope, line),
        ExpressionKind::While { condition, body } => eval_while_loop(condition, body, scope, line),
        ExpressionKind::For {
            init,
            condition,
            step,
            body,
        } => eval_for_loop(init, condition, step, body, scope, line),
        ExpressionKind::FunctionDef { parameters, body } => Ok(Value::Function(Function {
            parameters: parameters.clone(),
            body: body.clone(),
            scope: scope.clone(),
            line,
        })),
        ExpressionKind::Invocation {
            function,
            arguments,
        } => eval_invocation(function, arguments, scope, line),
        ExpressionKind::BuiltinCall { builtin, arguments } => {
            eval_builtin_call(builtin, arguments, scope, line)
        }
    }
}

fn eval_block(block: &Block, scope: &Scope) -> Unwinding {
    for statement in &block.statements {
        eval_expression(statement, scope).traced(block.line)?;
    }
    Ok(Value::Void)
}

fn missing_operand(operator: Operator, side: &'static str, line: Option<usize>) -> Traceback {
    Traceback::new(EvaluationError::MissingOperand { operator, side }, line)
}

fn eval_operation(
    left: Option<&Expression>,
    operator: Operator,
    right: Option<&Expression>,
    scope: &Scope,
    line: Option<usize>,
) -> Unwinding {
    let Some(primitive) = primitive(operator) else {
        return eval_assignment(left, right, scope, line);
    };

    let mut operands = Vec::with_capacity(2);
    if primitive.needs_left {
        operands.push(left.ok_or_else(|| missing_operand(operator, "left", line))?);
    }
    if primitive.needs_right {
        operands.push(right.ok_or_else(|| missing_operand(operator, "right", line))?);
    }

    let args = eval_expressions(operands, scope, line)?;
    let value = (primitive.apply)(&args).map_err(|error| Traceback::new(error, line))?;
    match value {
        Value::Return(ref returned) => Err(QuickReturn::Return((**returned).clone())),
        value => Ok(value),
    }
}

fn eval_assignment(
    target: Option<&Expression>,
    value: Option<&Expression>,
    scope: &Scope,
    line: Option<usize>,
) -> Unwinding {
    let target = target.ok_or_else(|| missing_operand(Operator::Assign, "left", line))?;
    let ExpressionKind::NameRef(name) = &target.kind else {
        return Err(Traceback::new(EvaluationError::InvalidAssignmentTarget, line).into());
    };
    let value = value.ok_or_else(|| missing_operand(Operator::Assign, "right", line))?;

    let value = eval_expression(value, scope).traced(line)?;
    scope.assign(name.clone(), value);
    Ok(Value::Void)
}

fn eval_condition(
    condition: &Expression,
    scope: &Scope,
    line: Option<usize>,
) -> Result<bool, QuickReturn> {
    let value = eval_expression(condition, scope).traced(line)?;
    let truthy = value
        .truthiness()
        .map_err(|error| Traceback::new(error, line))?;
    Ok(truthy)
}

fn eval_conditional(
    branches: &[(Expression, Block)],
    scope: &Scope,
    line: Option<usize>,
) -> Unwinding {
    for (condition, block) in branches {
        if eval_condition(condition, scope, line)? {
            return eval_block(block, &Scope::new_enclosed(scope)).traced(line);
        }
    }
    Ok(Value::Void)
}

fn eval_while_loop(
    condition: &Expression,
    body: &Block,
    scope: &Scope,
    line: Option<usize>,
) -> Unwinding {
    while eval_condition(condition, scope, line)? {
        eval_block(body, &Scope::new_enclosed(scope)).traced(line)?;
    }
    Ok(Value::Void)
}

/// The header and the body share one scope, created for the loop.
fn eval_for_loop(
    init: &Expression,
    condition: &Expression,
    step: &Expression,
    body: &Block,
    scope: &Scope,
    line: Option<usize>,
) -> Unwinding {
    let loop_scope = Scope::new_enclosed(scope);

    eval_expression(init, &loop_scope).traced(line)?;
    while eval_condition(condition, &loop_scope, line)? {
        eval_block(body, &loop_scope).traced(line)?;
        eval_expression(step, &loop_scope).traced(line)?;
    }
    Ok(Value::Void)
}

fn eval_expressions<'e>(
    expressions: impl IntoIterator<Item = &'e Expression>,
    scope: &Scope,
    line: Option<usize>,
) -> Result<Vec<Value>, QuickReturn> {
    expressions
        .into_iter()
        .map(|expression| eval_expression(expression, scope).traced(line))
        .collect()
}

fn eval_invocation(
    name: &Rc<str>,
    arguments: &[Expression],
    scope: &Scope,
    line: Option<usize>,
) -> Unwinding {
    let function = match scope.get(name) {
        Some(Value::Function(ref function)) => function.clone(),
        Some(_) => {
            return Err(Traceback::new(EvaluationError::NotCallable(name.clone()), line).into())
        }
        None => {
            return Err(
                Traceback::new(EvaluationError::UndefinedFunction(name.clone()), line).into(),
            )
        }
    };

    let arguments = eval_expressions(arguments, scope, line)?;
    if arguments.len() != function.parameters.len() {
        return Err(Traceback::new(
            EvaluationError::ArityMismatch {
                function: name.clone(),
                expected: function.parameters.len(),
                actual: arguments.len(),
            },
            line,
        )
        .into());
    }

    debug!("calling {} with {} argument(s)", name, arguments.len());
    apply_function(&function, arguments)
        .traced(line)
        .map_err(QuickReturn::from)
}

/// Runs `function` on already evaluated arguments. The result is the value
/// of the first `return` reached in its body, or `Void`.
pub fn apply_function(function: &Function, arguments: Vec<Value>) -> EvalResult {
    let call_scope = Scope::new_enclosed(&function.scope);
    for (parameter, argument) in function.parameters.iter().zip(arguments) {
        call_scope.define(parameter.clone(), argument);
    }

    match eval_block(&function.body, &call_scope) {
        Ok(_) => Ok(Value::Void),
        Err(QuickReturn::Return(value)) => Ok(value),
        Err(QuickReturn::Error(traceback)) => Err(traceback.with_origin(function.line)),
    }
}

fn eval_builtin_call(
    builtin: &BuiltinFunction,
    arguments: &[Expression],
    scope: &Scope,
    line: Option<usize>,
) -> Unwinding {
    let arguments = eval_expressions(arguments, scope, line)?;
    debug!("calling builtin {}", builtin.name);

    let value = builtin.call(&arguments).map_err(|message| {
        Traceback::new(
            EvaluationError::Builtin {
                name: builtin.name.clone(),
                message: message.into(),
            },
            line,
        )
    })?;
    Err(QuickReturn::Return(value))
}
