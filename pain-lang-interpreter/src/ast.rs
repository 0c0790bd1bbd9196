use std::fmt::Display;
use std::rc::Rc;

use num_enum::TryFromPrimitive;

pub use crate::lexer::Literal;
use crate::lexer::{TokenKind, ROTATING_TOKEN_OFFSET};
use crate::object::BuiltinFunction;

/// Primitive operations, in the same order as the operator tokens.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, TryFromPrimitive)]
pub enum Operator {
    Add = 0,
    Subtract,
    Multiply,
    Divide,
    Assign,
    Equal,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    ToInt,
    ToFloat,
    ToBool,
    Not,
    And,
    Or,
    Modulo,
    Return,
}

impl TryFrom<TokenKind> for Operator {
    type Error = TokenKind;

    fn try_from(kind: TokenKind) -> Result<Self, Self::Error> {
        if !kind.is_operator() {
            return Err(kind);
        }
        Operator::try_from_primitive(kind as u8 - ROTATING_TOKEN_OFFSET).map_err(|_| kind)
    }
}

impl Operator {
    fn to_str(self) -> &'static str {
        use Operator::*;
        match self {
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Modulo => "%",
            Assign => "=",
            Equal => "==",
            GreaterThan => ">",
            GreaterEqual => ">=",
            LessThan => "<",
            LessEqual => "<=",
            ToInt => "int",
            ToFloat => "float",
            ToBool => "bool",
            Not => "not",
            And => "and",
            Or => "or",
            Return => "return",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    /// Source line of the first token, absent for hand-built trees.
    pub line: Option<usize>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ExpressionKind {
    Constant(Literal),
    NameRef(Rc<str>),
    Operation {
        left: Option<Box<Expression>>,
        operator: Operator,
        right: Option<Box<Expression>>,
    },
    Block(Block),
    If {
        branches: Vec<(Expression, Block)>,
    },
    While {
        condition: Box<Expression>,
        body: Block,
    },
    For {
        init: Box<Expression>,
        condition: Box<Expression>,
        step: Box<Expression>,
        body: Block,
    },
    FunctionDef {
        parameters: Rc<[Rc<str>]>,
        body: Rc<Block>,
    },
    Invocation {
        function: Rc<str>,
        arguments: Vec<Expression>,
    },
    BuiltinCall {
        builtin: BuiltinFunction,
        arguments: Vec<Expression>,
    },
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Block {
    pub statements: Vec<Expression>,
    pub line: Option<usize>,
}

impl Block {
    pub fn new(statements: Vec<Expression>) -> Self {
        Block {
            statements,
            line: None,
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value.into())
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.into())
    }
}

impl Expression {
    pub fn new(kind: ExpressionKind) -> Self {
        Expression { kind, line: None }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn constant(value: impl Into<Literal>) -> Self {
        Self::new(ExpressionKind::Constant(value.into()))
    }

    pub fn name(name: &str) -> Self {
        Self::new(ExpressionKind::NameRef(name.into()))
    }

    pub fn binary(left: Expression, operator: Operator, right: Expression) -> Self {
        Self::new(ExpressionKind::Operation {
            left: Some(Box::new(left)),
            operator,
            right: Some(Box::new(right)),
        })
    }

    pub fn unary(operator: Operator, right: Expression) -> Self {
        Self::new(ExpressionKind::Operation {
            left: None,
            operator,
            right: Some(Box::new(right)),
        })
    }

    pub fn assign(name: &str, value: Expression) -> Self {
        Self::binary(Self::name(name), Operator::Assign, value)
    }

    pub fn block(statements: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::Block(Block::new(statements)))
    }

    pub fn if_chain(branches: Vec<(Expression, Block)>) -> Self {
        Self::new(ExpressionKind::If { branches })
    }

    pub fn while_loop(condition: Expression, body: Block) -> Self {
        Self::new(ExpressionKind::While {
            condition: Box::new(condition),
            body,
        })
    }

    pub fn for_loop(init: Expression, condition: Expression, step: Expression, body: Block) -> Self {
        Self::new(ExpressionKind::For {
            init: Box::new(init),
            condition: Box::new(condition),
            step: Box::new(step),
            body,
        })
    }

    pub fn function(parameters: &[&str], body: Block) -> Self {
        Self::new(ExpressionKind::FunctionDef {
            parameters: parameters.iter().map(|name| Rc::from(*name)).collect(),
            body: Rc::new(body),
        })
    }

    pub fn invocation(function: &str, arguments: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::Invocation {
            function: function.into(),
            arguments,
        })
    }

    pub fn builtin_call(builtin: BuiltinFunction, arguments: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::BuiltinCall { builtin, arguments })
    }
}

fn join<T: Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<String>>()
        .join(separator)
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Int(val) => write!(f, "{}", val),
            Literal::Float(val) => write!(f, "{:?}", val),
            Literal::Str(val) => write!(f, "\"{}\"", val),
            Literal::Bool(val) => write!(f, "{}", val),
        }
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", join(&self.statements, " | "))
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ExpressionKind::*;
        match &self.kind {
            Constant(literal) => write!(f, "{}", literal),
            NameRef(name) => write!(f, "{}", name),
            Operation {
                left,
                operator,
                right,
            } => {
                write!(f, "(")?;
                if let Some(left) = left {
                    write!(f, "{} ", left)?;
                }
                write!(f, "{}", operator.to_str())?;
                if let Some(right) = right {
                    write!(f, " {}", right)?;
                }
                write!(f, ")")
            }
            Block(block) => write!(f, "{}", block),
            If { branches } => {
                for (i, (condition, block)) in branches.iter().enumerate() {
                    if i > 0 {
                        write!(f, " el")?;
                    }
                    write!(f, "if {} {}", condition, block)?;
                }
                Ok(())
            }
            While { condition, body } => write!(f, "while {} {}", condition, body),
            For {
                init,
                condition,
                step,
                body,
            } => write!(f, "for [{} | {} | {}] {}", init, condition, step, body),
            FunctionDef { parameters, body } => {
                write!(f, "fun")?;
                for parameter in parameters.iter() {
                    write!(f, " {}", parameter)?;
                }
                write!(f, " {}", body)
            }
            Invocation {
                function,
                arguments,
            } => write!(f, "{}({})", function, join(arguments, ", ")),
            BuiltinCall { builtin, arguments } => {
                write!(f, "<builtin {}>({})", builtin.name, join(arguments, ", "))
            }
        }
    }
}
