use crate::ast::{Expression, ExpressionKind, Operator};
use crate::lexer::TokenKind;
use crate::parser::{Expected, ParseError, Parser};

type Level = fn(&mut Parser) -> Result<Expression, ParseError>;

fn operation(left: Expression, operator: Operator, right: Expression) -> Expression {
    let line = left.line;
    Expression {
        line,
        ..Expression::binary(left, operator, right)
    }
}

/// One right-recursive binary level: `operand (operator this_level)?`.
fn parse_binary_level(
    parser: &mut Parser,
    operators: &[Operator],
    operand: Level,
    this_level: Level,
) -> Result<Expression, ParseError> {
    let left = operand(parser)?;

    match Operator::try_from(parser.peek()?.kind) {
        Ok(operator) if operators.contains(&operator) => {
            parser.next()?;
            let right = this_level(parser)?;
            Ok(operation(left, operator, right))
        }
        _ => Ok(left),
    }
}

pub fn parse_assignment(parser: &mut Parser) -> Result<Expression, ParseError> {
    let left = parse_or(parser)?;

    let token = parser.peek()?;
    if token.kind != TokenKind::Assign {
        return Ok(left);
    }
    if !matches!(left.kind, ExpressionKind::NameRef(_)) {
        return Err(ParseError::InvalidAssignmentTarget { line: token.line });
    }
    parser.next()?;

    let right = parse_assignment(parser)?;
    Ok(operation(left, Operator::Assign, right))
}

fn parse_or(parser: &mut Parser) -> Result<Expression, ParseError> {
    parse_binary_level(parser, &[Operator::Or], parse_and, parse_or)
}

fn parse_and(parser: &mut Parser) -> Result<Expression, ParseError> {
    parse_binary_level(parser, &[Operator::And], parse_comparison, parse_and)
}

fn parse_comparison(parser: &mut Parser) -> Result<Expression, ParseError> {
    parse_binary_level(
        parser,
        &[
            Operator::Equal,
            Operator::GreaterThan,
            Operator::GreaterEqual,
            Operator::LessThan,
            Operator::LessEqual,
        ],
        parse_term,
        parse_comparison,
    )
}

/// An operator at the start of a term applies to the whole following
/// statement.
fn parse_term(parser: &mut Parser) -> Result<Expression, ParseError> {
    if !parser.peek()?.is_operator() {
        return parse_invocation(parser);
    }

    let token = parser.next()?;
    let operator = Operator::try_from(token.kind)
        .map_err(|_| ParseError::unexpected_other(Expected::Expression, token.clone()))?;
    let right = parser.parse_statement()?;

    Ok(Expression {
        kind: ExpressionKind::Operation {
            left: None,
            operator,
            right: right.map(Box::new),
        },
        line: Some(token.line),
    })
}

fn parse_invocation(parser: &mut Parser) -> Result<Expression, ParseError> {
    let callee = parse_additive(parser)?;

    let token = parser.peek()?;
    if token.kind != TokenKind::OpenParen {
        return Ok(callee);
    }
    let ExpressionKind::NameRef(function) = &callee.kind else {
        return Err(ParseError::InvalidCallTarget { line: token.line });
    };
    let function = function.clone();
    parser.next()?;

    let arguments = parse_arguments(parser)?;
    Ok(Expression {
        kind: ExpressionKind::Invocation {
            function,
            arguments,
        },
        line: callee.line,
    })
}

fn parse_arguments(parser: &mut Parser) -> Result<Vec<Expression>, ParseError> {
    let mut arguments = Vec::new();
    if parser.peek()?.kind == TokenKind::CloseParen {
        parser.next()?;
        return Ok(arguments);
    }

    loop {
        arguments.push(parser.parse_required_statement()?);

        let token = parser.next()?;
        match token.kind {
            TokenKind::Comma => {}
            TokenKind::CloseParen => return Ok(arguments),
            _ => return Err(ParseError::unexpected_token(TokenKind::CloseParen, token)),
        }
    }
}

fn parse_additive(parser: &mut Parser) -> Result<Expression, ParseError> {
    parse_binary_level(
        parser,
        &[Operator::Add, Operator::Subtract],
        parse_multiplicative,
        parse_additive,
    )
}

fn parse_multiplicative(parser: &mut Parser) -> Result<Expression, ParseError> {
    parse_binary_level(
        parser,
        &[Operator::Multiply, Operator::Divide, Operator::Modulo],
        parse_primary,
        parse_multiplicative,
    )
}

fn parse_primary(parser: &mut Parser) -> Result<Expression, ParseError> {
    match parser.peek()?.kind {
        TokenKind::OpenParen => return parse_grouped_expression(parser),
        TokenKind::FunctionDecl => return parser.parse_function_declaration(),
        _ => {}
    }

    let token = parser.next()?;
    let kind = match token.kind {
        TokenKind::Name => token.name().map(ExpressionKind::NameRef),
        TokenKind::Int | TokenKind::Float | TokenKind::String => {
            token.payload.clone().map(ExpressionKind::Constant)
        }
        _ => None,
    };

    match kind {
        Some(kind) => Ok(Expression::new(kind).at_line(token.line)),
        None => Err(ParseError::unexpected_other(Expected::Expression, token)),
    }
}

fn parse_grouped_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    parser.expect_token(TokenKind::OpenParen)?;
    let expression = parse_comparison(parser)?;
    parser.expect_token(TokenKind::CloseParen)?;
    Ok(expression)
}
