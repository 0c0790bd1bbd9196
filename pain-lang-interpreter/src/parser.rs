use std::fmt::Display;
use std::rc::Rc;

use log::trace;
use thiserror::Error;

use crate::ast::{Block, Expression, ExpressionKind};
use crate::expression_parsing::parse_assignment;
use crate::lexer::{LexError, Lexer, Token, TokenKind};

#[derive(Debug, PartialEq, Clone, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Expected {expected} on line {line}, got {got:?}")]
    UnexpectedToken {
        expected: Expected,
        got: TokenKind,
        line: usize,
    },
    #[error("Unexpected end of input, expected {expected}")]
    PrematureEndOfInput { expected: Expected },
    #[error("For loop header on line {line} needs 3 statements, got {found}")]
    ForHeaderArity { found: usize, line: usize },
    #[error("Left side of assignment on line {line} is not a name")]
    InvalidAssignmentTarget { line: usize },
    #[error("Only names can be invoked (line {line})")]
    InvalidCallTarget { line: usize },
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expected {
    Token(TokenKind),
    Identifier,
    Expression,
    Statement,
}

impl Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "{:?}", kind),
            Expected::Identifier => write!(f, "an identifier"),
            Expected::Expression => write!(f, "an expression"),
            Expected::Statement => write!(f, "a statement"),
        }
    }
}

impl ParseError {
    pub fn unexpected_token(expected: TokenKind, got: Token) -> ParseError {
        Self::unexpected_other(Expected::Token(expected), got)
    }

    pub fn unexpected_other(expected: Expected, got: Token) -> ParseError {
        match got.kind {
            TokenKind::EndOfInput => ParseError::PrematureEndOfInput { expected },
            kind => ParseError::UnexpectedToken {
                expected,
                got: kind,
                line: got.line,
            },
        }
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self { lexer }
    }

    pub(crate) fn peek(&mut self) -> Result<Token, ParseError> {
        Ok(self.lexer.peek_token()?)
    }

    pub(crate) fn next(&mut self) -> Result<Token, ParseError> {
        Ok(self.lexer.next_token()?)
    }

    pub(crate) fn expect_token(&mut self, token_kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.next()?;
        if token.kind == token_kind {
            Ok(token)
        } else {
            Err(ParseError::unexpected_token(token_kind, token))
        }
    }

    fn skip_line_ends(&mut self) -> Result<(), ParseError> {
        while self.peek()?.kind == TokenKind::EndOfLine {
            self.next()?;
        }
        Ok(())
    }

    /// Parses every statement up to the end of the input.
    pub fn parse_program(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut statements = Vec::new();
        while let Some(statement) = self.parse_statement()? {
            statements.push(statement);
        }

        let token = self.next()?;
        match token.kind {
            TokenKind::EndOfInput => Ok(statements),
            _ => Err(ParseError::unexpected_other(Expected::Statement, token)),
        }
    }

    /// Parses one statement. Returns `None` when the next token closes the
    /// enclosing construct or ends the input.
    pub fn parse_statement(&mut self) -> Result<Option<Expression>, ParseError> {
        self.skip_line_ends()?;

        let token = self.peek()?;
        let statement = match token.kind {
            TokenKind::EndOfInput | TokenKind::CloseBlock | TokenKind::CloseParen => {
                return Ok(None)
            }
            TokenKind::If => self.parse_conditional()?,
            TokenKind::While => self.parse_while_loop()?,
            TokenKind::For => self.parse_for_loop()?,
            TokenKind::FunctionDecl => self.parse_function_declaration()?,
            _ => parse_assignment(self)?,
        };

        trace!("parsed statement on line {}: {}", token.line, statement);
        Ok(Some(statement))
    }

    pub(crate) fn parse_required_statement(&mut self) -> Result<Expression, ParseError> {
        match self.parse_statement()? {
            Some(statement) => Ok(statement),
            None => {
                let token = self.next()?;
                Err(ParseError::unexpected_other(Expected::Expression, token))
            }
        }
    }

    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect_token(TokenKind::OpenBlock)?;

        let mut statements = Vec::new();
        while let Some(statement) = self.parse_statement()? {
            statements.push(statement);
        }
        self.expect_token(TokenKind::CloseBlock)?;

        Ok(Block {
            statements,
            line: Some(open.line),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expression, ParseError> {
        let keyword = self.expect_token(TokenKind::If)?;

        let condition = self.parse_required_statement()?;
        let mut branches = vec![(condition, self.parse_block()?)];

        loop {
            self.skip_line_ends()?;
            let token = self.peek()?;
            match token.kind {
                TokenKind::Elif => {
                    self.next()?;
                    let condition = self.parse_required_statement()?;
                    branches.push((condition, self.parse_block()?));
                }
                TokenKind::Else => {
                    self.next()?;
                    let condition = Expression::constant(true).at_line(token.line);
                    branches.push((condition, self.parse_block()?));
                    break;
                }
                _ => break,
            }
        }

        Ok(Expression::if_chain(branches).at_line(keyword.line))
    }

    fn parse_while_loop(&mut self) -> Result<Expression, ParseError> {
        let keyword = self.expect_token(TokenKind::While)?;
        let condition = self.parse_required_statement()?;
        let body = self.parse_block()?;

        Ok(Expression::while_loop(condition, body).at_line(keyword.line))
    }

    fn parse_for_loop(&mut self) -> Result<Expression, ParseError> {
        let keyword = self.expect_token(TokenKind::For)?;
        self.expect_token(TokenKind::OpenBlock)?;

        let mut header = Vec::new();
        while let Some(statement) = self.parse_statement()? {
            header.push(statement);
        }
        self.expect_token(TokenKind::CloseBlock)?;

        let [init, condition, step]: [Expression; 3] =
            header
                .try_into()
                .map_err(|header: Vec<Expression>| ParseError::ForHeaderArity {
                    found: header.len(),
                    line: keyword.line,
                })?;
        let body = self.parse_block()?;

        Ok(Expression::for_loop(init, condition, step, body).at_line(keyword.line))
    }

    pub(crate) fn parse_function_declaration(&mut self) -> Result<Expression, ParseError> {
        let keyword = self.expect_token(TokenKind::FunctionDecl)?;

        let mut parameters: Vec<Rc<str>> = Vec::new();
        while self.peek()?.kind != TokenKind::OpenBlock {
            let token = self.next()?;
            let name = token
                .name()
                .ok_or_else(|| ParseError::unexpected_other(Expected::Identifier, token))?;
            parameters.push(name);
        }
        let body = self.parse_block()?;

        Ok(Expression::new(ExpressionKind::FunctionDef {
            parameters: parameters.into(),
            body: Rc::new(body),
        })
        .at_line(keyword.line))
    }
}

/// Lexes and parses a whole script.
pub fn parse_program(input: &str) -> Result<Vec<Expression>, ParseError> {
    Parser::new(Lexer::new(input)).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::encode;

    fn test_parsing(tests: Vec<(&str, &str)>) {
        for (input, expected) in tests {
            let program = parse_program(input).unwrap();
            let rendered = program
                .iter()
                .map(|statement| statement.to_string())
                .collect::<Vec<_>>()
                .join("\n");

            assert_eq!(rendered, expected, "input: {}", input);
        }
    }

    #[test]
    fn test_ciphered_expressions() {
        test_parsing(vec![
            ("5 A 6", "(5 + 6)"),
            ("5 A 6 B 3", "(5 + (6 + 3))"),
            ("3 C )5 B 6(", "(3 * (5 + 6))"),
            (")5 A 6( D 3", "((5 + 6) * 3)"),
            ("5 A 6 D 3", "(5 + (6 * 3))"),
            ("test E 4", "(test = 4)"),
            ("4 H 4", "(4 >= 4)"),
            ("9 Q 4", "(9 % 4)"),
            ("1 P 0", "(1 or 0)"),
            ("IF 4 H 4 [test F 10]", "if (4 >= 4) [(test = 10)]"),
            ("FUN a [a A 10]", "fun a [(a + 10)]"),
        ]);
    }

    #[test]
    fn test_precedence() {
        let tests = vec![
            (encode("a {*} b {+} c"), "((a * b) + c)"),
            (encode("a {+} b {*} c {-} d"), "(a + ((b * c) - d))"),
            (encode("a {-} b {-} c"), "(a - (b - c))"),
            (encode("a {<} b {and} c {or} d"), "(((a < b) and c) or d)"),
            (encode("x {=} y {=} 2"), "(x = (y = 2))"),
            (encode("x {=} a {==} b"), "(x = (a == b))"),
            (encode("{return} x {+} 1"), "(return (x + 1))"),
            (encode("{not} a {and} b"), "(not (a and b))"),
            (encode("x {=} {int} \"5\""), "(x = (int \"5\"))"),
            (encode("a {==} 1.5"), "(a == 1.5)"),
        ];
        test_parsing(
            tests
                .iter()
                .map(|(input, expected)| (input.as_str(), *expected))
                .collect(),
        );
    }

    #[test]
    fn test_invocations() {
        let tests = vec![
            (encode("f )1, a {+} 2("), "f(1, (a + 2))"),
            (encode("f )("), "f()"),
            (encode("x {=} max )1, 2("), "(x = max(1, 2))"),
            (
                encode(")fib )n {-} 1(( {+} )fib )n {-} 2(("),
                "(fib((n - 1)) + fib((n - 2)))",
            ),
            (encode("f {=} FUN a [{return} a]"), "(f = fun a [(return a)])"),
        ];
        test_parsing(
            tests
                .iter()
                .map(|(input, expected)| (input.as_str(), *expected))
                .collect(),
        );
    }

    #[test]
    fn test_control_flow() {
        let tests = vec![
            (
                encode("IF a [b] ELIF c [d]\nELSE [e]"),
                "if a [b] elif c [d] elif true [e]",
            ),
            (encode("WHILE a {<} 3 [a {=} a {+} 1]"), "while (a < 3) [(a = (a + 1))]"),
            (
                encode("FOR [i {=} 0 | i {<} 5 | i {=} i {+} 1] [x]"),
                "for [(i = 0) | (i < 5) | (i = (i + 1))] [x]",
            ),
            (encode("FUN [1]"), "fun [1]"),
            (encode("a | b\n\nc"), "a\nb\nc"),
        ];
        test_parsing(
            tests
                .iter()
                .map(|(input, expected)| (input.as_str(), *expected))
                .collect(),
        );
    }

    #[test]
    fn test_statement_lines() {
        let program = parse_program(&encode("a {=} 1\n\nb {=} 2")).unwrap();

        assert_eq!(program[0].line, Some(1));
        assert_eq!(program[1].line, Some(3));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_program(&encode("FOR [i {=} 0 | i {<} 5] [x]")),
            Err(ParseError::ForHeaderArity { found: 2, line: 1 })
        );
        assert_eq!(
            parse_program(&encode("1 {=} 2")),
            Err(ParseError::InvalidAssignmentTarget { line: 1 })
        );
        assert_eq!(
            parse_program("1 )2("),
            Err(ParseError::InvalidCallTarget { line: 1 })
        );
        assert_eq!(
            parse_program("f )1 ]"),
            Err(ParseError::UnexpectedToken {
                expected: Expected::Token(TokenKind::CloseParen),
                got: TokenKind::CloseBlock,
                line: 1,
            })
        );
        assert_eq!(
            parse_program("IF 1"),
            Err(ParseError::PrematureEndOfInput {
                expected: Expected::Token(TokenKind::OpenBlock),
            })
        );
        assert_eq!(
            parse_program("a\n]"),
            Err(ParseError::UnexpectedToken {
                expected: Expected::Statement,
                got: TokenKind::CloseBlock,
                line: 2,
            })
        );
        assert_eq!(
            parse_program(")1 A 2"),
            Err(ParseError::PrematureEndOfInput {
                expected: Expected::Token(TokenKind::CloseParen),
            })
        );
        assert_eq!(
            parse_program("FUN a 1 [a]"),
            Err(ParseError::UnexpectedToken {
                expected: Expected::Identifier,
                got: TokenKind::Int,
                line: 1,
            })
        );
        assert_eq!(
            parse_program("a ; b"),
            Err(ParseError::Lex(LexError::UnexpectedCharacter { ch: ';', line: 1 }))
        );
    }

    #[test]
    fn test_missing_operand_is_kept() {
        let program = parse_program(&encode("x {=} {not}")).unwrap();

        assert_eq!(program[0].to_string(), "(x = (not))");
    }
}
