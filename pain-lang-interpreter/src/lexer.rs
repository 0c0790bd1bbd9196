use std::rc::Rc;

use log::trace;
use thiserror::Error;

/// Code of the first rotating operator token. Everything at or above it is
/// an operator.
pub const ROTATING_TOKEN_OFFSET: u8 = 17;
/// Number of operator slots the single letter cipher rotates through.
pub const ROTATING_TOKEN_COUNT: u8 = 18;

#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    EndOfInput = 0,
    EndOfLine,
    Comma,

    OpenParen,
    CloseParen,
    OpenBlock,
    CloseBlock,

    Name,
    Int,
    Float,
    String,

    // Keywords
    If,
    Elif,
    Else,
    While,
    For,
    FunctionDecl,

    // Operators, in cipher order (`A` at shift 0 is `Add`). Must start at
    // ROTATING_TOKEN_OFFSET.
    Add = 17,
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

/// Operator tokens in cipher order, indexed by slot.
const ROTATING_TOKENS: [TokenKind; ROTATING_TOKEN_COUNT as usize] = [
    TokenKind::Add,
    TokenKind::Subtract,
    TokenKind::Multiply,
    TokenKind::Divide,
    TokenKind::Assign,
    TokenKind::Equal,
    TokenKind::GreaterThan,
    TokenKind::GreaterEqual,
    TokenKind::LessThan,
    TokenKind::LessEqual,
    TokenKind::ToInt,
    TokenKind::ToFloat,
    TokenKind::ToBool,
    TokenKind::Not,
    TokenKind::And,
    TokenKind::Or,
    TokenKind::Modulo,
    TokenKind::Return,
];

impl TokenKind {
    pub fn is_operator(self) -> bool {
        self as u8 >= ROTATING_TOKEN_OFFSET
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Bool(bool),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub payload: Option<Literal>,
    pub line: usize,
}

impl Token {
    fn new(kind: TokenKind, line: usize) -> Self {
        Token {
            kind,
            payload: None,
            line,
        }
    }

    fn with_payload(kind: TokenKind, payload: Literal, line: usize) -> Self {
        Token {
            kind,
            payload: Some(payload),
            line,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.kind.is_operator()
    }

    /// Identifier carried by a `Name` token.
    pub fn name(&self) -> Option<Rc<str>> {
        match (&self.kind, &self.payload) {
            (TokenKind::Name, Some(Literal::Str(name))) => Some(name.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum LexError {
    #[error("Unexpected character {ch:?} on line {line}")]
    UnexpectedCharacter { ch: char, line: usize },
    #[error("Unterminated string starting on line {line}")]
    UnterminatedString { line: usize },
    #[error("Unknown keyword {word:?} on line {line}")]
    UnknownKeyword { word: Rc<str>, line: usize },
    #[error("Integer literal {literal} on line {line} does not fit in 64 bits")]
    IntegerOverflow { literal: Rc<str>, line: usize },
}

fn keywords(word: &str) -> Option<TokenKind> {
    match word {
        "IF" => Some(TokenKind::If),
        "ELIF" => Some(TokenKind::Elif),
        "ELSE" => Some(TokenKind::Else),
        "WHILE" => Some(TokenKind::While),
        "FOR" => Some(TokenKind::For),
        "FUN" => Some(TokenKind::FunctionDecl),
        _ => None,
    }
}

#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    iter: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    shift: u8,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let iter = input.char_indices().peekable();
        Self {
            input,
            iter,
            line: 1,
            shift: 0,
            peeked: None,
        }
    }

    /// Number of operators scanned so far, modulo the rotation size.
    pub fn shift(&self) -> u8 {
        self.shift
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    pub fn peek_token(&mut self) -> Result<Token, LexError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan()?,
        };
        self.peeked = Some(token.clone());
        Ok(token)
    }

    fn scan(&mut self) -> Result<Token, LexError> {
        while let Some((_, ch)) = self.iter.next_if(|(_, ch)| ch.is_whitespace()) {
            if ch == '\n' {
                self.line += 1;
            }
        }

        let Some((idx, ch)) = self.iter.next() else {
            return Ok(Token::new(TokenKind::EndOfInput, self.line));
        };

        let token = match ch {
            ')' => Token::new(TokenKind::OpenParen, self.line),
            '(' => Token::new(TokenKind::CloseParen, self.line),
            '[' => Token::new(TokenKind::OpenBlock, self.line),
            ']' => Token::new(TokenKind::CloseBlock, self.line),
            '|' => Token::new(TokenKind::EndOfLine, self.line),
            ',' => Token::new(TokenKind::Comma, self.line),
            c if c.is_ascii_digit() => self.read_number(idx)?,
            '"' => self.read_string(idx)?,
            c if c.is_ascii_uppercase() => self.read_uppercase(idx)?,
            c if c.is_ascii_alphabetic() => self.read_name(idx),
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    ch,
                    line: self.line,
                })
            }
        };
        trace!("scanned {:?} on line {}", token.kind, token.line);
        Ok(token)
    }

    fn read_number(&mut self, start: usize) -> Result<Token, LexError> {
        while self.iter.next_if(|(_, ch)| ch.is_ascii_digit()).is_some() {}

        let mut end = self.next_idx();
        let mut chars = self.input[end..].chars();
        let is_float = chars.next() == Some('.') && chars.next().is_some_and(|c| c.is_ascii_digit());

        if is_float {
            self.iter.next();
            while self.iter.next_if(|(_, ch)| ch.is_ascii_digit()).is_some() {}
            end = self.next_idx();
            let value = self.input[start..end]
                .parse::<f64>()
                .expect("digits around a dot");
            return Ok(Token::with_payload(
                TokenKind::Float,
                Literal::Float(value),
                self.line,
            ));
        }

        let literal = &self.input[start..end];
        let value = literal.parse::<i64>().map_err(|_| LexError::IntegerOverflow {
            literal: literal.into(),
            line: self.line,
        })?;
        Ok(Token::with_payload(
            TokenKind::Int,
            Literal::Int(value),
            self.line,
        ))
    }

    fn read_string(&mut self, start: usize) -> Result<Token, LexError> {
        let first_line = self.line;
        loop {
            match self.iter.next() {
                Some((end, '"')) => {
                    let content = &self.input[start + 1..end];
                    return Ok(Token::with_payload(
                        TokenKind::String,
                        Literal::Str(content.into()),
                        first_line,
                    ));
                }
                Some((_, '\n')) => self.line += 1,
                Some(_) => {}
                None => return Err(LexError::UnterminatedString { line: first_line }),
            }
        }
    }

    fn read_uppercase(&mut self, start: usize) -> Result<Token, LexError> {
        while self.iter.next_if(|(_, ch)| ch.is_ascii_uppercase()).is_some() {}

        let word = &self.input[start..self.next_idx()];
        let mut letters = word.chars();
        match (letters.next(), letters.next()) {
            (Some(letter), None) => Ok(self.decode_operator(letter)),
            _ => keywords(word)
                .map(|kind| Token::new(kind, self.line))
                .ok_or_else(|| LexError::UnknownKeyword {
                    word: word.into(),
                    line: self.line,
                }),
        }
    }

    /// Maps a single letter to an operator, offset by the number of
    /// operators already scanned. Slots outside the table wrap around.
    fn decode_operator(&mut self, letter: char) -> Token {
        let distance = letter as i32 - 'A' as i32 - i32::from(self.shift);
        let slot = distance.rem_euclid(i32::from(ROTATING_TOKEN_COUNT)) as usize;

        self.shift = (self.shift + 1) % ROTATING_TOKEN_COUNT;
        Token::new(ROTATING_TOKENS[slot], self.line)
    }

    fn read_name(&mut self, start: usize) -> Token {
        while self.iter.next_if(|(_, ch)| ch.is_ascii_alphabetic()).is_some() {}

        let name = &self.input[start..self.next_idx()];
        Token::with_payload(TokenKind::Name, Literal::Str(name.into()), self.line)
    }

    fn next_idx(&mut self) -> usize {
        self.iter
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(Token {
                kind: TokenKind::EndOfInput,
                ..
            }) => None,
            other => Some(other),
        }
    }
}
