pub mod ast;
pub mod builtins;
#[cfg(test)]
#[path = "../tests/common/cipher.rs"]
mod cipher;
pub mod environment;
pub mod evaluator;
pub mod expression_parsing;
pub mod lexer;
pub mod object;
pub mod operators;
pub mod parser;
pub mod traceback;
