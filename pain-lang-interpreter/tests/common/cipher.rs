//! Spells programs with readable operator placeholders such as `{+}` or
//! `{return}` and turns them into the letters the lexer decodes.
#![allow(dead_code)]

pub const SYMBOLS: [&str; 18] = [
    "+", "-", "*", "/", "=", "==", ">", ">=", "<", "<=", "int", "float", "bool", "not", "and", "or",
    "%", "return",
];

const COUNT: u8 = SYMBOLS.len() as u8;

/// Replaces each placeholder with the letter that decodes to that operator
/// at its position in the source.
pub fn encode(template: &str) -> String {
    let mut output = String::new();
    let mut shift = 0;
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let end = start + rest[start..].find('}').expect("unclosed placeholder");
        output.push(letter(&rest[start + 1..end], shift));
        shift = (shift + 1) % COUNT;
        rest = &rest[end + 1..];
    }
    output.push_str(rest);
    output
}

pub fn letter(symbol: &str, shift: u8) -> char {
    let slot = SYMBOLS
        .iter()
        .position(|candidate| *candidate == symbol)
        .unwrap_or_else(|| panic!("unknown operator placeholder {symbol}")) as u8;
    (b'A' + (slot + shift) % COUNT) as char
}
