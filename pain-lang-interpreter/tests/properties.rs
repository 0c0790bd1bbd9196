mod common;

use common::cipher::{letter, SYMBOLS};
use common::run;
use pain_lang_interpreter::ast::Operator;
use pain_lang_interpreter::lexer::{Lexer, TokenKind, ROTATING_TOKEN_COUNT};
use pain_lang_interpreter::object::{EvaluationError, Value};
use pain_lang_interpreter::parser::parse_program;
use proptest::prelude::*;

const MAX_INPUT_BYTES: usize = 256;

proptest! {
    #[test]
    fn lexer_terminates_on_arbitrary_input(
        bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_BYTES)
    ) {
        let input = String::from_utf8_lossy(&bytes).into_owned();
        let mut tokens = 0;
        for token in Lexer::new(&input) {
            tokens += 1;
            if token.is_err() {
                break;
            }
        }
        prop_assert!(tokens <= input.len() + 1);
    }

    #[test]
    fn parser_handles_arbitrary_input_without_panicking(
        bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_BYTES)
    ) {
        let input = String::from_utf8_lossy(&bytes).into_owned();
        let _ = parse_program(&input);
    }

    #[test]
    fn operator_letters_decode_at_any_shift(slots in proptest::collection::vec(0..ROTATING_TOKEN_COUNT, 1..40)) {
        let source = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let shift = (i % ROTATING_TOKEN_COUNT as usize) as u8;
                letter(SYMBOLS[*slot as usize], shift).to_string()
            })
            .collect::<Vec<_>>()
            .join(" ");

        let operators = Lexer::new(&source)
            .map(|token| Operator::try_from(token.unwrap().kind).unwrap() as u8)
            .collect::<Vec<_>>();
        prop_assert_eq!(operators, slots);
    }

    #[test]
    fn integer_arithmetic_matches_host(a in 0i64..1_000_000, b in 0i64..1_000_000) {
        prop_assert_eq!(run(&format!("{} {{+}} {}", a, b)), Ok(Value::Int(a + b)));
        prop_assert_eq!(run(&format!("{} {{-}} {}", a, b)), Ok(Value::Int(a - b)));
        prop_assert_eq!(run(&format!("{} {{*}} {}", a, b)), Ok(Value::Int(a * b)));
        prop_assert_eq!(run(&format!("{} {{<}} {}", a, b)), Ok(Value::Bool(a < b)));
        prop_assert_eq!(run(&format!("{} {{==}} {}", a, b)), Ok(Value::Bool(a == b)));
    }

    #[test]
    fn division_truncates_or_fails(a in 0i64..1_000_000, b in 0i64..100) {
        let quotient = run(&format!("{} {{/}} {}", a, b)).map_err(|traceback| traceback.error().clone());
        let remainder = run(&format!("{} {{%}} {}", a, b)).map_err(|traceback| traceback.error().clone());
        if b == 0 {
            prop_assert_eq!(quotient, Err(EvaluationError::DivisionByZero));
            prop_assert_eq!(remainder, Err(EvaluationError::DivisionByZero));
        } else {
            prop_assert_eq!(quotient, Ok(Value::Int(a / b)));
            prop_assert_eq!(remainder, Ok(Value::Int(a % b)));
        }
    }
}

#[test]
fn structural_tokens_never_shift() {
    let mut lexer = Lexer::new(")( [ ] | , 1 2.5 \"s\" name IF A");
    let kinds = lexer
        .by_ref()
        .map(|token| token.unwrap().kind)
        .collect::<Vec<_>>();

    assert_eq!(kinds.last(), Some(&TokenKind::Add));
    assert_eq!(lexer.shift(), 1);
}
