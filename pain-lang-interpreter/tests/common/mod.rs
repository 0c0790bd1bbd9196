#![allow(dead_code)]

pub mod cipher;

use cipher::encode;
use pain_lang_interpreter::builtins::install;
use pain_lang_interpreter::environment::Scope;
use pain_lang_interpreter::evaluator::eval_program;
use pain_lang_interpreter::object::Value;
use pain_lang_interpreter::parser::parse_program;
use pain_lang_interpreter::traceback::Traceback;

pub fn run_in(template: &str, scope: &Scope) -> Result<Value, Traceback> {
    let program = parse_program(&encode(template)).expect("program should parse");
    eval_program(&program, scope)
}

/// Runs a program against a fresh global scope with the builtins installed.
pub fn run(template: &str) -> Result<Value, Traceback> {
    let scope = Scope::new();
    install(&scope);
    run_in(template, &scope)
}
