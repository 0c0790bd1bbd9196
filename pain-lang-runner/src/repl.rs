use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use pain_lang_interpreter::builtins;
use pain_lang_interpreter::environment::Scope;
use pain_lang_interpreter::evaluator::eval_program;
use pain_lang_interpreter::object::Value;
use pain_lang_interpreter::parser;

const PROMPT: &str = ">> ";

pub fn start() -> Result<(), ReadlineError> {
    let scope = Scope::new();
    builtins::install(&scope);

    let mut rl = DefaultEditor::new()?;

    loop {
        let line = match rl.readline(PROMPT) {
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                continue; // Clear line
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => return Err(err),
            Ok(line) => line,
        };
        rl.add_history_entry(line.as_str())?;

        if let Some(response) = respond(&line, &scope) {
            println!("{}", response);
        }
    }
    Ok(())
}

/// Runs one line against the session scope. Every line starts a new parse,
/// so the operator cipher restarts at shift 0.
pub fn respond(line: &str, scope: &Scope) -> Option<String> {
    let program = match parser::parse_program(line) {
        Ok(program) => program,
        Err(err) => return Some(format!("parse error: {}", err)),
    };

    match eval_program(&program, scope) {
        Ok(Value::Void) => None,
        Ok(value) => Some(value.to_string()),
        Err(traceback) => Some(traceback.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Scope {
        let scope = Scope::new();
        builtins::install(&scope);
        scope
    }

    #[test]
    fn test_bindings_persist_between_lines() {
        let scope = session();

        assert_eq!(respond("x E 5", &scope), None);
        assert_eq!(respond("x A 1", &scope), Some("6".to_owned()));
        assert_eq!(respond("max )x, 10(", &scope), Some("10".to_owned()));
    }

    #[test]
    fn test_errors_do_not_end_the_session() {
        let scope = session();

        let response = respond("1 D 0", &scope).unwrap();
        assert!(response.starts_with("Traceback:"), "{}", response);
        assert!(response.ends_with("division by zero"), "{}", response);

        let response = respond("a ]", &scope).unwrap();
        assert!(response.starts_with("parse error:"), "{}", response);

        assert_eq!(respond("\"still here\"", &scope), Some("still here".to_owned()));
    }
}
