use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use pain_lang_interpreter::builtins;
use pain_lang_interpreter::environment::Scope;
use pain_lang_interpreter::evaluator::eval_program;
use pain_lang_interpreter::object::Value;
use pain_lang_interpreter::parser::{self, ParseError};
use pain_lang_interpreter::traceback::Traceback;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Evaluation(Traceback),
    #[error("{0} statement(s) failed")]
    Failures(usize),
}

pub fn execute_file(path: &Path, keep_going: bool) -> Result<(), RunError> {
    let source = std::fs::read_to_string(path).map_err(|source| RunError::Io {
        path: path.to_owned(),
        source,
    })?;
    let value = execute(&source, keep_going)?;
    info!("{} finished with {}", path.display(), value);
    Ok(())
}

/// Parses and runs a whole script against a fresh global scope.
pub fn execute(source: &str, keep_going: bool) -> Result<Value, RunError> {
    let program = parser::parse_program(source)?;
    info!("parsed {} statement(s)", program.len());

    let scope = Scope::new();
    builtins::install(&scope);

    if !keep_going {
        return eval_program(&program, &scope).map_err(RunError::Evaluation);
    }

    let mut failures = 0;
    let mut output = Value::Void;
    for statement in &program {
        match statement.evaluate(&scope) {
            Ok(Value::Return(ref value)) => {
                output = (**value).clone();
                break;
            }
            Ok(value) => output = value,
            Err(traceback) => {
                warn!("statement on line {:?} failed", statement.line);
                eprintln!("{}", traceback);
                failures += 1;
            }
        }
    }

    match failures {
        0 => Ok(output),
        failures => Err(RunError::Failures(failures)),
    }
}
