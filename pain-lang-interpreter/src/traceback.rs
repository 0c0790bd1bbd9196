use std::fmt::Display;

use crate::object::{EvaluationError, QuickReturn};

/// Failure of an evaluation, together with the chain of syntax nodes it
/// unwound through. `entries[0]` is the innermost.
#[derive(Debug, PartialEq, Clone)]
pub struct Traceback {
    error: EvaluationError,
    entries: Vec<String>,
}

fn entry(message: &str, line: Option<usize>) -> String {
    match line {
        None => message.to_owned(),
        Some(line) if message.is_empty() => format!("Line {}", line),
        Some(line) => format!("Line {}: {}", line, message),
    }
}

impl Traceback {
    pub fn new(error: EvaluationError, line: Option<usize>) -> Self {
        let entries = vec![entry(&error.to_string(), line)];
        Traceback { error, entries }
    }

    /// Records that the failure passed through a node on `line`.
    pub fn push_origin(&mut self, line: Option<usize>) {
        self.entries.push(entry("", line));
    }

    pub fn with_origin(mut self, line: Option<usize>) -> Self {
        self.push_origin(line);
        self
    }

    /// The innermost cause.
    pub fn error(&self) -> &EvaluationError {
        &self.error
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}

impl Display for Traceback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Traceback:")?;
        for (i, message) in self.entries.iter().rev().enumerate() {
            let indent = " ".repeat(i + 4);
            if message.is_empty() {
                write!(f, "\n{}---", indent)?;
            } else {
                write!(f, "\n{}{}", indent, message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Traceback {}

pub trait Traced {
    /// Appends the origin of the enclosing node to a failed result.
    fn traced(self, line: Option<usize>) -> Self;
}

impl<T> Traced for Result<T, Traceback> {
    fn traced(self, line: Option<usize>) -> Self {
        self.map_err(|traceback| traceback.with_origin(line))
    }
}

impl<T> Traced for Result<T, QuickReturn> {
    fn traced(self, line: Option<usize>) -> Self {
        self.map_err(|unwind| match unwind {
            QuickReturn::Error(traceback) => QuickReturn::Error(traceback.with_origin(line)),
            returned => returned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Value;

    #[test]
    fn test_render_innermost_last() {
        let mut traceback = Traceback::new(EvaluationError::DivisionByZero, None);
        traceback.push_origin(Some(0));
        traceback.push_origin(Some(1));
        traceback.push_origin(None);
        traceback.push_origin(Some(3));

        assert_eq!(
            traceback.to_string(),
            "Traceback:\n    Line 3\n     ---\n      Line 1\n       Line 0\n        division by zero"
        );
    }

    #[test]
    fn test_innermost_entry_carries_line() {
        let traceback = Traceback::new(EvaluationError::UndefinedName("x".into()), Some(7));

        assert_eq!(traceback.entries(), ["Line 7: Name 'x' is not defined."]);
        assert_eq!(traceback.error(), &EvaluationError::UndefinedName("x".into()));
    }

    #[test]
    fn test_traced_grows_only_on_error() {
        let ok: Result<i32, Traceback> = Ok(1);
        assert_eq!(ok.traced(Some(1)), Ok(1));

        let failed: Result<i32, Traceback> =
            Err(Traceback::new(EvaluationError::DivisionByZero, Some(2)));
        let failed = failed.traced(Some(1)).traced(None);
        assert_eq!(failed.unwrap_err().depth(), 3);
    }

    #[test]
    fn test_traced_leaves_returns_alone() {
        let returned: Result<(), QuickReturn> = Err(QuickReturn::Return(Value::Int(1)));
        assert_eq!(
            returned.traced(Some(4)),
            Err(QuickReturn::Return(Value::Int(1)))
        );
    }
}
