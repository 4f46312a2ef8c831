//! A small scripting language for authoring policies.
//!
//! Programs are statement sequences: `let`/`const` declarations, expression
//! statements, `return`, `throw`. Expressions cover literals, arrays, object
//! literals, identifier lookup, member access, call chains, `+` and unary
//! `-`, with `//` line comments. Free identifiers resolve through a
//! [`GlobalResolver`]; capability values stay opaque behind [`NativeObject`].

pub mod interp;
pub mod lexer;
pub mod parser;
pub mod value;

use thiserror::Error;

pub use interp::{run, Completion};
pub use parser::{parse, Expr, Stmt};
pub use value::{NativeFn, NativeObject, NativeRef, Value};

/// Reported when a raised value carries no usable description.
pub const UNCAUGHT_FALLBACK: &str = "Uncaught script error";

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("syntax error at line {line}: {message}")]
    Parse { line: u32, message: String },
    #[error("{message}")]
    Runtime { message: String },
    /// A value raised by a script `throw` or by a native builder.
    #[error("uncaught: {0}")]
    Thrown(Value),
}

impl ScriptError {
    pub fn parse(line: u32, message: impl Into<String>) -> Self {
        ScriptError::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        ScriptError::Runtime {
            message: message.into(),
        }
    }

    /// Human-readable description for result reporting; never empty.
    ///
    /// Thrown strings report themselves; thrown objects report their
    /// `message` member; any other raised value reports
    /// [`UNCAUGHT_FALLBACK`].
    pub fn message(&self) -> String {
        match self {
            ScriptError::Thrown(value) => thrown_message(value),
            other => other.to_string(),
        }
    }
}

fn thrown_message(value: &Value) -> String {
    let text = match value {
        Value::Str(s) => s.clone(),
        Value::Object(_) => match value.object_get("message") {
            Some(Value::Str(s)) => s.clone(),
            _ => String::new(),
        },
        _ => String::new(),
    };
    if text.is_empty() {
        UNCAUGHT_FALLBACK.to_string()
    } else {
        text
    }
}

/// Source of ambient identifiers for program evaluation.
pub trait GlobalResolver {
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// Parse and evaluate `source` in one shot.
pub fn run_program(source: &str, globals: &dyn GlobalResolver) -> Result<Completion, ScriptError> {
    let program = parser::parse(source)?;
    interp::run(&program, globals)
}

/// A strict-module finding: a construct legal in playground snippets but
/// not in a stand-alone module.
#[derive(Debug, Clone, PartialEq)]
pub struct LintNote {
    pub line: u32,
    pub message: String,
}

/// Check `source` against the stand-alone module profile.
///
/// Top-level `return` and `throw` are reported, as is any syntax error.
/// Surfaces that keep full diagnostics on will mark snippet buffers with
/// these findings; the playground editor runs with them disabled.
pub fn lint_module(source: &str) -> Vec<LintNote> {
    match parser::parse(source) {
        Ok(stmts) => stmts
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Return { .. } => Some(LintNote {
                    line: stmt.line(),
                    message: "`return` outside a function body".to_string(),
                }),
                Stmt::Throw { .. } => Some(LintNote {
                    line: stmt.line(),
                    message: "`throw` at module top level".to_string(),
                }),
                _ => None,
            })
            .collect(),
        Err(ScriptError::Parse { line, message }) => vec![LintNote { line, message }],
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thrown_string_reports_itself() {
        let err = ScriptError::Thrown(Value::Str("bad column".into()));
        assert_eq!(err.message(), "bad column");
    }

    #[test]
    fn thrown_object_reports_message_member() {
        let err = ScriptError::Thrown(Value::Object(vec![
            ("code".into(), Value::Number(400.0)),
            ("message".into(), Value::Str("unknown table".into())),
        ]));
        assert_eq!(err.message(), "unknown table");
    }

    #[test]
    fn messageless_values_fall_back() {
        for value in [
            Value::Number(42.0),
            Value::Null,
            Value::Str(String::new()),
            Value::Object(vec![("message".into(), Value::Number(1.0))]),
        ] {
            assert_eq!(ScriptError::Thrown(value).message(), UNCAUGHT_FALLBACK);
        }
    }

    #[test]
    fn parse_errors_carry_the_line() {
        let err = ScriptError::parse(3, "expected `;`");
        assert_eq!(err.message(), "syntax error at line 3: expected `;`");
    }

    #[test]
    fn module_lint_flags_snippet_constructs() {
        let notes = lint_module("let a = 1;\nreturn a;\nthrow 'x';");
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].line, 2);
        assert!(notes[0].message.contains("return"));
        assert_eq!(notes[1].line, 3);
        assert!(notes[1].message.contains("throw"));
    }

    #[test]
    fn module_lint_accepts_plain_declarations() {
        assert!(lint_module("let a = 1; let b = a + 1;").is_empty());
    }

    #[test]
    fn module_lint_reports_syntax_errors() {
        let notes = lint_module("let = ;");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].line, 1);
    }
}
