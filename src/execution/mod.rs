//! One-shot execution of policy scripts.

use serde::Serialize;
use tracing::debug;

use crate::bindings::Bindings;
use crate::script::{self, Completion, Value};

/// Fixed message for a program that completes without producing SQL text.
pub const CONTRACT_VIOLATION: &str = "Code must return a string (use policy.toSQL())";

/// Tagged outcome of one execution. Exactly one variant, never partial;
/// the failure message is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionResult {
    Success { sql: String },
    Failure { message: String },
}

impl ExecutionResult {
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            ExecutionResult::Failure {
                message: script::UNCAUGHT_FALLBACK.to_string(),
            }
        } else {
            ExecutionResult::Failure { message }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }
}

/// Evaluate `source` with the registry names as its only free identifiers.
///
/// The call is synchronous, runs the program exactly once, and holds no
/// state between calls. It never returns an error to the caller: a raise
/// anywhere in the program becomes a `Failure` carrying the raised value's
/// description, and completing with anything but a string becomes the fixed
/// [`CONTRACT_VIOLATION`] message. There is no time or step limit; a
/// program that never finishes blocks its caller.
pub fn execute(source: &str, bindings: &Bindings) -> ExecutionResult {
    match script::run_program(source, bindings) {
        Ok(Completion::Returned(Value::Str(sql))) => ExecutionResult::Success { sql },
        Ok(Completion::Returned(other)) => {
            debug!(returned = other.type_name(), "non-string completion");
            ExecutionResult::failure(CONTRACT_VIOLATION)
        }
        Ok(Completion::Finished) => ExecutionResult::failure(CONTRACT_VIOLATION),
        Err(err) => {
            debug!(error = %err, "execution raised");
            ExecutionResult::failure(err.message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{NativeFn, ScriptError, UNCAUGHT_FALLBACK};

    fn upper(args: &[Value]) -> Result<Value, ScriptError> {
        match args.first() {
            Some(Value::Str(s)) => Ok(Value::Str(s.to_uppercase())),
            _ => Err(ScriptError::runtime("upper expects a string")),
        }
    }

    fn registry() -> Bindings {
        Bindings::builder()
            .bind("upper", NativeFn::value("upper", upper))
            .build()
    }

    fn failure_message(result: ExecutionResult) -> String {
        match result {
            ExecutionResult::Failure { message } => message,
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn string_completion_is_success() {
        assert_eq!(
            execute("return 'X';", &registry()),
            ExecutionResult::Success { sql: "X".into() }
        );
    }

    #[test]
    fn number_completion_violates_the_contract() {
        let result = execute("return 42;", &registry());
        assert_eq!(failure_message(result), CONTRACT_VIOLATION);
    }

    #[test]
    fn null_and_missing_returns_violate_the_contract() {
        for source in ["return null;", "return;", "let a = 'sql';"] {
            let result = execute(source, &registry());
            assert_eq!(failure_message(result), CONTRACT_VIOLATION, "{}", source);
        }
    }

    #[test]
    fn thrown_string_becomes_the_message() {
        let result = execute("throw 'bad column';", &registry());
        assert_eq!(failure_message(result), "bad column");
    }

    #[test]
    fn thrown_object_reports_its_message_member() {
        let result = execute("throw { message: 'unknown table' };", &registry());
        assert_eq!(failure_message(result), "unknown table");
    }

    #[test]
    fn messageless_raise_uses_the_fallback() {
        let result = execute("throw 42;", &registry());
        assert_eq!(failure_message(result), UNCAUGHT_FALLBACK);
    }

    #[test]
    fn unknown_identifier_is_reported_not_propagated() {
        let result = execute("return policy('x');", &registry());
        assert_eq!(failure_message(result), "policy is not defined");
    }

    #[test]
    fn syntax_errors_are_reported_with_a_line() {
        let result = execute("return 'a\nreturn 'b';", &registry());
        let message = failure_message(result);
        assert!(message.starts_with("syntax error at line 1"), "{}", message);
    }

    #[test]
    fn registry_capabilities_are_reachable() {
        assert_eq!(
            execute("return upper('abc');", &registry()),
            ExecutionResult::Success { sql: "ABC".into() }
        );
    }

    #[test]
    fn calls_observe_nothing_from_prior_calls() {
        let bindings = registry();
        assert!(execute("let a = 'one'; return a;", &bindings).is_success());
        let result = execute("return a;", &bindings);
        assert_eq!(failure_message(result), "a is not defined");
    }

    #[test]
    fn results_serialize_with_a_status_tag() {
        let success = serde_json::to_value(execute("return 'S';", &registry())).unwrap();
        assert_eq!(success["status"], "success");
        assert_eq!(success["sql"], "S");

        let failure = serde_json::to_value(execute("return 1;", &registry())).unwrap();
        assert_eq!(failure["status"], "failure");
        assert_eq!(failure["message"], CONTRACT_VIOLATION);
    }

    #[test]
    fn empty_failure_messages_are_replaced() {
        assert_eq!(
            ExecutionResult::failure(""),
            ExecutionResult::Failure {
                message: UNCAUGHT_FALLBACK.into()
            }
        );
    }
}
