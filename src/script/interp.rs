//! Tree-walking evaluator for parsed programs.

use super::parser::{Expr, Stmt};
use super::value::Value;
use super::{GlobalResolver, ScriptError};

/// How a program body finished.
#[derive(Debug)]
pub enum Completion {
    /// An explicit `return` was reached; the rest of the body is skipped.
    Returned(Value),
    /// The body ran to the end without returning.
    Finished,
}

/// Evaluate a parsed program.
///
/// Free identifiers resolve to script-local bindings first, then through
/// `globals`. A script `throw` surfaces as [`ScriptError::Thrown`]; nothing
/// is caught here.
pub fn run(stmts: &[Stmt], globals: &dyn GlobalResolver) -> Result<Completion, ScriptError> {
    let mut scope = Scope {
        globals,
        locals: Vec::new(),
    };
    for stmt in stmts {
        match stmt {
            Stmt::Declare { name, init, .. } => {
                let value = scope.eval(init)?;
                scope.declare(name, value);
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => scope.eval(expr)?,
                    None => Value::Null,
                };
                return Ok(Completion::Returned(value));
            }
            Stmt::Throw { value, .. } => {
                let value = scope.eval(value)?;
                return Err(ScriptError::Thrown(value));
            }
            Stmt::Expr { expr, .. } => {
                scope.eval(expr)?;
            }
        }
    }
    Ok(Completion::Finished)
}

struct Scope<'a> {
    globals: &'a dyn GlobalResolver,
    locals: Vec<(String, Value)>,
}

impl Scope<'_> {
    fn declare(&mut self, name: &str, value: Value) {
        // Re-declaration pushes a new entry; lookup walks back to front,
        // so the latest binding shadows earlier ones.
        self.locals.push((name.to_string(), value));
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.locals
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .or_else(|| self.globals.resolve(name))
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval(item)?);
                }
                Ok(Value::Array(out))
            }
            Expr::Object(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for (key, value) in fields {
                    out.push((key.clone(), self.eval(value)?));
                }
                Ok(Value::Object(out))
            }
            Expr::Var(name) => self
                .lookup(name)
                .ok_or_else(|| ScriptError::runtime(format!("{} is not defined", name))),
            Expr::Call { callee, args } => {
                let target = self.eval(callee)?;
                let args = self.eval_args(args)?;
                match &target {
                    Value::Native(native) => native.call(&args),
                    _ => Err(ScriptError::runtime(format!(
                        "{} is not a function",
                        callee_name(callee, &target)
                    ))),
                }
            }
            Expr::Member { recv, name } => {
                let target = self.eval(recv)?;
                member_of(&target, name)
            }
            Expr::MethodCall { recv, name, args } => {
                let target = self.eval(recv)?;
                let args = self.eval_args(args)?;
                match &target {
                    Value::Native(native) => native.call_method(name, &args),
                    Value::Object(_) => match member_of(&target, name)? {
                        Value::Native(native) => native.call(&args),
                        _ => Err(ScriptError::runtime(format!("{} is not a function", name))),
                    },
                    other => Err(ScriptError::runtime(format!(
                        "{} has no method `{}`",
                        other.type_name(),
                        name
                    ))),
                }
            }
            Expr::Add(lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                match (&lhs, &rhs) {
                    (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                    // Either side being a string turns `+` into concatenation.
                    (Value::Str(_), _) | (_, Value::Str(_)) => {
                        Ok(Value::Str(format!("{}{}", lhs, rhs)))
                    }
                    _ => Err(ScriptError::runtime(format!(
                        "cannot add {} and {}",
                        lhs.type_name(),
                        rhs.type_name()
                    ))),
                }
            }
            Expr::Sub(lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                match (&lhs, &rhs) {
                    (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                    _ => Err(ScriptError::runtime(format!(
                        "cannot subtract {} from {}",
                        rhs.type_name(),
                        lhs.type_name()
                    ))),
                }
            }
            Expr::Neg(inner) => match self.eval(inner)? {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(ScriptError::runtime(format!(
                    "cannot negate {}",
                    other.type_name()
                ))),
            },
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, ScriptError> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            out.push(self.eval(arg)?);
        }
        Ok(out)
    }
}

fn member_of(target: &Value, name: &str) -> Result<Value, ScriptError> {
    match target {
        Value::Native(native) => native.get_prop(name).ok_or_else(|| {
            ScriptError::runtime(format!(
                "{} has no property `{}`",
                native.type_name(),
                name
            ))
        }),
        Value::Object(_) => target
            .object_get(name)
            .cloned()
            .ok_or_else(|| ScriptError::runtime(format!("object has no property `{}`", name))),
        other => Err(ScriptError::runtime(format!(
            "{} has no property `{}`",
            other.type_name(),
            name
        ))),
    }
}

/// Prefer the identifier the user wrote over the value's type name.
fn callee_name(callee: &Expr, value: &Value) -> String {
    match callee {
        Expr::Var(name) => name.clone(),
        _ => value.type_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::script::value::{NativeFn, NativeObject};
    use crate::script::{parse, run_program};

    struct TestGlobals(Vec<(String, Value)>);

    impl GlobalResolver for TestGlobals {
        fn resolve(&self, name: &str) -> Option<Value> {
            self.0
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        }
    }

    fn upper(args: &[Value]) -> Result<Value, ScriptError> {
        match args.first() {
            Some(Value::Str(s)) => Ok(Value::Str(s.to_uppercase())),
            _ => Err(ScriptError::runtime("upper expects a string")),
        }
    }

    fn globals() -> TestGlobals {
        TestGlobals(vec![("upper".to_string(), NativeFn::value("upper", upper))])
    }

    fn returned(source: &str) -> Value {
        match run_program(source, &globals()).unwrap() {
            Completion::Returned(value) => value,
            Completion::Finished => panic!("program did not return"),
        }
    }

    #[test]
    fn returns_a_string_literal() {
        assert_eq!(returned("return 'select 1';"), Value::Str("select 1".into()));
    }

    #[test]
    fn let_bindings_and_concatenation() {
        let value = returned("let table = 'docs';\nreturn 'on ' + table;");
        assert_eq!(value, Value::Str("on docs".into()));
    }

    #[test]
    fn later_declaration_shadows() {
        assert_eq!(
            returned("let x = 1; let x = 2; return x;"),
            Value::Number(2.0)
        );
    }

    #[test]
    fn arithmetic_and_negation() {
        assert_eq!(returned("return 10 - 2 - 3;"), Value::Number(5.0));
        assert_eq!(returned("return -(1 + 2);"), Value::Number(-3.0));
    }

    #[test]
    fn concatenation_renders_numbers_plainly() {
        assert_eq!(
            returned("return 'limit ' + 10;"),
            Value::Str("limit 10".into())
        );
    }

    #[test]
    fn native_call_through_global() {
        assert_eq!(returned("return upper('abc');"), Value::Str("ABC".into()));
    }

    #[test]
    fn object_member_holding_a_native_is_callable() {
        let value = returned("let helpers = { shout: upper };\nreturn helpers.shout('hi');");
        assert_eq!(value, Value::Str("HI".into()));
    }

    #[test]
    fn unknown_identifier_is_a_runtime_error() {
        let err = run_program("return nope;", &globals()).unwrap_err();
        assert_eq!(err.message(), "nope is not defined");
    }

    #[test]
    fn calling_a_non_function_names_the_identifier() {
        let globals = TestGlobals(vec![("n".to_string(), Value::Number(7.0))]);
        let err = run_program("n();", &globals).unwrap_err();
        assert_eq!(err.message(), "n is not a function");
    }

    #[test]
    fn throw_surfaces_as_thrown_value() {
        let err = run_program("throw 'bad column';", &globals()).unwrap_err();
        assert!(matches!(err, ScriptError::Thrown(Value::Str(ref s)) if s == "bad column"));
    }

    #[test]
    fn no_return_finishes_without_value() {
        let completion = run_program("let a = 1;", &globals()).unwrap();
        assert!(matches!(completion, Completion::Finished));
    }

    #[test]
    fn return_stops_the_body() {
        let completion = run_program("return 'done'; throw 'never';", &globals()).unwrap();
        assert!(matches!(completion, Completion::Returned(_)));
    }

    #[test]
    fn expression_statements_run_for_effect() {
        struct Recorder(AtomicUsize);

        impl NativeObject for Recorder {
            fn type_name(&self) -> &'static str {
                "recorder"
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn call(&self, _args: &[Value]) -> Result<Value, ScriptError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            }
        }

        let recorder = Arc::new(Recorder(AtomicUsize::new(0)));
        let globals = TestGlobals(vec![(
            "tick".to_string(),
            Value::Native(recorder.clone()),
        )]);
        let program = parse("tick(); tick();").unwrap();
        let completion = run(&program, &globals).unwrap();
        assert!(matches!(completion, Completion::Finished));
        assert_eq!(recorder.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn adding_incompatible_types_is_an_error() {
        let err = run_program("return true + 1;", &globals()).unwrap_err();
        assert_eq!(err.message(), "cannot add bool and number");
    }
}
