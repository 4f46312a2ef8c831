//! Runtime values for policy scripts.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::ScriptError;

/// Shared handle to an opaque capability value.
pub type NativeRef = Arc<dyn NativeObject + Send + Sync>;

/// A value produced or consumed by script evaluation.
///
/// Plain data variants mirror the literal forms of the language; `Native`
/// wraps capability objects supplied by a collaborator. The runtime never
/// looks inside a native beyond the [`NativeObject`] trait.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Value>),
    /// Insertion-ordered key/value pairs from an object literal.
    Object(Vec<(String, Value)>),
    Native(NativeRef),
}

/// Behaviour of an opaque capability value.
///
/// Collaborators implement this to expose builder objects into scripts.
/// `as_any` lets a collaborator recover its own concrete types from values
/// handed back to it; the runtime itself never downcasts.
pub trait NativeObject {
    /// Short type name used in diagnostics and editor hints.
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    /// Invoke the value as a function, `f(args)`.
    fn call(&self, _args: &[Value]) -> Result<Value, ScriptError> {
        Err(ScriptError::runtime(format!(
            "{} is not callable",
            self.type_name()
        )))
    }

    /// Property access without a call, `obj.prop`.
    fn get_prop(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Method invocation, `obj.name(args)`.
    fn call_method(&self, name: &str, _args: &[Value]) -> Result<Value, ScriptError> {
        Err(ScriptError::runtime(format!(
            "{} has no method `{}`",
            self.type_name(),
            name
        )))
    }
}

/// A named native function backed by a plain fn pointer.
///
/// Free-standing capabilities (builder entry points) are registered this
/// way; stateful capabilities implement [`NativeObject`] directly.
pub struct NativeFn {
    name: &'static str,
    func: fn(&[Value]) -> Result<Value, ScriptError>,
}

impl NativeFn {
    pub fn value(name: &'static str, func: fn(&[Value]) -> Result<Value, ScriptError>) -> Value {
        Value::Native(Arc::new(NativeFn { name, func }))
    }
}

impl NativeObject for NativeFn {
    fn type_name(&self) -> &'static str {
        self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call(&self, args: &[Value]) -> Result<Value, ScriptError> {
        (self.func)(args)
    }
}

impl Value {
    pub fn native(obj: impl NativeObject + Send + Sync + 'static) -> Value {
        Value::Native(Arc::new(obj))
    }

    /// Type name used in diagnostics ("string", "number", ...).
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Native(n) => n.type_name(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_native(&self) -> Option<&NativeRef> {
        match self {
            Value::Native(n) => Some(n),
            _ => None,
        }
    }

    /// First value stored under `key` in an object literal.
    pub fn object_get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Render a number the way scripts write them: integral values lose the
/// trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Native(n) => write!(f, "<{}>", n.type_name()),
        }
    }
}

// Debug mirrors Display; natives have no useful structural form.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_formatting_drops_integral_fraction() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(1.5), "1.5");
    }

    #[test]
    fn display_is_unquoted_for_strings() {
        assert_eq!(Value::Str("abc".into()).to_string(), "abc");
        assert_eq!(
            Value::Array(vec![Value::Number(1.0), Value::Str("x".into())]).to_string(),
            "[1, x]"
        );
    }

    #[test]
    fn object_get_returns_first_match() {
        let obj = Value::Object(vec![
            ("a".into(), Value::Number(1.0)),
            ("a".into(), Value::Number(2.0)),
        ]);
        assert_eq!(obj.object_get("a"), Some(&Value::Number(1.0)));
        assert_eq!(obj.object_get("b"), None);
    }

    #[test]
    fn native_fn_is_callable_and_named() {
        fn answer(_: &[Value]) -> Result<Value, ScriptError> {
            Ok(Value::Number(42.0))
        }
        let v = NativeFn::value("answer", answer);
        let native = v.as_native().unwrap();
        assert_eq!(native.type_name(), "answer");
        assert_eq!(native.call(&[]).unwrap(), Value::Number(42.0));
    }
}
