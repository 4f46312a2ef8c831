//! Request-context accessors exposed to scripts as `auth`.

use std::any::Any;

use crate::script::{NativeObject, ScriptError, Value};

use super::expr::SqlExpr;
use super::sql;
use super::str_arg;

/// SQL for the authenticated subject's id.
pub fn uid_expr() -> SqlExpr {
    SqlExpr::leaf("auth.uid()")
}

/// SQL reading one claim out of the request JWT. The result text is
/// self-parenthesized so it embeds anywhere.
pub fn claim_expr(key: &str) -> SqlExpr {
    SqlExpr::leaf(format!("(auth.jwt() ->> {})", sql::quote_literal(key)))
}

/// SQL for the session's database role.
pub fn current_user_expr() -> SqlExpr {
    SqlExpr::leaf("current_user")
}

/// The `auth` capability object.
#[derive(Debug, Clone, Copy)]
pub struct Auth;

impl NativeObject for Auth {
    fn type_name(&self) -> &'static str {
        "Auth"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value, ScriptError> {
        match name {
            "uid" => Ok(Value::native(uid_expr())),
            "claim" => Ok(Value::native(claim_expr(str_arg("claim(key)", args, 0)?))),
            "currentUser" => Ok(Value::native(current_user_expr())),
            _ => Err(ScriptError::runtime(format!(
                "{} has no method `{}`",
                self.type_name(),
                name
            ))),
        }
    }
}
