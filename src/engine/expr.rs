//! Composable SQL predicate fragments and column references.

use std::any::Any;

use crate::script::value::format_number;
use crate::script::{NativeObject, ScriptError, Value};

use super::query::QueryBuilder;
use super::sql;
use super::EngineError;

/// A SQL fragment scripts compose with `.and`, `.or`, `.not`.
#[derive(Debug, Clone)]
pub struct SqlExpr {
    sql: String,
    /// True when the text has a top-level `and`/`or` and must be wrapped
    /// before embedding into a larger expression.
    grouped: bool,
}

impl SqlExpr {
    pub fn leaf(sql: impl Into<String>) -> Self {
        SqlExpr {
            sql: sql.into(),
            grouped: false,
        }
    }

    fn composite(sql: String) -> Self {
        SqlExpr { sql, grouped: true }
    }

    /// The fragment as written at the top of a clause; the clause itself
    /// supplies the outer parentheses.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The fragment as written inside another expression.
    pub fn embedded(&self) -> String {
        if self.grouped {
            format!("({})", self.sql)
        } else {
            self.sql.clone()
        }
    }

    pub fn and(&self, other: &SqlExpr) -> SqlExpr {
        SqlExpr::composite(format!("{} and {}", self.embedded(), other.embedded()))
    }

    pub fn or(&self, other: &SqlExpr) -> SqlExpr {
        SqlExpr::composite(format!("{} or {}", self.embedded(), other.embedded()))
    }

    /// Always parenthesizes the operand, so precedence never surprises.
    pub fn negated(&self) -> SqlExpr {
        SqlExpr::leaf(format!("not ({})", self.sql))
    }
}

impl NativeObject for SqlExpr {
    fn type_name(&self) -> &'static str {
        "SqlExpr"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value, ScriptError> {
        match name {
            "and" => {
                let rhs = as_predicate("and(expr)", args.first())?;
                Ok(Value::native(self.and(&rhs)))
            }
            "or" => {
                let rhs = as_predicate("or(expr)", args.first())?;
                Ok(Value::native(self.or(&rhs)))
            }
            "not" => Ok(Value::native(self.negated())),
            _ => Err(ScriptError::runtime(format!(
                "{} has no method `{}`",
                self.type_name(),
                name
            ))),
        }
    }
}

/// A validated column reference; comparisons produce [`SqlExpr`] leaves.
#[derive(Debug, Clone)]
pub struct ColRef {
    sql: String,
}

impl ColRef {
    pub fn new(name: &str) -> Result<Self, EngineError> {
        Ok(ColRef {
            sql: sql::ident("column", name)?,
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Equality against an engine-built fragment, for composition outside
    /// the script surface.
    pub fn equals(&self, rhs: &SqlExpr) -> SqlExpr {
        SqlExpr::leaf(format!("{} = {}", self.sql, rhs.embedded()))
    }

    fn compare(
        &self,
        call: &'static str,
        op: &str,
        args: &[Value],
    ) -> Result<SqlExpr, EngineError> {
        let rhs = args
            .first()
            .ok_or_else(|| EngineError::Arguments(format!("{} expects a value", call)))?;
        Ok(SqlExpr::leaf(format!(
            "{} {} {}",
            self.sql,
            op,
            operand(rhs)?
        )))
    }

    fn membership(&self, args: &[Value]) -> Result<SqlExpr, EngineError> {
        match args.first() {
            Some(Value::Array(items)) => {
                if items.is_empty() {
                    return Err(EngineError::Arguments(
                        "in(values) needs at least one value".to_string(),
                    ));
                }
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    rendered.push(operand(item)?);
                }
                Ok(SqlExpr::leaf(format!(
                    "{} in ({})",
                    self.sql,
                    rendered.join(", ")
                )))
            }
            Some(Value::Native(native)) => {
                if let Some(query) = native.as_any().downcast_ref::<QueryBuilder>() {
                    Ok(SqlExpr::leaf(format!(
                        "{} in ({})",
                        self.sql,
                        query.render()?
                    )))
                } else {
                    Err(EngineError::Arguments(format!(
                        "in(values) expects an array or a subquery, got {}",
                        native.type_name()
                    )))
                }
            }
            Some(other) => Err(EngineError::Arguments(format!(
                "in(values) expects an array or a subquery, got {}",
                other.type_name()
            ))),
            None => Err(EngineError::Arguments(
                "in(values) expects an array or a subquery".to_string(),
            )),
        }
    }
}

impl NativeObject for ColRef {
    fn type_name(&self) -> &'static str {
        "Column"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value, ScriptError> {
        let expr = match name {
            "eq" => self.compare("eq(value)", "=", args)?,
            "ne" => self.compare("ne(value)", "<>", args)?,
            "lt" => self.compare("lt(value)", "<", args)?,
            "lte" => self.compare("lte(value)", "<=", args)?,
            "gt" => self.compare("gt(value)", ">", args)?,
            "gte" => self.compare("gte(value)", ">=", args)?,
            "like" => {
                let pattern = super::str_arg("like(pattern)", args, 0)?;
                SqlExpr::leaf(format!("{} like {}", self.sql, sql::quote_literal(pattern)))
            }
            "in" => self.membership(args)?,
            "isNull" => SqlExpr::leaf(format!("{} is null", self.sql)),
            "notNull" => SqlExpr::leaf(format!("{} is not null", self.sql)),
            _ => {
                return Err(ScriptError::runtime(format!(
                    "{} has no method `{}`",
                    self.type_name(),
                    name
                )))
            }
        };
        Ok(Value::native(expr))
    }
}

/// Render a script value on the right-hand side of a comparison.
pub fn operand(value: &Value) -> Result<String, EngineError> {
    match value {
        Value::Str(s) => Ok(sql::quote_literal(s)),
        Value::Number(n) => Ok(format_number(*n)),
        Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Value::Null => Err(EngineError::Arguments(
            "cannot compare against null; use isNull() or notNull()".to_string(),
        )),
        Value::Native(native) => {
            let any = native.as_any();
            if let Some(col) = any.downcast_ref::<ColRef>() {
                Ok(col.sql().to_string())
            } else if let Some(expr) = any.downcast_ref::<SqlExpr>() {
                Ok(expr.embedded())
            } else if let Some(query) = any.downcast_ref::<QueryBuilder>() {
                Ok(format!("({})", query.render()?))
            } else {
                Err(EngineError::Arguments(format!(
                    "cannot use a {} in a comparison",
                    native.type_name()
                )))
            }
        }
        Value::Array(_) => Err(EngineError::Arguments(
            "an array only works with in(values)".to_string(),
        )),
        Value::Object(_) => Err(EngineError::Arguments(
            "cannot use an object in a comparison".to_string(),
        )),
    }
}

/// Coerce a script value into a predicate fragment. Booleans become the
/// SQL constants, so `.using(true)` reads the way it is written.
pub fn as_predicate(call: &'static str, value: Option<&Value>) -> Result<SqlExpr, EngineError> {
    match value {
        Some(Value::Bool(b)) => Ok(SqlExpr::leaf(if *b { "true" } else { "false" })),
        Some(Value::Native(native)) => match native.as_any().downcast_ref::<SqlExpr>() {
            Some(expr) => Ok(expr.clone()),
            None => Err(EngineError::Arguments(format!(
                "{} expects a predicate, got {}",
                call,
                native.type_name()
            ))),
        },
        Some(other) => Err(EngineError::Arguments(format!(
            "{} expects a predicate, got {}",
            call,
            other.type_name()
        ))),
        None => Err(EngineError::Arguments(format!(
            "{} expects a predicate",
            call
        ))),
    }
}
