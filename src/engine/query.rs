//! Single-column subqueries for membership predicates.

use std::any::Any;

use crate::script::{NativeObject, ScriptError, Value};

use super::expr::{as_predicate, SqlExpr};
use super::sql;
use super::{str_arg, EngineError};

/// Builder behind `from(table).select(column).where(expr)`.
///
/// Methods return updated copies; an existing value is never changed by a
/// later call on it.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    column: Option<String>,
    filter: Option<SqlExpr>,
}

impl QueryBuilder {
    pub fn new(table: &str) -> Result<Self, EngineError> {
        Ok(QueryBuilder {
            table: sql::ident("table", table)?,
            column: None,
            filter: None,
        })
    }

    pub fn select(&self, column: &str) -> Result<Self, EngineError> {
        let mut next = self.clone();
        next.column = Some(sql::ident("column", column)?);
        Ok(next)
    }

    /// Successive filters are combined with `and`.
    pub fn filtered(&self, predicate: SqlExpr) -> Self {
        let mut next = self.clone();
        next.filter = Some(match &self.filter {
            Some(existing) => existing.and(&predicate),
            None => predicate,
        });
        next
    }

    /// The subquery text, without surrounding parentheses.
    pub fn render(&self) -> Result<String, EngineError> {
        let column = self.column.as_deref().ok_or_else(|| {
            EngineError::Arguments(
                "a subquery needs .select(column) before it can be used".to_string(),
            )
        })?;
        let mut out = format!("select {} from {}", column, self.table);
        if let Some(filter) = &self.filter {
            out.push_str(" where ");
            out.push_str(filter.sql());
        }
        Ok(out)
    }
}

impl NativeObject for QueryBuilder {
    fn type_name(&self) -> &'static str {
        "Query"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value, ScriptError> {
        match name {
            "select" => Ok(Value::native(
                self.select(str_arg("select(column)", args, 0)?)?,
            )),
            "where" => {
                let predicate = as_predicate("where(expr)", args.first())?;
                Ok(Value::native(self.filtered(predicate)))
            }
            _ => Err(ScriptError::runtime(format!(
                "{} has no method `{}`",
                self.type_name(),
                name
            ))),
        }
    }
}
