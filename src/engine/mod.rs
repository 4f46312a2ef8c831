//! The policy engine: builder capabilities and SQL rendering.
//!
//! Everything here sits behind the script runtime's `NativeObject` seam;
//! the executor only ever sees opaque values and their raised errors.

pub mod context;
pub mod expr;
pub mod policy;
pub mod query;
pub mod sql;
pub mod templates;

use thiserror::Error;

use crate::bindings::Bindings;
use crate::script::{NativeFn, ScriptError, Value};

use context::Auth;
use expr::{as_predicate, ColRef, SqlExpr};
use policy::PolicyBuilder;
use query::QueryBuilder;
use templates::Templates;

/// Raised by builder calls; scripts observe these texts as failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid {kind} name `{name}`")]
    InvalidName { kind: &'static str, name: String },
    #[error("{0}")]
    Arguments(String),
    #[error("unknown command `{0}` (expected all, select, insert, update, or delete)")]
    UnknownCommand(String),
    #[error("unknown policy kind `{0}` (expected permissive or restrictive)")]
    UnknownKind(String),
    #[error("policy `{0}` has no target table; call .on('table') first")]
    MissingTable(String),
    #[error("policy `{0}` filters nothing; add .using(...) or .withCheck(...)")]
    MissingPredicate(String),
    #[error("an insert policy cannot take .using(...); write .withCheck(...) instead")]
    UsingOnInsert,
    #[error("a {0} policy cannot take .withCheck(...); write .using(...) instead")]
    CheckNotAllowed(&'static str),
}

impl From<EngineError> for ScriptError {
    fn from(err: EngineError) -> Self {
        ScriptError::runtime(err.to_string())
    }
}

/// Argument at `index` as a string, with a call-shaped error otherwise.
pub(crate) fn str_arg<'a>(
    call: &'static str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a str, EngineError> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s),
        Some(other) => Err(EngineError::Arguments(format!(
            "{} expects a string, got {}",
            call,
            other.type_name()
        ))),
        None => Err(EngineError::Arguments(format!(
            "{} expects a string argument",
            call
        ))),
    }
}

fn policy_fn(args: &[Value]) -> Result<Value, ScriptError> {
    let name = str_arg("policy(name)", args, 0)?;
    Ok(Value::native(PolicyBuilder::new(name)?))
}

fn col_fn(args: &[Value]) -> Result<Value, ScriptError> {
    let name = str_arg("col(name)", args, 0)?;
    Ok(Value::native(ColRef::new(name)?))
}

fn from_fn(args: &[Value]) -> Result<Value, ScriptError> {
    let table = str_arg("from(table)", args, 0)?;
    Ok(Value::native(QueryBuilder::new(table)?))
}

fn has_role_fn(args: &[Value]) -> Result<Value, ScriptError> {
    let role = str_arg("hasRole(role)", args, 0)?;
    let expr = SqlExpr::leaf(format!(
        "{} = {}",
        context::claim_expr("role").sql(),
        sql::quote_literal(role)
    ));
    Ok(Value::native(expr))
}

/// Predicates from a variadic call; one level of array nesting flattens,
/// so `allOf([a, b])` and `allOf(a, b)` read the same.
fn collect_predicates(call: &'static str, args: &[Value]) -> Result<Vec<SqlExpr>, EngineError> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Value::Array(items) => {
                for item in items {
                    out.push(as_predicate(call, Some(item))?);
                }
            }
            other => out.push(as_predicate(call, Some(other))?),
        }
    }
    Ok(out)
}

fn all_of_fn(args: &[Value]) -> Result<Value, ScriptError> {
    let combined = collect_predicates("allOf(exprs)", args)?
        .into_iter()
        .reduce(|acc, next| acc.and(&next))
        .ok_or_else(|| {
            EngineError::Arguments("allOf(exprs) needs at least one predicate".to_string())
        })?;
    Ok(Value::native(combined))
}

fn any_of_fn(args: &[Value]) -> Result<Value, ScriptError> {
    let combined = collect_predicates("anyOf(exprs)", args)?
        .into_iter()
        .reduce(|acc, next| acc.or(&next))
        .ok_or_else(|| {
            EngineError::Arguments("anyOf(exprs) needs at least one predicate".to_string())
        })?;
    Ok(Value::native(combined))
}

/// The capability set every session registers, in its fixed order.
pub fn bindings() -> Bindings {
    Bindings::builder()
        .bind("policy", NativeFn::value("policy", policy_fn))
        .bind("col", NativeFn::value("col", col_fn))
        .bind("auth", Value::native(Auth))
        .bind("from", NativeFn::value("from", from_fn))
        .bind("hasRole", NativeFn::value("hasRole", has_role_fn))
        .bind("allOf", NativeFn::value("allOf", all_of_fn))
        .bind("anyOf", NativeFn::value("anyOf", any_of_fn))
        .bind("templates", Value::native(Templates))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{run_program, Completion};

    #[test]
    fn capability_order_is_fixed() {
        let registry = bindings();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec!["policy", "col", "auth", "from", "hasRole", "allOf", "anyOf", "templates"]
        );
    }

    fn run_sql(source: &str) -> String {
        match run_program(source, &bindings()).unwrap() {
            Completion::Returned(Value::Str(sql)) => sql,
            other => panic!("expected returned SQL, got {:?}", other),
        }
    }

    #[test]
    fn a_full_chain_renders_through_the_script_surface() {
        let sql = run_sql(
            "return policy('owner can read')\n  .on('docs')\n  .for('select')\n  .to('authenticated')\n  .using(col('owner_id').eq(auth.uid()))\n  .toSQL();",
        );
        assert_eq!(
            sql,
            "create policy \"owner can read\" on docs\n  for select\n  to authenticated\n  using (owner_id = auth.uid());"
        );
    }

    #[test]
    fn has_role_reads_the_role_claim() {
        let sql = run_sql(
            "return policy('admin delete').on('docs').for('delete').using(hasRole('admin')).toSQL();",
        );
        assert!(sql.contains("using ((auth.jwt() ->> 'role') = 'admin')"));
    }

    #[test]
    fn all_of_accepts_arrays_and_variadic_forms() {
        let a = run_sql(
            "return policy('x').on('t').using(allOf(col('a').eq(1), col('b').eq(2))).toSQL();",
        );
        let b = run_sql(
            "return policy('x').on('t').using(allOf([col('a').eq(1), col('b').eq(2)])).toSQL();",
        );
        assert_eq!(a, b);
        assert!(a.contains("using (a = 1 and b = 2)"));
    }

    #[test]
    fn any_of_wraps_inside_larger_composites() {
        let sql = run_sql(
            "let who = anyOf(hasRole('admin'), hasRole('editor'));\nreturn policy('x').on('t').using(who.and(col('live').eq(true))).toSQL();",
        );
        assert!(sql.contains(
            "using (((auth.jwt() ->> 'role') = 'admin' or (auth.jwt() ->> 'role') = 'editor') and live = true)"
        ));
    }

    #[test]
    fn empty_combinators_are_rejected() {
        let err = run_program("return allOf();", &bindings()).unwrap_err();
        assert!(err.message().contains("at least one predicate"));
    }

    #[test]
    fn builder_errors_reach_scripts_as_runtime_raises() {
        let err = run_program("return col('bad name');", &bindings()).unwrap_err();
        assert_eq!(err.message(), "invalid column name `bad name`");
    }
}
