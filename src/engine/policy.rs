//! The `CREATE POLICY` builder scripts drive.

use std::any::Any;

use crate::script::{NativeObject, ScriptError, Value};

use super::expr::{as_predicate, SqlExpr};
use super::sql;
use super::{str_arg, EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    All,
    Select,
    Insert,
    Update,
    Delete,
}

impl Command {
    fn parse(text: &str) -> Result<Command, EngineError> {
        match text.to_ascii_lowercase().as_str() {
            "all" => Ok(Command::All),
            "select" => Ok(Command::Select),
            "insert" => Ok(Command::Insert),
            "update" => Ok(Command::Update),
            "delete" => Ok(Command::Delete),
            _ => Err(EngineError::UnknownCommand(text.to_string())),
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            Command::All => "all",
            Command::Select => "select",
            Command::Insert => "insert",
            Command::Update => "update",
            Command::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Permissive,
    Restrictive,
}

impl Kind {
    fn parse(text: &str) -> Result<Kind, EngineError> {
        match text.to_ascii_lowercase().as_str() {
            "permissive" => Ok(Kind::Permissive),
            "restrictive" => Ok(Kind::Restrictive),
            _ => Err(EngineError::UnknownKind(text.to_string())),
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            Kind::Permissive => "permissive",
            Kind::Restrictive => "restrictive",
        }
    }
}

/// Accumulates one policy's clauses; `to_sql` validates and renders.
///
/// Methods return updated copies, so scripts build policies as a single
/// chain ending in `.toSQL()`.
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    name: String,
    table: Option<String>,
    command: Option<Command>,
    kind: Option<Kind>,
    roles: Vec<String>,
    using: Option<SqlExpr>,
    check: Option<SqlExpr>,
}

impl PolicyBuilder {
    pub fn new(name: &str) -> Result<Self, EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::InvalidName {
                kind: "policy",
                name: name.to_string(),
            });
        }
        Ok(PolicyBuilder {
            name: name.to_string(),
            table: None,
            command: None,
            kind: None,
            roles: Vec::new(),
            using: None,
            check: None,
        })
    }

    pub fn on(&self, table: &str) -> Result<Self, EngineError> {
        let mut next = self.clone();
        next.table = Some(sql::ident("table", table)?);
        Ok(next)
    }

    pub fn command(&self, text: &str) -> Result<Self, EngineError> {
        let mut next = self.clone();
        next.command = Some(Command::parse(text)?);
        Ok(next)
    }

    pub fn kind(&self, text: &str) -> Result<Self, EngineError> {
        let mut next = self.clone();
        next.kind = Some(Kind::parse(text)?);
        Ok(next)
    }

    pub fn role(&self, role: &str) -> Result<Self, EngineError> {
        let mut next = self.clone();
        next.roles.push(sql::ident("role", role)?);
        Ok(next)
    }

    /// Replaces any earlier `using` clause.
    pub fn using(&self, predicate: SqlExpr) -> Self {
        let mut next = self.clone();
        next.using = Some(predicate);
        next
    }

    /// Replaces any earlier `with check` clause.
    pub fn with_check(&self, predicate: SqlExpr) -> Self {
        let mut next = self.clone();
        next.check = Some(predicate);
        next
    }

    /// Validate the accumulated clauses and render the statement.
    pub fn to_sql(&self) -> Result<String, EngineError> {
        let table = self
            .table
            .as_deref()
            .ok_or_else(|| EngineError::MissingTable(self.name.clone()))?;
        if self.using.is_none() && self.check.is_none() {
            return Err(EngineError::MissingPredicate(self.name.clone()));
        }
        match self.command {
            Some(Command::Insert) if self.using.is_some() => {
                return Err(EngineError::UsingOnInsert);
            }
            Some(cmd @ (Command::Select | Command::Delete)) if self.check.is_some() => {
                return Err(EngineError::CheckNotAllowed(cmd.keyword()));
            }
            _ => {}
        }

        let mut out = format!("create policy {} on {}", sql::quote_ident(&self.name), table);
        if let Some(kind) = self.kind {
            out.push_str("\n  as ");
            out.push_str(kind.keyword());
        }
        if let Some(command) = self.command {
            out.push_str("\n  for ");
            out.push_str(command.keyword());
        }
        if !self.roles.is_empty() {
            out.push_str("\n  to ");
            out.push_str(&self.roles.join(", "));
        }
        if let Some(using) = &self.using {
            out.push_str("\n  using (");
            out.push_str(using.sql());
            out.push(')');
        }
        if let Some(check) = &self.check {
            out.push_str("\n  with check (");
            out.push_str(check.sql());
            out.push(')');
        }
        out.push(';');
        Ok(out)
    }
}

impl NativeObject for PolicyBuilder {
    fn type_name(&self) -> &'static str {
        "Policy"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value, ScriptError> {
        match name {
            "on" => Ok(Value::native(self.on(str_arg("on(table)", args, 0)?)?)),
            "for" | "command" => Ok(Value::native(
                self.command(str_arg("for(command)", args, 0)?)?,
            )),
            "as" => Ok(Value::native(self.kind(str_arg("as(kind)", args, 0)?)?)),
            "to" => {
                if args.is_empty() {
                    return Err(EngineError::Arguments(
                        "to(roles) expects at least one role name".to_string(),
                    )
                    .into());
                }
                let mut next = self.clone();
                for arg in args {
                    match arg {
                        Value::Str(role) => next = next.role(role)?,
                        other => {
                            return Err(EngineError::Arguments(format!(
                                "to(roles) expects role name strings, got {}",
                                other.type_name()
                            ))
                            .into())
                        }
                    }
                }
                Ok(Value::native(next))
            }
            "using" => {
                let predicate = as_predicate("using(expr)", args.first())?;
                Ok(Value::native(self.using(predicate)))
            }
            "withCheck" => {
                let predicate = as_predicate("withCheck(expr)", args.first())?;
                Ok(Value::native(self.with_check(predicate)))
            }
            "toSQL" => Ok(Value::Str(self.to_sql()?)),
            _ => Err(ScriptError::runtime(format!(
                "{} has no method `{}`",
                self.type_name(),
                name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_predicate() -> SqlExpr {
        SqlExpr::leaf("owner_id = auth.uid()")
    }

    #[test]
    fn renders_the_full_clause_order() {
        let sql = PolicyBuilder::new("owner can read")
            .unwrap()
            .on("docs")
            .unwrap()
            .kind("permissive")
            .unwrap()
            .command("select")
            .unwrap()
            .role("authenticated")
            .unwrap()
            .using(owner_predicate())
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "create policy \"owner can read\" on docs\n  as permissive\n  for select\n  to authenticated\n  using (owner_id = auth.uid());"
        );
    }

    #[test]
    fn unset_clauses_are_omitted() {
        let sql = PolicyBuilder::new("minimal")
            .unwrap()
            .on("docs")
            .unwrap()
            .using(SqlExpr::leaf("true"))
            .to_sql()
            .unwrap();
        assert_eq!(sql, "create policy \"minimal\" on docs\n  using (true);");
    }

    #[test]
    fn update_policies_may_carry_both_predicates() {
        let sql = PolicyBuilder::new("upd")
            .unwrap()
            .on("docs")
            .unwrap()
            .command("update")
            .unwrap()
            .using(owner_predicate())
            .with_check(SqlExpr::leaf("owner_id = auth.uid()"))
            .to_sql()
            .unwrap();
        assert!(sql.contains("\n  using (owner_id = auth.uid())"));
        assert!(sql.contains("\n  with check (owner_id = auth.uid());"));
    }

    #[test]
    fn missing_table_is_reported_by_name() {
        let err = PolicyBuilder::new("sel")
            .unwrap()
            .using(owner_predicate())
            .to_sql()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "policy `sel` has no target table; call .on('table') first"
        );
    }

    #[test]
    fn missing_predicate_is_reported_by_name() {
        let err = PolicyBuilder::new("sel")
            .unwrap()
            .on("docs")
            .unwrap()
            .to_sql()
            .unwrap_err();
        assert!(err.to_string().contains("policy `sel` filters nothing"));
    }

    #[test]
    fn insert_rejects_using() {
        let err = PolicyBuilder::new("ins")
            .unwrap()
            .on("docs")
            .unwrap()
            .command("insert")
            .unwrap()
            .using(owner_predicate())
            .to_sql()
            .unwrap_err();
        assert!(err.to_string().contains("withCheck"));
    }

    #[test]
    fn select_rejects_with_check() {
        let err = PolicyBuilder::new("sel")
            .unwrap()
            .on("docs")
            .unwrap()
            .command("select")
            .unwrap()
            .with_check(owner_predicate())
            .to_sql()
            .unwrap_err();
        assert!(err.to_string().contains("select policy"));
    }

    #[test]
    fn unknown_command_lists_the_choices() {
        let err = PolicyBuilder::new("x")
            .unwrap()
            .command("frobnicate")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown command `frobnicate` (expected all, select, insert, update, or delete)"
        );
    }

    #[test]
    fn unknown_kind_lists_the_choices() {
        let err = PolicyBuilder::new("x").unwrap().kind("weird").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown policy kind `weird` (expected permissive or restrictive)"
        );
    }

    #[test]
    fn empty_policy_names_are_rejected() {
        assert!(PolicyBuilder::new("").is_err());
        assert!(PolicyBuilder::new("   ").is_err());
    }

    #[test]
    fn policy_names_are_always_quoted() {
        let sql = PolicyBuilder::new("plain")
            .unwrap()
            .on("docs")
            .unwrap()
            .using(SqlExpr::leaf("true"))
            .to_sql()
            .unwrap();
        assert!(sql.starts_with("create policy \"plain\" on docs"));
    }

    #[test]
    fn script_surface_builds_through_methods() {
        let policy = PolicyBuilder::new("sel").unwrap();
        let value = policy
            .call_method("on", &[Value::Str("docs".into())])
            .unwrap();
        let value = value
            .as_native()
            .unwrap()
            .call_method("using", &[Value::Bool(true)])
            .unwrap();
        let sql = value
            .as_native()
            .unwrap()
            .call_method("toSQL", &[])
            .unwrap();
        assert_eq!(
            sql,
            Value::Str("create policy \"sel\" on docs\n  using (true);".into())
        );
    }

    #[test]
    fn multiple_roles_accumulate_in_order() {
        let sql = PolicyBuilder::new("sel")
            .unwrap()
            .on("docs")
            .unwrap()
            .role("authenticated")
            .unwrap()
            .role("anon")
            .unwrap()
            .using(SqlExpr::leaf("true"))
            .to_sql()
            .unwrap();
        assert!(sql.contains("\n  to authenticated, anon\n"));
    }
}
