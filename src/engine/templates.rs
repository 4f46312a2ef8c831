//! Pre-configured policy starters.

use std::any::Any;

use crate::script::{NativeObject, ScriptError, Value};

use super::context::{claim_expr, uid_expr};
use super::expr::{ColRef, SqlExpr};
use super::policy::PolicyBuilder;
use super::{str_arg, EngineError};

/// The `templates` capability object. Each method returns a fully formed
/// policy builder the script can adjust further before rendering it.
#[derive(Debug, Clone, Copy)]
pub struct Templates;

impl Templates {
    fn owner_only(table: &str, column: &str) -> Result<PolicyBuilder, EngineError> {
        let owner = ColRef::new(column)?;
        Ok(PolicyBuilder::new(&format!("{} owner only", table))?
            .on(table)?
            .command("all")?
            .role("authenticated")?
            .using(owner.equals(&uid_expr())))
    }

    fn tenant_isolation(table: &str, column: &str, claim: &str) -> Result<PolicyBuilder, EngineError> {
        let tenant = ColRef::new(column)?;
        Ok(PolicyBuilder::new(&format!("{} tenant isolation", table))?
            .on(table)?
            .command("all")?
            .role("authenticated")?
            .using(tenant.equals(&claim_expr(claim))))
    }

    fn public_read(table: &str) -> Result<PolicyBuilder, EngineError> {
        Ok(PolicyBuilder::new(&format!("{} public read", table))?
            .on(table)?
            .command("select")?
            .using(SqlExpr::leaf("true")))
    }
}

impl NativeObject for Templates {
    fn type_name(&self) -> &'static str {
        "Templates"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value, ScriptError> {
        match name {
            "ownerOnly" => {
                let call = "ownerOnly(table, column)";
                let table = str_arg(call, args, 0)?;
                let column = str_arg(call, args, 1)?;
                Ok(Value::native(Self::owner_only(table, column)?))
            }
            "tenantIsolation" => {
                let call = "tenantIsolation(table, column, claim)";
                let table = str_arg(call, args, 0)?;
                let column = str_arg(call, args, 1)?;
                let claim = str_arg(call, args, 2)?;
                Ok(Value::native(Self::tenant_isolation(table, column, claim)?))
            }
            "publicRead" => {
                let table = str_arg("publicRead(table)", args, 0)?;
                Ok(Value::native(Self::public_read(table)?))
            }
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

    fn rendered(value: Value) -> String {
        match value {
            Value::Native(native) => native
                .as_any()
                .downcast_ref::<PolicyBuilder>()
                .expect("expected a Policy")
                .to_sql()
                .unwrap(),
            other => panic!("expected a native value, got {:?}", other),
        }
    }

    #[test]
    fn owner_only_scopes_every_command_to_the_owner() {
        let value = Templates
            .call_method(
                "ownerOnly",
                &[Value::Str("docs".into()), Value::Str("owner_id".into())],
            )
            .unwrap();
        assert_eq!(
            rendered(value),
            "create policy \"docs owner only\" on docs\n  for all\n  to authenticated\n  using (owner_id = auth.uid());"
        );
    }

    #[test]
    fn tenant_isolation_matches_column_against_claim() {
        let value = Templates
            .call_method(
                "tenantIsolation",
                &[
                    Value::Str("invoices".into()),
                    Value::Str("tenant_id".into()),
                    Value::Str("tenant_id".into()),
                ],
            )
            .unwrap();
        assert_eq!(
            rendered(value),
            "create policy \"invoices tenant isolation\" on invoices\n  for all\n  to authenticated\n  using (tenant_id = (auth.jwt() ->> 'tenant_id'));"
        );
    }

    #[test]
    fn public_read_is_select_only() {
        let value = Templates
            .call_method("publicRead", &[Value::Str("posts".into())])
            .unwrap();
        assert_eq!(
            rendered(value),
            "create policy \"posts public read\" on posts\n  for select\n  using (true);"
        );
    }

    #[test]
    fn template_output_is_still_a_builder() {
        let value = Templates
            .call_method(
                "ownerOnly",
                &[Value::Str("docs".into()), Value::Str("owner_id".into())],
            )
            .unwrap();
        let adjusted = value
            .as_native()
            .unwrap()
            .call_method("as", &[Value::Str("restrictive".into())])
            .unwrap();
        let sql = adjusted
            .as_native()
            .unwrap()
            .call_method("toSQL", &[])
            .unwrap();
        match sql {
            Value::Str(text) => assert!(text.contains("\n  as restrictive\n")),
            other => panic!("expected SQL text, got {:?}", other),
        }
    }

    #[test]
    fn missing_arguments_name_the_call_shape() {
        let err = Templates
            .call_method("ownerOnly", &[Value::Str("docs".into())])
            .unwrap_err();
        assert!(err.message().contains("ownerOnly(table, column)"));
    }
}
