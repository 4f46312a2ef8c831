//! Built-in example scripts.

/// One ready-to-run script. Loading it replaces the session source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Example {
    pub name: &'static str,
    pub title: &'static str,
    pub blurb: &'static str,
    pub code: &'static str,
}

static EXAMPLES: &[Example] = &[
    Example {
        name: "owner-only",
        title: "Owner-only access",
        blurb: "Every command on a row is reserved for the row's owner.",
        code: "\
// Only the row owner can see or change it.
return policy('docs owner access')
  .on('docs')
  .for('all')
  .to('authenticated')
  .using(col('owner_id').eq(auth.uid()))
  .toSQL();",
    },
    Example {
        name: "tenant-isolation",
        title: "Tenant isolation by claim",
        blurb: "Rows are fenced to the tenant carried in the caller's JWT.",
        code: "\
// Rows are visible only inside the caller's tenant.
let tenant = auth.claim('tenant_id');
return policy('invoices tenant isolation')
  .on('invoices')
  .for('all')
  .to('authenticated')
  .using(col('tenant_id').eq(tenant))
  .toSQL();",
    },
    Example {
        name: "membership-subquery",
        title: "Membership via subquery",
        blurb: "A document is readable by everyone on its owning team.",
        code: "\
// Share docs with everyone on the owning team.
let member = from('team_members')
  .select('team_id')
  .where(col('user_id').eq(auth.uid()));
return policy('docs team read')
  .on('docs')
  .for('select')
  .using(col('team_id').in(member))
  .toSQL();",
    },
    Example {
        name: "insert-check",
        title: "Insert with check",
        blurb: "Inserts validate the new row instead of filtering old ones.",
        code: "\
// New rows must belong to the caller.
return policy('docs insert own')
  .on('docs')
  .for('insert')
  .to('authenticated')
  .withCheck(col('owner_id').eq(auth.uid()))
  .toSQL();",
    },
    Example {
        name: "role-gated-delete",
        title: "Role-gated delete",
        blurb: "Destructive commands check the role claim in the JWT.",
        code: "\
// Deletes are reserved for admins.
return policy('docs admin delete')
  .on('docs')
  .for('delete')
  .using(hasRole('admin'))
  .toSQL();",
    },
    Example {
        name: "public-read",
        title: "Public read",
        blurb: "Published rows are readable without filtering by user.",
        code: "\
// Anyone may read published rows.
return policy('posts public read')
  .on('posts')
  .for('select')
  .using(col('published').eq(true))
  .toSQL();",
    },
    Example {
        name: "composed-predicates",
        title: "Composed predicates",
        blurb: "Predicates chain with and/or/anyOf into one using clause.",
        code: "\
// Editors and admins see drafts; authors always see their own.
let staff = anyOf(hasRole('editor'), hasRole('admin'));
let mine = col('author_id').eq(auth.uid());
return policy('articles draft access')
  .on('articles')
  .for('select')
  .using(staff.and(col('status').eq('draft')).or(mine))
  .toSQL();",
    },
    Example {
        name: "template-quickstart",
        title: "Template quickstart",
        blurb: "Templates bundle the common patterns; adjust, then render.",
        code: "\
// Start from a template, tighten it, render it.
return templates.ownerOnly('notes', 'owner_id')
  .as('restrictive')
  .toSQL();",
    },
];

/// All examples, in presentation order.
pub fn all() -> &'static [Example] {
    EXAMPLES
}

/// Case-sensitive lookup by name.
pub fn find(name: &str) -> Option<&'static Example> {
    EXAMPLES.iter().find(|example| example.name == name)
}

/// The example a fresh playground opens with.
pub fn default_example() -> &'static Example {
    &EXAMPLES[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;
    use crate::execution::{execute, ExecutionResult};

    #[test]
    fn names_are_unique() {
        for (i, a) in EXAMPLES.iter().enumerate() {
            for b in &EXAMPLES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn every_example_executes_to_success() {
        let bindings = engine::bindings();
        for example in all() {
            match execute(example.code, &bindings) {
                ExecutionResult::Success { sql } => {
                    assert!(
                        sql.starts_with("create policy"),
                        "{}: unexpected SQL {:?}",
                        example.name,
                        sql
                    );
                }
                ExecutionResult::Failure { message } => {
                    panic!("{} failed: {}", example.name, message);
                }
            }
        }
    }

    #[test]
    fn lookup_is_case_sensitive_and_exact() {
        assert!(find("owner-only").is_some());
        assert!(find("Owner-Only").is_none());
        assert!(find("owner").is_none());
    }

    #[test]
    fn default_is_the_first_entry() {
        assert_eq!(default_example().name, EXAMPLES[0].name);
        assert_eq!(default_example().name, "owner-only");
    }

    #[test]
    fn presentation_fields_are_filled_in() {
        for example in all() {
            assert!(!example.title.is_empty(), "{}", example.name);
            assert!(!example.blurb.is_empty(), "{}", example.name);
            assert!(example.code.ends_with(".toSQL();"), "{}", example.name);
        }
    }
}
