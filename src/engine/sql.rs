//! Identifier and literal rendering for generated SQL.

use super::EngineError;

/// Accept `[A-Za-z_][A-Za-z0-9_]*` as a table, column, or role name.
pub fn check_name(kind: &'static str, name: &str) -> Result<(), EngineError> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(EngineError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

/// Render a validated name. Lowercase names stay bare; names with an
/// uppercase letter are double-quoted so Postgres preserves their case.
pub fn ident(kind: &'static str, name: &str) -> Result<String, EngineError> {
    check_name(kind, name)?;
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        Ok(quote_ident(name))
    } else {
        Ok(name.to_string())
    }
}

/// Double-quote an arbitrary identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a string literal, doubling embedded quotes.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
