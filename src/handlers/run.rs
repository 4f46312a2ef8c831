//! One-shot execution: run a script from a file, stdin, or the command line.

use anyhow::Result;

use crate::{engine, execution, printer::TextPrinter, script};

/// Execute `source` against the standard capability registry and print the
/// outcome. Returns the process exit code.
pub fn run(source: &str, json: bool, color: bool) -> Result<i32> {
    let bindings = engine::bindings();
    let result = execution::execute(source, &bindings);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(if result.is_success() { 0 } else { 1 });
    }
    Ok(TextPrinter::new(color).result(&result))
}

/// Parse without executing. Quiet when the source is clean.
pub fn check(source: &str, color: bool) -> i32 {
    match script::parse(source) {
        Ok(_) => 0,
        Err(err) => {
            TextPrinter::new(color).failure(&err.message());
            1
        }
    }
}
