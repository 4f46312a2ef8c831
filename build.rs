use std::env;
use std::error::Error;
use std::fs;
use std::path::Path;

use serde_json::{json, Value};

const DECLS_DIR: &str = "decls";

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed={DECLS_DIR}");
    let out_dir = env::var("OUT_DIR")?;
    let bundle = load_bundle();
    fs::write(
        Path::new(&out_dir).join("type_snapshot.json"),
        serde_json::to_vec_pretty(&bundle)?,
    )?;
    Ok(())
}

/// A single `bundle.json` wins; otherwise the fragments merge in filename
/// order. Malformed input is skipped with a warning rather than failing
/// the build.
fn load_bundle() -> Value {
    let dir = Path::new(DECLS_DIR);
    let bundled = dir.join("bundle.json");
    if bundled.exists() {
        return read_fragment(&bundled).unwrap_or_else(stub);
    }
    let mut paths = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect::<Vec<_>>(),
        Err(_) => Vec::new(),
    };
    paths.sort();
    let mut exports = Vec::new();
    let mut types = Vec::new();
    for path in &paths {
        let Some(fragment) = read_fragment(path) else {
            continue;
        };
        if let Some(list) = fragment.get("exports").and_then(Value::as_array) {
            exports.extend(list.iter().cloned());
        }
        if let Some(list) = fragment.get("types").and_then(Value::as_array) {
            types.extend(list.iter().cloned());
        }
    }
    if exports.is_empty() && types.is_empty() {
        return stub();
    }
    json!({ "exports": exports, "types": types })
}

fn read_fragment(path: &Path) -> Option<Value> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            println!("cargo:warning=skipping {}: {err}", path.display());
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            println!("cargo:warning=skipping {}: {err}", path.display());
            None
        }
    }
}

/// Minimal payload for trees with no declaration fragments at all.
fn stub() -> Value {
    json!({
        "exports": [
            {
                "name": "policy",
                "type": "(name: string) => Policy",
                "doc": "Start a row security policy with the given name."
            }
        ],
        "types": []
    })
}
