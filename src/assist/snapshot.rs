//! The bundled declaration payload describing the engine's surface.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Payload embedded at build time from the engine's declaration files.
static BUNDLED: &str = include_str!(concat!(env!("OUT_DIR"), "/type_snapshot.json"));

/// Everything the editor can know about the engine: its exported entry
/// points and the shapes behind them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeSnapshot {
    #[serde(default)]
    pub exports: Vec<ExportDecl>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDecl {
    pub name: String,
    /// Rendered type, e.g. `(name: string) => Policy` or a type name.
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default)]
    pub doc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub doc: String,
}

impl TypeSnapshot {
    /// Parse the payload embedded at build time.
    ///
    /// A malformed payload degrades to an empty snapshot with a warning;
    /// assistance is a capability, never a correctness requirement.
    pub fn bundled() -> TypeSnapshot {
        match serde_json::from_str(BUNDLED) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "embedded type snapshot is malformed");
                TypeSnapshot::default()
            }
        }
    }

    pub fn find_export(&self, name: &str) -> Option<&ExportDecl> {
        self.exports.iter().find(|export| export.name == name)
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|decl| decl.name == name)
    }

    /// Render the whole surface as one ambient-declaration document.
    pub fn render_declarations(&self) -> String {
        let mut out = String::new();
        for export in &self.exports {
            if !export.doc.is_empty() {
                out.push_str("// ");
                out.push_str(&export.doc);
                out.push('\n');
            }
            out.push_str("declare ");
            out.push_str(&export.name);
            if !export.type_name.is_empty() {
                out.push_str(": ");
                out.push_str(&export.type_name);
            }
            out.push('\n');
        }
        for decl in &self.types {
            out.push('\n');
            out.push_str("type ");
            out.push_str(&decl.name);
            out.push_str(" {\n");
            for member in &decl.members {
                if !member.doc.is_empty() {
                    out.push_str("  // ");
                    out.push_str(&member.doc);
                    out.push('\n');
                }
                out.push_str("  ");
                if member.signature.is_empty() {
                    out.push_str(&member.name);
                } else {
                    out.push_str(&member.signature);
                }
                out.push('\n');
            }
            out.push_str("}\n");
        }
        out
    }
}
