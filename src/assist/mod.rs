//! Editor augmentation: ambient declarations, relaxed diagnostics, and
//! the completion index.
//!
//! Everything here is additive capability for an editing surface; the
//! executor behaves identically whether or not any of it ran.

pub mod snapshot;

pub use snapshot::TypeSnapshot;

use crate::bindings::Bindings;

/// Name of the virtual document holding the engine's declarations.
pub const ENGINE_DOC: &str = "policy-engine";
/// Name of the synthesized per-session globals document.
pub const GLOBALS_DOC: &str = "playground-globals";

/// A named document installed into the editing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDoc {
    pub name: String,
    pub text: String,
}

/// Diagnostic reporting level for the snippet buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostics {
    /// Strict stand-alone-module reporting.
    Full,
    /// No live reporting. Snippets end in a top-level `return`, which
    /// the strict profile flags as an error.
    Off,
}

/// Baseline syntax the surface needs to tokenize snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageProfile {
    pub keywords: &'static [&'static str],
    pub line_comment: &'static str,
    pub string_quotes: &'static [char],
}

impl LanguageProfile {
    pub const fn baseline() -> LanguageProfile {
        LanguageProfile {
            keywords: &["let", "const", "return", "throw", "true", "false", "null"],
            line_comment: "//",
            string_quotes: &['\'', '"'],
        }
    }
}

/// The editing surface the bridge drives. The terminal editor implements
/// this; one-shot command paths never construct one.
///
/// Implementations key virtual documents by name: installing a document
/// whose name is already present replaces it.
pub trait EditorSurface {
    fn install_doc(&mut self, doc: VirtualDoc);
    fn set_diagnostics(&mut self, mode: Diagnostics);
    fn set_language(&mut self, profile: LanguageProfile);
}

/// Configure `surface` for import-free snippets against the registry.
///
/// Installs the engine declarations and a synthesized globals document,
/// turns live diagnostics off for the snippet buffer, and sets the
/// baseline language profile. Because documents are keyed by name, the
/// call is idempotent.
pub fn configure(surface: &mut dyn EditorSurface, snapshot: &TypeSnapshot, bindings: &Bindings) {
    surface.install_doc(VirtualDoc {
        name: ENGINE_DOC.to_string(),
        text: snapshot.render_declarations(),
    });
    surface.install_doc(VirtualDoc {
        name: GLOBALS_DOC.to_string(),
        text: render_globals(snapshot, bindings),
    });
    surface.set_diagnostics(Diagnostics::Off);
    surface.set_language(LanguageProfile::baseline());
}

/// One `declare` line per registry name, in registry order. Bindings with
/// no declaration in the snapshot degrade to untyped entries.
fn render_globals(snapshot: &TypeSnapshot, bindings: &Bindings) -> String {
    let mut out = String::new();
    for name in bindings.names() {
        match snapshot.find_export(name) {
            Some(export) if !export.type_name.is_empty() => {
                if !export.doc.is_empty() {
                    out.push_str("// ");
                    out.push_str(&export.doc);
                    out.push('\n');
                }
                out.push_str("declare ");
                out.push_str(name);
                out.push_str(": ");
                out.push_str(&export.type_name);
                out.push('\n');
            }
            _ => {
                out.push_str("declare ");
                out.push_str(name);
                out.push('\n');
            }
        }
    }
    out
}

/// A completion hint for one ambient global.
#[derive(Debug, Clone)]
pub struct GlobalHint {
    pub name: String,
    pub type_name: String,
    pub doc: String,
}

/// A completion hint for one member of a declared type.
#[derive(Debug, Clone)]
pub struct MemberHint {
    pub name: String,
    pub signature: String,
    pub doc: String,
}

/// Completion data derived from the snapshot plus the registry.
#[derive(Debug, Clone, Default)]
pub struct AssistIndex {
    globals: Vec<GlobalHint>,
    types: Vec<(String, Vec<MemberHint>)>,
}

impl AssistIndex {
    pub fn build(snapshot: &TypeSnapshot, bindings: &Bindings) -> AssistIndex {
        let mut index = AssistIndex::default();
        for name in bindings.names() {
            let (type_name, doc) = match snapshot.find_export(name) {
                Some(export) => (export.type_name.clone(), export.doc.clone()),
                None => (String::new(), String::new()),
            };
            index.globals.push(GlobalHint {
                name: name.to_string(),
                type_name,
                doc,
            });
        }
        for decl in &snapshot.types {
            let members = decl
                .members
                .iter()
                .map(|member| MemberHint {
                    name: member.name.clone(),
                    signature: if member.signature.is_empty() {
                        member.name.clone()
                    } else {
                        member.signature.clone()
                    },
                    doc: member.doc.clone(),
                })
                .collect();
            index.install_type(decl.name.clone(), members);
        }
        index
    }

    /// Installing a type again replaces the earlier entry.
    fn install_type(&mut self, name: String, members: Vec<MemberHint>) {
        match self.types.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = members,
            None => self.types.push((name, members)),
        }
    }

    /// Globals whose names start with `prefix`, in registry order.
    pub fn complete_global(&self, prefix: &str) -> Vec<&GlobalHint> {
        self.globals
            .iter()
            .filter(|hint| hint.name.starts_with(prefix))
            .collect()
    }

    /// Members of one declared type whose names start with `prefix`.
    pub fn complete_member(&self, type_name: &str, prefix: &str) -> Vec<&MemberHint> {
        self.types
            .iter()
            .find(|(name, _)| name == type_name)
            .map(|(_, members)| {
                members
                    .iter()
                    .filter(|member| member.name.starts_with(prefix))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Members of every known type, deduplicated by name. Used when the
    /// receiver's type cannot be read off the snippet text.
    pub fn complete_any_member(&self, prefix: &str) -> Vec<&MemberHint> {
        let mut seen: Vec<&str> = Vec::new();
        let mut out = Vec::new();
        for (_, members) in &self.types {
            for member in members {
                if member.name.starts_with(prefix) && !seen.contains(&member.name.as_str()) {
                    seen.push(&member.name);
                    out.push(member);
                }
            }
        }
        out
    }

    /// Declared type of an ambient global, when the snapshot knows one.
    pub fn global_type(&self, name: &str) -> Option<&str> {
        self.globals
            .iter()
            .find(|hint| hint.name == name)
            .map(|hint| hint.type_name.as_str())
            .filter(|type_name| !type_name.is_empty())
    }
}
