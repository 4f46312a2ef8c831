//! Example catalog commands: listing and display.

use anyhow::{bail, Result};

use crate::{catalog, printer::MarkdownPrinter};

/// Print the catalog. Plain mode emits one `name<TAB>title` line per
/// example for easy scripting.
pub fn list(plain: bool) {
    if plain {
        for example in catalog::all() {
            println!("{}\t{}", example.name, example.title);
        }
        return;
    }
    let mut text = String::from("# Bundled examples\n\n");
    for example in catalog::all() {
        text.push_str(&format!("* **{}**: {}\n", example.name, example.title));
    }
    MarkdownPrinter::default().print(&text);
}

/// Print one example. Plain mode emits the raw source so the output can
/// be piped straight back into `rlspad`.
pub fn show(name: &str, plain: bool) -> Result<()> {
    let Some(example) = catalog::find(name) else {
        bail!("no example named `{name}`; try --list-examples");
    };
    if plain {
        println!("{}", example.code.trim_end());
        return Ok(());
    }
    let mut text = format!("# {}\n\n{}\n\n```\n", example.title, example.blurb);
    text.push_str(example.code.trim_end());
    text.push_str("\n```\n");
    MarkdownPrinter::default().print(&text);
    Ok(())
}
