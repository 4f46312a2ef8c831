//! Playground handler: hands the terminal over to the interactive editor.

use anyhow::Result;

use crate::{config::Config, tui};

pub async fn run(initial_source: Option<String>, config: &Config) -> Result<()> {
    tui::run_playground(initial_source, config).await
}
