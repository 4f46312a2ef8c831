use std::fs::File;
use std::io::{self, Read};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use tracing_subscriber::EnvFilter;

use rlspad::{catalog, cli::Cli, config::Config, handlers};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    let cfg = Config::load();
    init_tracing(&cfg)?;

    // Color only when requested and the output is a terminal.
    let stdout_is_tty = io::stdout().is_terminal();
    let color = !args.no_color && cfg.color_output() && stdout_is_tty;
    let plain = args.no_color || !stdout_is_tty;

    if args.list_examples {
        handlers::examples::list(plain);
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(name) = &args.show_example {
        handlers::examples::show(name, plain)?;
        return Ok(ExitCode::SUCCESS);
    }

    // Resolve the script source: --eval, --example, a file, then piped
    // stdin. An interactive stdin with no source opens the playground.
    let stdin_is_tty = io::stdin().is_terminal();
    let source = if let Some(code) = &args.eval {
        Some(code.clone())
    } else if let Some(name) = &args.example {
        let example = catalog::find(name)
            .with_context(|| format!("no example named `{name}`; try --list-examples"))?;
        Some(example.code.to_string())
    } else if let Some(path) = &args.script {
        Some(std::fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?)
    } else if !stdin_is_tty {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        if buf.trim().is_empty() {
            None
        } else {
            Some(buf)
        }
    } else {
        None
    };

    match source {
        Some(source) if args.check => Ok(exit_code(handlers::run::check(&source, color))),
        Some(source) if args.playground => {
            handlers::playground::run(Some(source), &cfg).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(source) => Ok(exit_code(handlers::run::run(&source, args.json, color)?)),
        None if args.check => bail!("--check needs a script, --eval, --example, or piped input"),
        None => {
            handlers::playground::run(None, &cfg).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code.clamp(0, u8::MAX as i32) as u8)
}

/// Route tracing through RLSPAD_LOG; LOG_FILE in the config redirects
/// output away from stderr so the playground screen stays clean.
fn init_tracing(cfg: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_env("RLSPAD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    match cfg.log_file() {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}
