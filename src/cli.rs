use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "rlspad", about = "Playground for Postgres row security policies", version)]
#[command(group(ArgGroup::new("source").args(["script", "eval", "example"]).multiple(false)))]
#[command(group(ArgGroup::new("listing").args(["list_examples", "show_example"]).multiple(false)))]
pub struct Cli {
    /// Path to a policy script to run.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<String>,

    /// Run the given code instead of a file.
    #[arg(short = 'e', long)]
    pub eval: Option<String>,

    /// Run a bundled example by name.
    #[arg(long, value_name = "NAME")]
    pub example: Option<String>,

    /// List the bundled examples.
    #[arg(short = 'l', long = "list-examples", visible_alias = "le")]
    pub list_examples: bool,

    /// Print one bundled example's source.
    #[arg(long = "show-example", value_name = "NAME")]
    pub show_example: Option<String>,

    /// Emit the run result as tagged JSON.
    #[arg(long)]
    pub json: bool,

    /// Parse only; report the first problem without running.
    #[arg(long)]
    pub check: bool,

    /// Disable colored output.
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Open the interactive playground (the default on a terminal).
    #[arg(short = 'p', long)]
    pub playground: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
