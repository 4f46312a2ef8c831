//! Printers: plain/colored text and markdown (termimad).

use owo_colors::OwoColorize;
use termimad::MadSkin;

use crate::execution::ExecutionResult;

pub struct TextPrinter {
    pub color: bool,
}

impl TextPrinter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn sql(&self, sql: &str) {
        if self.color {
            println!("{}", sql.green());
        } else {
            println!("{sql}");
        }
    }

    pub fn failure(&self, message: &str) {
        if self.color {
            eprintln!("{}", message.red());
        } else {
            eprintln!("{message}");
        }
    }

    /// Print the result on the conventional stream and return the exit code.
    pub fn result(&self, result: &ExecutionResult) -> i32 {
        match result {
            ExecutionResult::Success { sql } => {
                self.sql(sql);
                0
            }
            ExecutionResult::Failure { message } => {
                self.failure(message);
                1
            }
        }
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default() }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }
}
