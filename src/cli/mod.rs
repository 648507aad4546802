//! CLI module: command definitions, output formatting, and prompting.

mod commands;
mod output;
mod prompt;

pub use commands::{Cli, Commands};
pub use output::{format_record_table, SortOrder};
pub use prompt::TerminalPrompt;
