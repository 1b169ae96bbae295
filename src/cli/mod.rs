//! CLI module - argument parsing, interactive prompts and the inspect command

mod args;
pub mod inspect;
mod prompts;

pub use args::{infer_table_kind, Cli, Commands};
pub use prompts::*;
