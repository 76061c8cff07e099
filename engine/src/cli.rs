//! CLI interface module

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sage", version, about = "Sage question-answering engine")]
pub struct Cli {
    /// Path to an alternate configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print responses as JSON (answer plus diagnostics)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ask a single question and print the answer
    Ask {
        /// The question to answer
        question: String,

        /// Continue an existing session
        #[arg(long)]
        session: Option<String>,
    },

    /// Interactive question loop on stdin
    Repl,
}
