use clap::{Parser as CliParser, Subcommand};
use std::path::PathBuf;

#[derive(CliParser)]
#[command(author, version, about, long_about=None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log what the lexer and the checker do
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand)]
pub enum Action {
    /// Print every lexing of a prefix
    Lex {
        /// Specify the configuration of the lexer
        #[arg(id = "config")]
        config_path: PathBuf,
        /// The prefix to lex. Read from stdin if omitted
        source: Option<PathBuf>,
        /// The prefix is the whole input
        #[arg(long = "final")]
        is_final: bool,
    },
    /// Tell whether a prefix can be completed into an accepted input
    Check {
        /// Specify the configuration of the lexer and the grammar
        #[arg(id = "config")]
        config_path: PathBuf,
        /// The prefix to check. Read from stdin if omitted
        source: Option<PathBuf>,
        /// The prefix is the whole input
        #[arg(long = "final")]
        is_final: bool,
    },
}
