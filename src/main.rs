use anyhow::Context;
use clap::Parser;
use cli::{Action, Cli};
use itertools::Itertools;
use sprout::config::Config;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

fn read_source(source: Option<&Path>) -> anyhow::Result<String> {
    match source {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("could not read stdin")?;
            Ok(text)
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let default = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.action {
        Action::Lex {
            config_path,
            source,
            is_final,
        } => {
            let lexer = Config::from_path(&config_path)?.lexer()?;
            let text = read_source(source.as_deref())?;
            let lexings = lexer.lex_with(&text, is_final);
            if lexings.is_empty() {
                eprintln!("no lexing");
            }
            for lexing in lexings
                .iter()
                .map(|lexing| lexing.iter().join(" "))
                .sorted()
            {
                println!("[{}]", lexing);
            }
            Ok(ExitCode::SUCCESS)
        }
        Action::Check {
            config_path,
            source,
            is_final,
        } => {
            let checker = Config::from_path(&config_path)?.checker()?;
            let text = read_source(source.as_deref())?;
            if checker.realizable(&text, is_final)? {
                println!("realizable");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("unrealizable");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
