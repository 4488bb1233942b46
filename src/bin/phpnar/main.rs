//! phpnar CLI - builds PHP for every platform of a NAR matrix

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use phpnar::NarError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        if let Some(err) = e.downcast_ref::<NarError>() {
            if let NarError::ExternalCommandFailed { stderr, .. } = err {
                if !stderr.trim().is_empty() {
                    eprintln!("\n{}", stderr.trim_end());
                }
            }
            if let Some(help) = err.help() {
                eprintln!("{}", help);
            }
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("phpnar=debug")
    } else {
        EnvFilter::new("phpnar=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let global = cli.global;
    match cli.command {
        Commands::Validate => commands::validate::execute(&global),
        Commands::PrepareDeps => commands::prepare_deps::execute(&global),
        Commands::StageSources => commands::stage_sources::execute(&global),
        Commands::Compile(args) => commands::compile::execute(&global, args),
        Commands::Package => commands::package::execute(&global),
        Commands::PublishMetadata => commands::publish::execute(&global),
        Commands::Build(args) => commands::build::execute(&global, args),
        Commands::Matrix(args) => commands::matrix::execute(&global, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
