//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "phpnar")]
#[command(author, version, about = "Build PHP for a matrix of platforms and package it as NAR archives", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every project command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to Nar.toml (defaults to the nearest one above the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Build platforms whose operating system differs from the host
    #[arg(long, global = true, env = "PHPNAR_CROSS_COMPILE")]
    pub cross_compile: bool,

    /// Build Windows platforms (requires a Windows host)
    #[arg(long, global = true, env = "PHPNAR_CROSS_COMPILE_WINDOWS")]
    pub cross_compile_windows: bool,

    /// Replace the global configure arguments
    #[arg(long, global = true, value_name = "ARGS", allow_hyphen_values = true)]
    pub configure_args: Option<String>,

    /// Root of the PHP SDK binary tools
    #[arg(long, global = true, env = "PHP_SDK_HOME", value_name = "DIR")]
    pub php_sdk_home: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that every selected platform can be built on this host
    Validate,

    /// Copy the Windows SDK and dependency bundles into the build tree
    PrepareDeps,

    /// Copy the PHP sources into each platform directory
    StageSources,

    /// Generate and run the build script of each platform
    Compile(CompileArgs),

    /// Archive the build output of each platform
    Package,

    /// Write nar.properties for the whole matrix
    PublishMetadata,

    /// Run every stage in order
    Build(CompileArgs),

    /// Show the declared platforms and which ones this host builds
    Matrix(MatrixArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct CompileArgs {
    /// Write the build scripts without running them
    #[arg(long)]
    pub scripts_only: bool,
}

#[derive(Args)]
pub struct MatrixArgs {
    /// Print the matrix as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
