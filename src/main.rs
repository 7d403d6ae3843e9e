//! calabash-dist CLI
//!
//! Entry point for the `calabash-dist` command-line tool. Each subcommand
//! runs one packaging pipeline end to end and exits 0 on success, or with
//! the failing subprocess's exit status (1 when none applies) on failure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use calabash_dist::{Layout, Pipeline, PipelineError, SystemRunner};

#[derive(Parser)]
#[command(name = "calabash-dist")]
#[command(about = "Package calabash libraries into distributable artifacts", version)]
struct Cli {
    /// Repository root the layout is resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Path to layout overrides (default: <root>/calabash-dist.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble calabash.xcframework and publish it
    VerifyFramework,

    /// Combine the Frank plugin libs into a fat library and publish it
    VerifyFrank,

    /// Verify device and simulator dylibs and publish both
    VerifyDylibs,

    /// Verify the simulator dylib and publish it alone
    VerifySimDylib,
}

fn main() {
    let cli = Cli::parse();

    let layout = match Layout::load(&cli.root, cli.config.as_deref()) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("FAIL: {}", e);
            process::exit(1);
        }
    };

    let runner = SystemRunner::new();
    let pipeline = Pipeline::new(layout, &runner);

    let result = match cli.command {
        Commands::VerifyFramework => pipeline.framework(),
        Commands::VerifyFrank => pipeline.frank(),
        Commands::VerifyDylibs => pipeline.dylibs(),
        Commands::VerifySimDylib => pipeline.sim_dylib(),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            report(&e);
            process::exit(e.exit_code());
        }
    }
}

fn report(error: &PipelineError) {
    eprintln!("FAIL: {}", error);

    // Walk the source chain so the tool-level cause is visible too.
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("FAIL: caused by: {}", cause);
        source = cause.source();
    }
}
