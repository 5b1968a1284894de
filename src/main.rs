//! Routercheck CLI entry point.

use clap::Parser;
use routercheck::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();
    cli::init_tracing();

    let result = match &cli.command {
        Commands::Analyze(args) => cli::run_analyze(args),
        Commands::Export(args) => cli::run_export(args),
        Commands::Init(args) => cli::run_init(args),
        Commands::Rules(args) => cli::run_rules(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
