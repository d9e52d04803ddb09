//! Bibvault CLI - Generate a vault of markdown reference notes from BibTeX.

use bibvault::cli::{Cli, Commands};
use bibvault::commands::{self, Output};
use bibvault::config::ConfigFormat;
use bibvault::logging;
use clap::Parser;
use std::process;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    logging::init(cli.verbose);

    if let Err(e) = run_command(cli.command, cli.verbose, human) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!(
                r#"{{"error": {}}}"#,
                serde_json::Value::String(e.to_string())
            );
        }
        process::exit(1);
    }
}

fn run_command(command: Commands, verbose: bool, human: bool) -> Result<(), bibvault::Error> {
    match command {
        Commands::Generate { config, options } => {
            let overrides = options.to_overrides(verbose);
            let result = commands::generate(config.as_deref(), &overrides)?;
            output(&result, human);
        }
        Commands::PrintDefaultConfig { format } => {
            let format = ConfigFormat::parse(&format).ok_or_else(|| {
                bibvault::Error::InvalidInput(format!("unknown config format: {}", format))
            })?;
            let result = commands::print_default_config(format)?;
            output(&result, human);
        }
        Commands::Frontmatter {
            dir,
            bibliography,
            filters,
        } => {
            let result = commands::update_frontmatter(&dir, bibliography, filters)?;
            output(&result, human);
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
