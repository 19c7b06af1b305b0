//! Sheetcast - publish/subscribe spreadsheets from the command line

mod config;
mod console;
mod error;
mod logging;

use anyhow::Context;
use config::Config;
use console::Console;
use error::CliError;
use sheetcast_core::sync::{MemoryDirectory, SyncService};
use sheetcast_core::Sheet;
use sheetcast_engine::engine::ERROR_VALUE;
use std::env;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

fn print_usage() {
    eprintln!("Usage: sheetcast [OPTIONS]");
    eprintln!();
    eprintln!("Without -c, reads console commands from stdin (or --script).");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <FORMULA>   Evaluate one formula and print the result");
    eprintln!("  -s, --script <FILE>       Run console commands from a file");
    eprintln!("  --config <FILE>           Use this config file instead of the default");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {}              Log filter (e.g. debug)", logging::LOG_ENV);
}

#[derive(Debug, Default)]
struct Args {
    command: Option<String>,
    script: Option<PathBuf>,
    config: Option<PathBuf>,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<Args, CliError> {
    let mut parsed = Args::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => parsed.help = true,
            flag @ ("-c" | "--command" | "-s" | "--script" | "--config") => {
                i += 1;
                let Some(value) = args.get(i) else {
                    return Err(CliError::MissingValue(flag.to_string()));
                };
                match flag {
                    "-c" | "--command" => parsed.command = Some(value.clone()),
                    "-s" | "--script" => parsed.script = Some(PathBuf::from(value)),
                    _ => parsed.config = Some(PathBuf::from(value)),
                }
            }
            arg if arg.starts_with('-') => return Err(CliError::UnknownOption(arg.to_string())),
            arg => return Err(CliError::UnexpectedArgument(arg.to_string())),
        }
        i += 1;
    }

    Ok(parsed)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    if args.help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = Config::load(args.config.as_deref())?;
    logging::init(&config.log_level);
    tracing::debug!(?config, "configuration loaded");

    if let Some(formula) = args.command {
        let sheet = Sheet::with_size("command", config.sheet_size());
        let value = sheet.evaluate(&formula);
        println!("{}", value);
        return Ok(if value == ERROR_VALUE {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let service = SyncService::new(Arc::new(MemoryDirectory::new()), config.sheet_size());
    let mut console = Console::new(service, &config.user, config.sheet_size(), io::stdout());
    match args.script {
        Some(path) => {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("cannot open script {}", path.display()))?;
            console.run(BufReader::new(file))?;
        }
        None => console.run(io::stdin().lock())?,
    }
    Ok(ExitCode::SUCCESS)
}
