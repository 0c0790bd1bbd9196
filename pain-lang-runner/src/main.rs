mod logger;
mod repl;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Script to run. Starts an interactive prompt when omitted.
    path: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
    /// Carry on with the next top-level statement after an evaluation error.
    #[arg(short, long)]
    keep_going: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logger::init(cli.log_level.into()) {
        eprintln!("could not set up logging: {}", err);
    }

    let result = match cli.path {
        None => repl::start().map_err(|err| err.to_string()),
        Some(path) => runner::execute_file(&path, cli.keep_going).map_err(|err| err.to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}
