use clap::Parser;
use log::{LevelFilter, info};
use minijs::{Interpreter, InterpreterConfig};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

/// Runs a script written in a small subset of JavaScript.
#[derive(Parser, Debug)]
#[command(name = "minijs", version)]
struct Cli {
    /// Script to run. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Print the syntax tree instead of evaluating it.
    #[arg(long)]
    ast: bool,

    /// Diagnostics level (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "info", value_parser = parse_level)]
    log_level: LevelFilter,

    /// Nested function calls allowed before evaluation fails.
    #[arg(long, default_value_t = InterpreterConfig::default().max_call_depth)]
    max_call_depth: usize,

    /// Leave the prelude functions (`print`) unbound.
    #[arg(long)]
    no_prelude: bool,
}

fn parse_level(level: &str) -> Result<LevelFilter, String> {
    level
        .parse()
        .map_err(|_| format!("unknown log level: {}", level))
}

fn read_source(input: Option<&PathBuf>) -> io::Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = read_source(cli.input.as_ref())?;
    let interpreter = Interpreter::with_config(InterpreterConfig {
        max_call_depth: cli.max_call_depth,
        enable_prelude: !cli.no_prelude,
    });

    let start = std::time::Instant::now();
    let ast = interpreter.parse(&source).map_err(minijs::Error::from)?;
    info!(target: "cli", "Parsed in {:?}", start.elapsed());

    if cli.ast {
        print!("{}", minijs::print(&ast));
        return Ok(());
    }

    let start = std::time::Instant::now();
    let value = interpreter.evaluate(&ast).map_err(minijs::Error::from)?;
    info!(target: "cli", "Evaluated in {:?}", start.elapsed());

    println!("{}", value);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = minijs::logger::init(cli.log_level) {
        eprintln!("Failed to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
