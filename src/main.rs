use std::{
    io::{self, BufRead, Write},
    process::ExitCode,
    time::Duration,
};

use clap::{ArgAction, Parser};
use log::LevelFilter;
use primepal::{Limit, Result, SearchBuilder, SearchConfig, SearchOutcome};

#[derive(Parser, Debug)]
#[command(name = "primepal")]
#[command(about = "Finds the first N numbers that are both prime and palindromic")]
#[command(version)]
struct Cli {
    /// How many numbers to find (1 to 50). Prompted for on stdin if omitted
    // Validated by `Limit`, not clap, so that every bad N gets the same message.
    #[arg(allow_negative_numbers = true)]
    count: Option<String>,

    /// Number of worker threads testing candidates
    #[arg(short, long, default_value_t = SearchConfig::DEFAULT_WORKERS)]
    workers: usize,

    /// Give up after this many milliseconds and report what was found so far
    #[arg(long, value_name = "MS")]
    deadline_ms: Option<u64>,

    /// Log more (repeatable); RUST_LOG overrides this
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let limit = match &cli.count {
        Some(n) => n.parse()?,
        None => prompt_limit(&mut io::stdin().lock(), &mut io::stdout())?,
    };

    let outcome = SearchBuilder::from_config(config(cli)).run(limit)?;

    print!("{}", report(limit, &outcome));
    Ok(())
}

fn config(cli: &Cli) -> SearchConfig {
    SearchConfig {
        workers: cli.workers,
        deadline: cli.deadline_ms.map(Duration::from_millis),
        ..SearchConfig::default()
    }
}

/// Asks for N on `output` and reads it from `input`.
fn prompt_limit(input: &mut impl BufRead, output: &mut impl Write) -> Result<Limit> {
    write!(output, "Enter N ({} <= N <= {}): ", Limit::MIN, Limit::MAX)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    line.parse()
}

/// Formats the two-line report printed on success.
fn report(limit: Limit, outcome: &SearchOutcome) -> String {
    let found = outcome.values.len();
    let heading = if found == limit.get() {
        format!("First {found} prime palindromic numbers")
    } else {
        log::warn!(
            "search stopped ({:?}) after finding {found} of {limit}",
            outcome.completion
        );
        format!("Only {found} of {limit} prime palindromic numbers found")
    };
    format!("{heading}: {:?}\nSum = {}\n", outcome.values, outcome.sum)
}
