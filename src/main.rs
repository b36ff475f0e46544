//! SMS Transaction Engine CLI
//!
//! Reads notification messages from a file or stdin and writes the
//! recognized transactions to stdout. With `--input-format eml` the input is
//! an `.eml` file, a directory of them, or one raw email on stdin.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- messages.txt --format csv > transactions.csv
//! cargo run -- mail/ --input-format eml
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use clap::{Parser, ValueEnum};
use sms_txn_engine::{
    collect_eml_files, BatchReport, Engine, EngineConfig, MessageSplit, OnAmountMissing, Result,
};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use std::process;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    /// SMS text, split by --split
    Text,
    /// Raw email messages
    Eml,
}

#[derive(Debug, Parser)]
#[command(name = "sms-txn-engine", version, about = "Extract transactions from bank SMS messages")]
struct Cli {
    /// Input file, or a directory of .eml files; reads stdin when omitted
    input: Option<PathBuf>,

    /// Kind of input
    #[arg(long, value_enum, default_value_t = InputFormat::Text)]
    input_format: InputFormat,

    /// How messages are separated in the input (blank-line or line)
    #[arg(long, default_value_t = MessageSplit::BlankLine)]
    split: MessageSplit,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Recognized message without an amount: zero-record or no-record
    #[arg(long, default_value_t = OnAmountMissing::ZeroRecord)]
    on_amount_missing: OnAmountMissing,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::default().on_amount_missing(cli.on_amount_missing);
    let engine = Engine::with_config(config);

    let report = match cli.input_format {
        InputFormat::Text => read_text(&engine, &cli)?,
        InputFormat::Eml => read_eml(&engine, &cli)?,
    };

    let stdout = io::stdout();
    let handle = stdout.lock();
    match cli.format {
        OutputFormat::Json => report.write_json(handle)?,
        OutputFormat::Csv => report.write_csv(handle)?,
    }

    Ok(())
}

fn read_text(engine: &Engine, cli: &Cli) -> Result<BatchReport> {
    match &cli.input {
        Some(path) => {
            let file = File::open(path)?;
            engine.parse_stream(BufReader::new(file), cli.split)
        }
        None => engine.parse_stream(io::stdin().lock(), cli.split),
    }
}

fn read_eml(engine: &Engine, cli: &Cli) -> Result<BatchReport> {
    match &cli.input {
        Some(path) => {
            let emails = collect_eml_files(path)?
                .iter()
                .map(fs::read)
                .collect::<io::Result<Vec<_>>>()?;
            engine.parse_emails(&emails)
        }
        None => {
            let mut raw = Vec::new();
            io::stdin().lock().read_to_end(&mut raw)?;
            engine.parse_emails([raw])
        }
    }
}
