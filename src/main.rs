use anyhow::Result;
use clap::Parser;
use csv::{Reader, ReaderBuilder};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

mod cores;
mod errors;
mod header;
mod ledger;
mod models;
mod processor;
mod report;
mod report_writer;
mod traits;

use ledger::{BillTable, Engine};
use processor::{MonthlyAggregator, PeriodAggregator};
use report_writer::{JsonReportWriter, TextReportWriter};

const DEFAULT_HAS_HEADERS: bool = true;

#[derive(Parser, Debug)]
#[command(name = "ecs-bill", version, about = "Pay-as-you-go ECS cost per instance type from a billing export")]
struct Cli {
    /// Path of the billing export
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// Field delimiter of the export
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Emit JSON lines instead of the text report
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

/// The delimiter as a byte, `None` for anything outside ASCII.
fn delimiter_byte(delimiter: char) -> Option<u8> {
    u8::try_from(delimiter).ok().filter(u8::is_ascii)
}

fn csv_reader<R: Read>(input: R, delimiter: u8) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(DEFAULT_HAS_HEADERS)
        .delimiter(delimiter)
        .from_reader(input)
}

fn load(path: &Path, delimiter: u8) -> Result<BillTable> {
    BillTable::from_reader(csv_reader(File::open(path)?, delimiter))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let Some(path) = cli.file else {
        error!("no input file given, pass one with --file");
        return Ok(());
    };
    let Some(delimiter) = delimiter_byte(cli.delimiter) else {
        error!(delimiter = %cli.delimiter, "delimiter must be a single ASCII character");
        return Ok(());
    };

    let table = match load(&path, delimiter) {
        Ok(table) => table,
        Err(err) => {
            error!(path = %path.display(), "failed to read billing export: {err:#}");
            return Ok(());
        }
    };
    info!(path = %path.display(), rows = table.record_count(), "billing export loaded");

    if cli.json {
        Engine::new(
            JsonReportWriter::stdout(),
            table,
            PeriodAggregator::new(),
            MonthlyAggregator::new(),
        )
        .run()
    } else {
        Engine::new(
            TextReportWriter::stdout(),
            table,
            PeriodAggregator::new(),
            MonthlyAggregator::new(),
        )
        .run()
    }
}
