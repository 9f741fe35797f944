//! Software-managed MMU - Main Entry Point
//!
//! Usage: mmu [OPTIONS] [ADDRESS_SPACE_BITS] [PAGE_BYTES]
//!
//! Without `--input`, reads hexadecimal virtual addresses from stdin until
//! `-1` and prints one translation per address. With `--input`, translates a
//! whole file and writes one physical address (or -1) per line.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::{Level, info, warn};

use soft_mmu::config::PartialConfig;
use soft_mmu::io::{Query, format_results, parse_query, read_virtual_addresses, write_results};
use soft_mmu::{Fault, Mmu, MmuConfig, Translation};

const PROMPT: &str = "Input a virtual address of hexadecimal value without \"0x\" (-1 to exit): ";

#[derive(Parser, Debug)]
#[command(version, about = "Software-managed MMU: single-level page-table address translation")]
struct Args {
    /// Virtual address space size in bits (1-32)
    address_space_bits: Option<u32>,

    /// Page size in bytes (power of two, 1-4096)
    page_bytes: Option<u32>,

    /// TOML file with `address_space_bits` and `page_bytes`; positional values override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Translate every address in this file instead of reading stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write batch results here instead of stdout
    #[arg(short, long, requires = "input")]
    output: Option<PathBuf>,

    /// Print detailed translation information
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(io::stderr)
            .without_time()
            .finish(),
    )
    .expect("install tracing subscriber");
}

fn load_config(args: &Args) -> anyhow::Result<MmuConfig> {
    let file = match &args.config {
        Some(path) => PartialConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PartialConfig::default(),
    };
    let cli = PartialConfig {
        address_space_bits: args.address_space_bits,
        page_bytes: args.page_bytes,
    };
    Ok(file.merge(cli).resolve()?)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let mmu = Mmu::new(config).context("Failed to build page table")?;
    info!(config = %mmu.config(), mapped = mmu.table().mapped_count(), "page table ready");

    match &args.input {
        Some(input) => run_batch(&mmu, args, input),
        None => {
            println!("Welcome to Software-managed MMU");
            let stdin = io::stdin();
            let stdout = io::stdout();
            run_interactive(&mmu, stdin.lock(), stdout.lock())
        }
    }
}

/// Prompt, translate, repeat until the sentinel or end of input.
fn run_interactive<R: BufRead, W: Write>(mmu: &Mmu, mut input: R, mut out: W) -> anyhow::Result<()> {
    let mut line = String::new();
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        for token in line.split_whitespace() {
            match parse_query(token) {
                Ok(Query::Exit) => return Ok(()),
                Ok(Query::Address(va)) => writeln!(out, "{}", mmu.query(va))?,
                Err(e) => {
                    warn!(input = token, "rejected query");
                    writeln!(out, "Invalid input: {}", e)?;
                }
            }
        }
    }
    Ok(())
}

fn run_batch(mmu: &Mmu, args: &Args, input: &Path) -> anyhow::Result<()> {
    let vas = read_virtual_addresses(input)?;
    let results = mmu.translate_batch(&vas);

    if args.verbose {
        for result in &results {
            eprintln!("{} [{}]", result, result.virtual_address);
        }
        print_summary(&results);
    }

    match &args.output {
        Some(path) => write_results(path, &results)?,
        None => print!("{}", format_results(&results)),
    }
    Ok(())
}

fn print_summary(results: &[Translation]) {
    let count = |fault: Fault| results.iter().filter(|r| r.outcome == Err(fault)).count();
    let successes = results.iter().filter(|r| r.outcome.is_ok()).count();

    eprintln!();
    eprintln!("=== Summary ===");
    eprintln!("Successful translations: {}", successes);
    eprintln!("Segmentation faults:     {}", count(Fault::NotValid));
    eprintln!("Protection faults:       {}", count(Fault::NotAccessible));
    eprintln!("Out of range:            {}", count(Fault::OutOfRange));
}
