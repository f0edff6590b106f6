mod chunker;
mod config;
mod dedup;
mod error;
mod fastq;
mod html_report;
mod pipeline;
mod progress;
mod stats;
mod threading;

use std::fs;
use std::path::Path;
use std::process;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use crate::config::Cli;
use crate::error::{Result, UniqError};
use crate::fastq::{Reader, Writer};
use crate::html_report::write_html_report;
use crate::pipeline::run_pipeline;

fn ensure_output_dir(output: &str) -> Result<()> {
    match Path::new(output).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("Creating output directory {}", dir.display());
            fs::create_dir_all(dir).map_err(|e| UniqError::io(&dir.display().to_string(), e))
        }
        _ => Ok(()),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let opts = cli.validate()?;
    let cpus = num_cpus::get();
    if opts.num_workers > cpus {
        warn!("Requested {} threads but only {} CPUs are available", opts.num_workers, cpus);
    }

    let reader = Reader::open(&cli.input)?;
    ensure_output_dir(&cli.output)?;
    let mut writer = Writer::create(&cli.output, cli.compression)?;

    info!("Removing redundant sequences from {} with {} thread(s)", cli.input, opts.num_workers);
    let stats = run_pipeline(reader, &mut writer, &opts)?;
    info!("Redundant sequences removed. Output saved to {}", cli.output);

    stats.print_summary();
    if let Some(path) = &cli.json {
        stats.write_json(path)?;
    }
    if let Some(path) = &cli.html {
        write_html_report(path, &stats, &cli.report_title)?;
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help / --version go to stdout and exit 0
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli) {
        error!("{e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
