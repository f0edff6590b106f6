use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Duration;
use log::info;
use serde::Serialize;

use crate::error::{Result, UniqError};

/// Per-chunk counters, summed across chunks by the merger.
#[derive(Debug, Default, Serialize, Clone, PartialEq, Eq)]
pub struct Report {
    pub chunks: u64,
    pub total_reads: u64,
    /// Reads surviving the chunk-local filter.
    pub locally_unique: u64,
    /// Reads surviving the global filter.
    pub unique: u64,
}

impl Report {
    pub fn merge(&mut self, other: &Report) {
        self.chunks += other.chunks;
        self.total_reads += other.total_reads;
        self.locally_unique += other.locally_unique;
        self.unique += other.unique;
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RunStats {
    pub total_input: u64,
    pub total_unique: u64,
    pub percent_unique: f64,
    pub chunks: u64,
    pub local_duplicates: u64,
    pub cross_chunk_duplicates: u64,
    pub elapsed_secs: f64,
}

pub fn percent_unique(unique: u64, input: u64) -> f64 {
    if input == 0 { 0.0 } else { unique as f64 / input as f64 * 100.0 }
}

impl RunStats {
    /// `total_input` is the count seen by the chunker; `report` is the merged
    /// per-chunk report.
    pub fn new(total_input: u64, report: &Report, elapsed: Duration) -> Self {
        Self {
            total_input,
            total_unique: report.unique,
            percent_unique: percent_unique(report.unique, total_input),
            chunks: report.chunks,
            local_duplicates: report.total_reads - report.locally_unique,
            cross_chunk_duplicates: report.locally_unique - report.unique,
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Unique sequences stats:\n\
             Total input sequences: {}\n\
             Total unique sequences: {}\n\
             Percent unique sequences: {:.2}%\n\
             Total time taken: {:.2} seconds",
            self.total_input, self.total_unique, self.percent_unique, self.elapsed_secs
        )
    }

    pub fn print_summary(&self) {
        println!("\n{}", self.summary());
        info!(
            "Processed {} reads in {} chunks: {} unique, {} duplicates within chunks, {} across chunks",
            self.total_input, self.chunks, self.total_unique, self.local_duplicates, self.cross_chunk_duplicates
        );
    }

    pub fn write_json(&self, path: &str) -> Result<()> {
        let f = File::create(path).map_err(|e| UniqError::io(path, e))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self).map_err(|e| UniqError::io(path, e.into()))?;
        w.flush().map_err(|e| UniqError::io(path, e))
    }
}
