use std::path::Path;
use clap::Parser;

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::error::{Result, UniqError};

#[derive(Parser, Debug, Clone)]
#[command(name = "uniqseq_rs", version, about = "Remove redundant sequences from a FASTQ file.")]
pub struct Cli {
    /// Input FASTQ file (.fastq or .fq)
    #[arg(short='i', long="input")]
    pub input: String,
    /// Output FASTQ file with unique sequences (.gz for gzip)
    #[arg(short='o', long="output")]
    pub output: String,

    // Threading
    /// Number of threads to use
    #[arg(short='t', long="threads", default_value_t=1)]
    pub threads: usize,

    // Performance tuning
    #[arg(long="chunk_size", default_value_t=DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
    /// Capacity of the chunk and result queues (0 = 2 x threads)
    #[arg(long="queue_depth", default_value_t=0)]
    pub queue_depth: usize,
    #[arg(short='z', long="compression", default_value_t=4)]
    pub compression: u32,

    // Reporting
    #[arg(short='j', long="json")]
    pub json: Option<String>,
    #[arg(long="html")]
    pub html: Option<String>,
    #[arg(short='R', long="report_title", default_value = "uniqseq report")]
    pub report_title: String,
}

/// Pipeline tuning derived from validated flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub num_workers: usize,
    pub chunk_size: usize,
    pub queue_depth: usize,
}

impl PipelineOptions {
    pub fn new(num_workers: usize, chunk_size: usize) -> Result<Self> {
        if num_workers == 0 {
            return Err(UniqError::invalid("threads", "must be >= 1"));
        }
        if chunk_size == 0 {
            return Err(UniqError::invalid("chunk_size", "must be >= 1"));
        }
        Ok(Self { num_workers, chunk_size, queue_depth: num_workers * 2 })
    }

    /// Chunks allowed between the reader and the merger at once.
    pub fn window(&self) -> usize {
        self.queue_depth + self.num_workers
    }

    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        if queue_depth > 0 {
            self.queue_depth = queue_depth;
        }
        self
    }
}

fn has_fastq_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("fastq") || e.eq_ignore_ascii_case("fq"))
        .unwrap_or(false)
}

impl Cli {
    /// Checks every flag before any file is touched.
    pub fn validate(&self) -> Result<PipelineOptions> {
        if !has_fastq_extension(&self.input) {
            return Err(UniqError::invalid("input", "The input file must have a .fastq or .fq extension."));
        }
        if self.output.is_empty() {
            return Err(UniqError::invalid("output", "No output file specified."));
        }
        if self.compression > 9 {
            return Err(UniqError::invalid("compression", format!("{} is not in 0..=9", self.compression)));
        }
        Ok(PipelineOptions::new(self.threads, self.chunk_size)?.with_queue_depth(self.queue_depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("uniqseq_rs").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["-i", "reads.fq", "-o", "out/uniq.fq"]);
        assert_eq!(cli.threads, 1);
        assert_eq!(cli.chunk_size, 10_000);
        let opts = cli.validate().unwrap();
        assert_eq!(opts, PipelineOptions { num_workers: 1, chunk_size: 10_000, queue_depth: 2 });
        assert_eq!(opts.window(), 3);
    }

    #[test]
    fn test_long_flags() {
        let cli = parse(&["--input", "a.FASTQ", "--output", "b.fq", "--threads", "4", "--queue_depth", "16"]);
        let opts = cli.validate().unwrap();
        assert_eq!(opts.num_workers, 4);
        assert_eq!(opts.queue_depth, 16);
    }

    #[test]
    fn test_missing_required_flags() {
        assert!(Cli::try_parse_from(["uniqseq_rs", "-i", "a.fq"]).is_err());
        assert!(Cli::try_parse_from(["uniqseq_rs", "-o", "a.fq"]).is_err());
    }

    #[test]
    fn test_rejects_bad_extension() {
        for input in ["reads.fasta", "reads.fq.gz", "reads", "fastq"] {
            let err = parse(&["-i", input, "-o", "o.fq"]).validate().unwrap_err();
            assert!(format!("{err}").contains(".fastq or .fq"), "{input}");
        }
    }

    #[test]
    fn test_rejects_zero_threads_and_chunk_size() {
        let err = parse(&["-i", "a.fq", "-o", "o.fq", "-t", "0"]).validate().unwrap_err();
        assert!(matches!(err, UniqError::InvalidParameter { ref parameter, .. } if parameter == "threads"));
        let err = parse(&["-i", "a.fq", "-o", "o.fq", "--chunk_size", "0"]).validate().unwrap_err();
        assert!(matches!(err, UniqError::InvalidParameter { ref parameter, .. } if parameter == "chunk_size"));
    }

    #[test]
    fn test_rejects_negative_threads_at_parse() {
        assert!(Cli::try_parse_from(["uniqseq_rs", "-i", "a.fq", "-o", "o.fq", "-t", "-1"]).is_err());
    }

    #[test]
    fn test_rejects_compression_level() {
        assert!(parse(&["-i", "a.fq", "-o", "o.fq.gz", "-z", "10"]).validate().is_err());
    }
}
