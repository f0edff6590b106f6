use std::thread;
use std::time::Instant;
use crossbeam::channel::{bounded, Receiver, Sender};
use log::{debug, info};

use crate::chunker::Chunker;
use crate::config::PipelineOptions;
use crate::dedup::{dedup_chunk, Merger};
use crate::error::{Result, UniqError};
use crate::fastq::{FastqRecord, RecordSink};
use crate::progress::ProgressTracker;
use crate::stats::RunStats;
use crate::threading::{reorder_window, Chunk, ChunkResult, Credits, WorkerPool};

const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Pushes chunks into the bounded queue, taking one window credit per chunk
/// before reading it. Returns `Ok(false)` if the workers or the merger went
/// away before the source was exhausted.
fn feed<I>(
    chunker: &mut Chunker<I>,
    tx: &Sender<Chunk>,
    credits: &Credits,
    progress: &mut ProgressTracker,
) -> Result<bool>
where
    I: Iterator<Item = Result<FastqRecord>>,
{
    loop {
        if !credits.acquire() {
            return Ok(false);
        }
        let chunk = match chunker.next() {
            Some(chunk) => chunk?,
            None => return Ok(true),
        };
        progress.record(chunk.data.len() as u64);
        if tx.send(chunk).is_err() {
            return Ok(false);
        }
    }
}

/// Deduplicates `source` into `sink`.
///
/// The reader runs on the calling thread and blocks once `queue_depth` chunks
/// are waiting or `queue_depth + num_workers` chunks are in flight between it
/// and the merger. `num_workers` threads run the chunk filter and a single
/// merger thread owns the global set and the sink. The first error from any
/// stage aborts the run; a reader error takes precedence over downstream
/// errors it caused.
pub fn run_pipeline<I, S>(source: I, sink: &mut S, opts: &PipelineOptions) -> Result<RunStats>
where
    I: Iterator<Item = Result<FastqRecord>>,
    S: RecordSink + Send,
{
    let start = Instant::now();
    let mut chunker = Chunker::new(source, opts.chunk_size)?;
    let mut progress = ProgressTracker::new("Read records").with_interval(PROGRESS_INTERVAL);
    debug!(
        "Starting pipeline: {} workers, chunk size {}, queue depth {}",
        opts.num_workers, opts.chunk_size, opts.queue_depth
    );

    let (read_res, merge_res, pool_res) = thread::scope(|s| {
        let (tx_chunk, rx_chunk): (Sender<Chunk>, Receiver<Chunk>) = bounded(opts.queue_depth);
        let (tx_out, rx_out): (Sender<Result<ChunkResult>>, Receiver<Result<ChunkResult>>) = bounded(opts.queue_depth);

        let (credits, credit_return) = reorder_window(opts.window());

        // 1. Workers
        let pool = WorkerPool::spawn(s, opts.num_workers, rx_chunk, tx_out, dedup_chunk);

        // 2. Merger / writer thread
        let merger = s.spawn(move || Merger::with_credits(credit_return).run(rx_out, sink));

        // 3. Reader (calling thread)
        let read_res = feed(&mut chunker, &tx_chunk, &credits, &mut progress);

        // Close chunk channel to notify workers
        drop(tx_chunk);
        drop(credits);
        let pool_res = pool.join();
        let merge_res = merger
            .join()
            .unwrap_or_else(|_| Err(UniqError::Pipeline("merger thread panicked".to_string())));
        (read_res, merge_res, pool_res)
    });

    let completed = read_res?;
    let report = merge_res?;
    pool_res?;
    if !completed {
        return Err(UniqError::Pipeline("workers stopped before the input was consumed".to_string()));
    }
    progress.log_final();

    let total_input = chunker.total_records();
    if report.total_reads != total_input {
        return Err(UniqError::Pipeline(format!(
            "read {} records but merged {}", total_input, report.total_reads
        )));
    }
    let stats = RunStats::new(total_input, &report, start.elapsed());
    info!("Merged {} chunks into {} unique records", stats.chunks, stats.total_unique);
    Ok(stats)
}
