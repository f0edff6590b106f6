use std::any::Any;
use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{Scope, ScopedJoinHandle};
use crossbeam::channel::{bounded, Receiver, Sender};

use crate::error::{Result, UniqError};
use crate::fastq::FastqRecord;
use crate::stats::Report;

/// A record tagged with its 0-based position in the input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexed {
    pub pos: u64,
    pub rec: FastqRecord,
}

pub struct Chunk {
    pub id: u64,
    pub data: Vec<Indexed>,
}

pub struct ChunkResult {
    pub id: u64,
    pub data: Vec<Indexed>,
    pub report: Report,
}

// Helper for ordering ChunkResult in BinaryHeap (MinHeap on chunk id)
pub struct OrderedResult(pub ChunkResult);

impl PartialEq for OrderedResult {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}
impl Eq for OrderedResult {}
impl PartialOrd for OrderedResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OrderedResult {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for MinHeap
        other.0.id.cmp(&self.0.id)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Reader half of the reorder window: one credit per chunk in flight.
pub struct Credits {
    rx: Receiver<()>,
}

/// Merger half of the reorder window.
pub struct CreditReturn {
    tx: Sender<()>,
}

/// Caps the number of chunks between the reader and the merger at `window`.
/// A credit is taken before a chunk is read and handed back once the merger
/// has absorbed it, so queued, running and parked chunks together never
/// exceed the window.
pub fn reorder_window(window: usize) -> (Credits, CreditReturn) {
    let window = window.max(1);
    let (tx, rx) = bounded(window);
    for _ in 0..window {
        // capacity equals the credit count, never blocks
        let _ = tx.send(());
    }
    (Credits { rx }, CreditReturn { tx })
}

impl Credits {
    /// Blocks until a credit is free. Returns false once the merger is gone.
    pub fn acquire(&self) -> bool {
        self.rx.recv().is_ok()
    }
}

impl CreditReturn {
    pub fn release(&self) {
        // the reader may already have finished
        let _ = self.tx.send(());
    }
}

/// Fixed set of worker threads applying one task to every chunk pulled from
/// `chunks`. Results are pushed to `results` in completion order. A task that
/// panics is turned into `UniqError::Worker` for that chunk and the worker
/// stops; downstream is expected to abort on the first error it receives.
pub struct WorkerPool<'scope> {
    handles: Vec<ScopedJoinHandle<'scope, ()>>,
}

impl<'scope> WorkerPool<'scope> {
    pub fn spawn<'env, F>(
        scope: &'scope Scope<'scope, 'env>,
        num_workers: usize,
        chunks: Receiver<Chunk>,
        results: Sender<Result<ChunkResult>>,
        task: F,
    ) -> Self
    where
        F: Fn(Chunk) -> ChunkResult + Send + Sync + 'scope,
    {
        let task = Arc::new(task);
        let mut handles = Vec::with_capacity(num_workers);
        for _ in 0..num_workers.max(1) {
            let rx = chunks.clone();
            let tx = results.clone();
            let task = task.clone();

            handles.push(scope.spawn(move || {
                while let Ok(chunk) = rx.recv() {
                    let id = chunk.id;
                    let out = panic::catch_unwind(AssertUnwindSafe(|| (*task)(chunk)))
                        .map_err(|p| UniqError::Worker { chunk: id, reason: panic_message(p.as_ref()) });
                    let failed = out.is_err();
                    // a closed result channel means the merger already stopped
                    if tx.send(out).is_err() || failed {
                        break;
                    }
                }
            }));
        }
        // `results` drops here so the receiver closes once every worker exits
        Self { handles }
    }

    pub fn join(self) -> Result<()> {
        let mut res = Ok(());
        for h in self.handles {
            if h.join().is_err() && res.is_ok() {
                res = Err(UniqError::Pipeline("worker thread could not be joined".to_string()));
            }
        }
        res
    }
}
