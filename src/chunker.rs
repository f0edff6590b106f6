use crate::error::{Result, UniqError};
use crate::fastq::FastqRecord;
use crate::threading::{Chunk, Indexed};

pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Groups consecutive records into chunks of `chunk_size`, stamping each
/// record with its stream position. Chunk ids and positions are assigned in
/// input order. The first source error is passed through and ends iteration.
pub struct Chunker<I> {
    source: I,
    chunk_size: usize,
    next_id: u64,
    total: u64,
    done: bool,
}

impl<I> Chunker<I>
where
    I: Iterator<Item = Result<FastqRecord>>,
{
    pub fn new(source: I, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(UniqError::invalid("chunk_size", "must be >= 1"));
        }
        Ok(Self { source, chunk_size, next_id: 0, total: 0, done: false })
    }

    /// Records pulled from the source so far.
    pub fn total_records(&self) -> u64 {
        self.total
    }
}

impl<I> Iterator for Chunker<I>
where
    I: Iterator<Item = Result<FastqRecord>>,
{
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done { return None; }

        let mut data = Vec::with_capacity(self.chunk_size);
        while data.len() < self.chunk_size {
            match self.source.next() {
                Some(Ok(rec)) => {
                    data.push(Indexed { pos: self.total, rec });
                    self.total += 1;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if data.is_empty() { return None; }
        let id = self.next_id;
        self.next_id += 1;
        Some(Ok(Chunk { id, data }))
    }
}
