use std::collections::BinaryHeap;
use log::{debug, trace};

use super::UniquenessSet;
use crate::error::{Result, UniqError};
use crate::fastq::RecordSink;
use crate::stats::Report;
use crate::threading::{ChunkResult, CreditReturn, Indexed, OrderedResult};

/// Reduces chunk results into one globally-unique record stream.
///
/// Results may be pushed in any order. They are parked until every earlier
/// chunk has been merged, so the global set always sees occurrences in
/// ascending stream position and the earliest occurrence of a sequence is the
/// one written, whatever order the workers finished in.
///
/// With credits attached, one credit goes back to the reader per absorbed
/// chunk, which bounds how many results can be parked at once.
pub struct Merger {
    next_id: u64,
    pending: BinaryHeap<OrderedResult>,
    seen: UniquenessSet,
    report: Report,
    credits: Option<CreditReturn>,
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

impl Merger {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: BinaryHeap::new(),
            seen: UniquenessSet::new(),
            report: Report::default(),
            credits: None,
        }
    }

    pub fn with_credits(credits: CreditReturn) -> Self {
        Self { credits: Some(credits), ..Self::new() }
    }

    /// Drains `results` (completion order) into `sink` and returns the merged
    /// report. Stops at the first error, which is returned unchanged.
    pub fn run<S, R>(mut self, results: R, sink: &mut S) -> Result<Report>
    where
        S: RecordSink + ?Sized,
        R: IntoIterator<Item = Result<ChunkResult>>,
    {
        for res in results {
            self.push(res?, sink)?;
        }
        let report = self.finish()?;
        sink.finish()?;
        Ok(report)
    }

    pub fn push<S: RecordSink + ?Sized>(&mut self, result: ChunkResult, sink: &mut S) -> Result<()> {
        if result.id < self.next_id {
            return Err(UniqError::Pipeline(format!("chunk {} was merged twice", result.id)));
        }
        self.pending.push(OrderedResult(result));

        while self.pending.peek().is_some_and(|top| top.0.id == self.next_id) {
            if let Some(OrderedResult(r)) = self.pending.pop() {
                self.absorb(r, sink)?;
                if let Some(credits) = &self.credits {
                    credits.release();
                }
            }
            self.next_id += 1;
        }
        Ok(())
    }

    fn absorb<S: RecordSink + ?Sized>(&mut self, result: ChunkResult, sink: &mut S) -> Result<()> {
        let ChunkResult { id, data, mut report } = result;
        let mut unique = 0;
        for Indexed { pos, rec } in data {
            if !self.seen.insert(&rec.seq, pos) {
                let first = self.seen.first_position(&rec.seq).unwrap_or(pos);
                debug_assert!(first < pos, "sequence kept at {first} but reached again at {pos}");
                trace!("Dropping {} at {}: duplicate of record {}", rec.id(), pos, first);
                continue;
            }
            sink.write_record(&rec)?;
            unique += 1;
        }
        report.unique = unique;
        debug!("Merged chunk {}: {} of {} reads are new", id, unique, report.total_reads);
        self.report.merge(&report);
        Ok(())
    }

    /// Results received but still waiting on an earlier chunk.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn finish(self) -> Result<Report> {
        if self.pending() > 0 {
            return Err(UniqError::Pipeline(format!(
                "chunk {} never arrived; {} later chunk(s) were not merged",
                self.next_id,
                self.pending()
            )));
        }
        Ok(self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fastq::FastqRecord;
    use crate::threading::reorder_window;

    fn result(id: u64, recs: &[(u64, &str)]) -> ChunkResult {
        let data: Vec<Indexed> = recs
            .iter()
            .map(|&(pos, s)| Indexed {
                pos,
                rec: FastqRecord::new(format!("@r{pos}"), s.to_string(), "+".into(), "I".repeat(s.len())),
            })
            .collect();
        let n = data.len() as u64;
        ChunkResult { id, data, report: Report { chunks: 1, total_reads: n, locally_unique: n, unique: 0 } }
    }

    fn names(out: &[FastqRecord]) -> Vec<&str> {
        out.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_cross_chunk_duplicate_removed() {
        let mut out: Vec<FastqRecord> = Vec::new();
        let report = Merger::new().run(vec![Ok(result(0, &[(0, "GGGG")])), Ok(result(1, &[(1, "GGGG")]))], &mut out).unwrap();
        assert_eq!(names(&out), vec!["@r0"]);
        assert_eq!(report.unique, 1);
        assert_eq!(report.locally_unique, 2);
    }

    #[test]
    fn test_earliest_wins_regardless_of_completion_order() {
        let mut out: Vec<FastqRecord> = Vec::new();
        let results = vec![
            Ok(result(2, &[(4, "AAAA"), (5, "CCCC")])),
            Ok(result(1, &[(2, "CCCC"), (3, "TTTT")])),
            Ok(result(0, &[(0, "AAAA"), (1, "GGGG")])),
        ];
        let report = Merger::new().run(results, &mut out).unwrap();
        assert_eq!(names(&out), vec!["@r0", "@r1", "@r2", "@r3"]);
        assert_eq!(report.unique, 4);
        assert_eq!(report.chunks, 3);
    }

    #[test]
    fn test_out_of_order_results_are_parked() {
        let mut out: Vec<FastqRecord> = Vec::new();
        let mut merger = Merger::new();
        merger.push(result(1, &[(1, "C")]), &mut out).unwrap();
        assert_eq!(merger.pending(), 1);
        assert!(out.is_empty());
        merger.push(result(0, &[(0, "A")]), &mut out).unwrap();
        assert_eq!(merger.pending(), 0);
        assert_eq!(names(&out), vec!["@r0", "@r1"]);
    }

    #[test]
    fn test_credit_returned_only_when_chunk_absorbed() {
        let (credits, ret) = reorder_window(2);
        assert!(credits.acquire());
        assert!(credits.acquire());
        let mut out: Vec<FastqRecord> = Vec::new();
        let mut merger = Merger::with_credits(ret);

        merger.push(result(1, &[(1, "C")]), &mut out).unwrap();
        assert_eq!(merger.pending(), 1);
        merger.push(result(0, &[(0, "A")]), &mut out).unwrap();
        assert!(credits.acquire());
        assert!(credits.acquire());
        drop(merger);
        assert!(!credits.acquire());
    }

    #[test]
    fn test_missing_chunk_is_an_error() {
        let mut out: Vec<FastqRecord> = Vec::new();
        let err = Merger::new().run(vec![Ok(result(1, &[(5, "A")]))], &mut out).unwrap_err();
        assert!(format!("{err}").contains("chunk 0 never arrived"));
    }

    #[test]
    fn test_duplicate_chunk_id_is_an_error() {
        let mut out: Vec<FastqRecord> = Vec::new();
        let results = vec![Ok(result(0, &[(0, "A")])), Ok(result(0, &[(0, "A")]))];
        assert!(Merger::new().run(results, &mut out).is_err());
    }

    #[test]
    fn test_worker_error_stops_merge() {
        let mut out: Vec<FastqRecord> = Vec::new();
        let results = vec![
            Ok(result(0, &[(0, "A")])),
            Err(UniqError::Worker { chunk: 1, reason: "boom".into() }),
            Ok(result(2, &[(2, "C")])),
        ];
        match Merger::new().run(results, &mut out) {
            Err(UniqError::Worker { chunk, .. }) => assert_eq!(chunk, 1),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(names(&out), vec!["@r0"]);
    }

    #[test]
    fn test_empty_run() {
        let mut out: Vec<FastqRecord> = Vec::new();
        let report = Merger::new().run(Vec::new(), &mut out).unwrap();
        assert_eq!(report, Report::default());
        assert!(out.is_empty());
    }
}
