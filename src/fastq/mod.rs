use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::fs::File;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{Result, UniqError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    pub name: String,
    pub seq: String,
    pub plus: String,
    pub qual: String,
}

impl FastqRecord {
    pub fn new(name: String, seq: String, plus: String, qual: String) -> Self {
        Self { name, seq, plus, qual }
    }

    /// Read id: the header up to the first whitespace, without the leading '@'.
    pub fn id(&self) -> &str {
        let header = self.name.strip_prefix('@').unwrap_or(&self.name);
        header.split_whitespace().next().unwrap_or("")
    }
}

fn trim_eol(line: &mut String) {
    if line.ends_with('\n') { line.pop(); }
    if line.ends_with('\r') { line.pop(); }
}

/// Lazy FASTQ record source. Yields records until EOF or the first malformed
/// record, after which it is exhausted.
pub struct Reader {
    reader: Box<dyn BufRead + Send>,
    path: String,
    line: u64,
    done: bool,
}

impl Reader {
    pub fn open(path: &str) -> Result<Self> {
        let f = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => UniqError::InputNotFound { path: path.to_string() },
            _ => UniqError::InputUnreadable { path: path.to_string(), source: e },
        })?;
        Ok(Self::from_reader(BufReader::new(f), path))
    }

    /// Wraps an already-open buffered reader; `label` names it in errors.
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R, label: &str) -> Self {
        Self { reader: Box::new(reader), path: label.to_string(), line: 0, done: false }
    }

    fn read_line(&mut self, buf: &mut String) -> Result<usize> {
        let n = self.reader.read_line(buf).map_err(|e| UniqError::io(&self.path, e))?;
        if n > 0 {
            self.line += 1;
            trim_eol(buf);
        }
        Ok(n)
    }

    fn malformed(&self, reason: impl Into<String>) -> UniqError {
        UniqError::MalformedRecord { path: self.path.clone(), line: self.line, reason: reason.into() }
    }

    pub fn next_record(&mut self) -> Result<Option<FastqRecord>> {
        let mut name = String::new();
        let mut seq = String::new();
        let mut plus = String::new();
        let mut qual = String::new();

        // tolerate blank lines between records and at end of file
        loop {
            name.clear();
            if self.read_line(&mut name)? == 0 { return Ok(None); }
            if !name.trim().is_empty() { break; }
        }
        if !name.starts_with('@') {
            return Err(self.malformed("header line must start with '@'"));
        }
        if self.read_line(&mut seq)? == 0 { return Err(self.malformed("truncated record: missing sequence line")); }
        if self.read_line(&mut plus)? == 0 { return Err(self.malformed("truncated record: missing '+' line")); }
        if !plus.starts_with('+') {
            return Err(self.malformed("separator line must start with '+'"));
        }
        if self.read_line(&mut qual)? == 0 { return Err(self.malformed("truncated record: missing quality line")); }
        if qual.len() != seq.len() {
            return Err(self.malformed(format!(
                "quality length {} does not match sequence length {}", qual.len(), seq.len()
            )));
        }

        Ok(Some(FastqRecord::new(name, seq, plus, qual)))
    }
}

impl Iterator for Reader {
    type Item = Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done { return None; }
        match self.next_record() {
            Ok(Some(rec)) => Some(Ok(rec)),
            Ok(None) => { self.done = true; None }
            Err(e) => { self.done = true; Some(Err(e)) }
        }
    }
}

/// Destination for unique records.
pub trait RecordSink {
    fn write_record(&mut self, rec: &FastqRecord) -> Result<()>;

    /// Flush buffered output; called once after the last record.
    fn finish(&mut self) -> Result<()> { Ok(()) }
}

impl RecordSink for Vec<FastqRecord> {
    fn write_record(&mut self, rec: &FastqRecord) -> Result<()> {
        self.push(rec.clone());
        Ok(())
    }
}

enum Output {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

pub struct Writer {
    out: Option<Output>,
    path: String,
}

impl Writer {
    pub fn create(path: &str, compression_level: u32) -> Result<Self> {
        let f = File::create(path).map_err(|e| UniqError::io(path, e))?;
        let out = if path.ends_with(".gz") {
            Output::Gzip(GzEncoder::new(BufWriter::new(f), Compression::new(compression_level)))
        } else {
            Output::Plain(BufWriter::new(f))
        };
        Ok(Self { out: Some(out), path: path.to_string() })
    }

    fn inner(&mut self) -> io::Result<&mut dyn Write> {
        match self.out.as_mut() {
            Some(Output::Plain(w)) => Ok(w as &mut dyn Write),
            Some(Output::Gzip(w)) => Ok(w as &mut dyn Write),
            None => Err(io::Error::new(io::ErrorKind::Other, "writer already finished")),
        }
    }

    fn write_lines(&mut self, rec: &FastqRecord) -> io::Result<()> {
        let w = self.inner()?;
        w.write_all(rec.name.as_bytes())?; w.write_all(b"\n")?;
        w.write_all(rec.seq.as_bytes())?;  w.write_all(b"\n")?;
        w.write_all(rec.plus.as_bytes())?; w.write_all(b"\n")?;
        w.write_all(rec.qual.as_bytes())?; w.write_all(b"\n")?;
        Ok(())
    }
}

impl RecordSink for Writer {
    fn write_record(&mut self, rec: &FastqRecord) -> Result<()> {
        self.write_lines(rec).map_err(|e| UniqError::io(&self.path, e))
    }

    fn finish(&mut self) -> Result<()> {
        let res = match self.out.take() {
            Some(Output::Plain(mut w)) => w.flush(),
            Some(Output::Gzip(enc)) => enc.finish().and_then(|mut w| w.flush()),
            None => Ok(()),
        };
        res.map_err(|e| UniqError::io(&self.path, e))
    }
}
