use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UniqError>;

#[derive(Error, Debug)]
pub enum UniqError {
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("The input file '{path}' does not exist.")]
    InputNotFound { path: String },

    #[error("Cannot read input file '{path}': {source}")]
    InputUnreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Malformed FASTQ record in '{path}' at line {line}: {reason}")]
    MalformedRecord { path: String, line: u64, reason: String },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Worker failed on chunk {chunk}: {reason}")]
    Worker { chunk: u64, reason: String },

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl UniqError {
    pub fn invalid(parameter: &str, reason: impl Into<String>) -> Self {
        UniqError::InvalidParameter { parameter: parameter.to_string(), reason: reason.into() }
    }

    pub fn io(path: &str, source: io::Error) -> Self {
        UniqError::Io { path: path.to_string(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = UniqError::invalid("chunk_size", "must be >= 1");
        let msg = format!("{err}");
        assert!(msg.contains("Invalid parameter 'chunk_size'"));
        assert!(msg.contains("must be >= 1"));
    }

    #[test]
    fn test_input_not_found_names_path() {
        let err = UniqError::InputNotFound { path: "reads.fq".to_string() };
        assert_eq!(format!("{err}"), "The input file 'reads.fq' does not exist.");
    }

    #[test]
    fn test_malformed_record_reports_line() {
        let err = UniqError::MalformedRecord {
            path: "a.fastq".to_string(),
            line: 9,
            reason: "missing '+' separator".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("a.fastq"));
        assert!(msg.contains("line 9"));
    }

    #[test]
    fn test_worker_error_carries_chunk() {
        let err = UniqError::Worker { chunk: 3, reason: "boom".to_string() };
        assert_eq!(format!("{err}"), "Worker failed on chunk 3: boom");
    }
}
