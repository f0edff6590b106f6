mod chunk;
mod merger;

use std::collections::HashMap;

pub use self::chunk::dedup_chunk;
pub use self::merger::Merger;

/// Run-wide set of sequences already emitted, remembering the stream position
/// of the occurrence that was kept.
#[derive(Debug, Default)]
pub struct UniquenessSet {
    first_seen: HashMap<String, u64>,
}

impl UniquenessSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of the kept occurrence of `seq`, if any.
    pub fn first_position(&self, seq: &str) -> Option<u64> {
        self.first_seen.get(seq).copied()
    }

    /// Returns false if `seq` was already present; the stored position is
    /// never overwritten.
    pub fn insert(&mut self, seq: &str, pos: u64) -> bool {
        if self.first_seen.contains_key(seq) {
            return false;
        }
        self.first_seen.insert(seq.to_owned(), pos);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_position() {
        let mut set = UniquenessSet::new();
        assert!(set.insert("ACGT", 4));
        assert!(!set.insert("ACGT", 9));
        assert_eq!(set.first_position("ACGT"), Some(4));
        assert_eq!(set.first_position("acgt"), None);
    }
}
