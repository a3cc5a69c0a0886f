//! Lexicon entries.

use serde::{Deserialize, Serialize};

/// Maps a term to the byte offset of its postings in the posting-list file.
///
/// Entries order by term first, which is the order they are stored in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LexiconEntry {
    term: String,
    offset_docid: u64,
}

impl LexiconEntry {
    pub fn new(term: impl Into<String>, offset_docid: u64) -> Self {
        Self {
            term: term.into(),
            offset_docid,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Byte offset where this term's document ids start in the posting-list file.
    pub fn offset_docid(&self) -> u64 {
        self.offset_docid
    }
}
