//! Partial lexicons.
//!
//! A partial lexicon is the sorted term dictionary produced for one block of
//! documents while building an inverted index. Terms are appended in sorted
//! order during indexing, streamed through a memory mapping while partial
//! lexicons are merged, and resolved by binary search at query time.

pub mod codec;
pub mod entry;

use std::path::Path;

use crate::config::LexiconConfig;
use crate::error::Result;
use crate::storage::SortedRecordFile;

pub use codec::TermCodec;
pub use entry::LexiconEntry;

/// A sorted record file of [`LexiconEntry`] records keyed by term.
pub type PartialLexicon = SortedRecordFile<TermCodec>;

impl SortedRecordFile<TermCodec> {
    /// Open a partial lexicon with the shared configuration.
    pub fn open_with_config(
        dir: impl AsRef<Path>,
        file_name: &str,
        config: &LexiconConfig,
    ) -> Result<Self> {
        config.validate()?;
        Self::open(dir, file_name, config.max_term_length)
    }

    /// Create an empty partial lexicon with the shared configuration.
    pub fn create_with_config(
        dir: impl AsRef<Path>,
        file_name: &str,
        config: &LexiconConfig,
    ) -> Result<Self> {
        config.validate()?;
        Self::create(dir, file_name, config.max_term_length)
    }

    pub fn append_term(&mut self, term: &str, offset_docid: u64) -> Result<()> {
        self.append_sorted(&LexiconEntry::new(term, offset_docid))
    }

    /// Read the next entry from the mapping. Used while merging.
    pub fn read_next_mmap(&mut self) -> Result<LexiconEntry> {
        self.read_next()
    }

    /// Look up a term.
    ///
    /// Terms that could never have been stored (non-ASCII, or containing NUL)
    /// are reported as missing rather than as errors.
    pub fn lookup_term(&self, term: &str) -> Result<Option<LexiconEntry>> {
        if !TermCodec::is_encodable(term) {
            return Ok(None);
        }
        self.lookup(term)
    }
}
