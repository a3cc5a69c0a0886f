//! # Lexis
//!
//! Disk-resident sorted arrays of fixed-width records, used to persist the
//! partial lexicons of an inverted index.
//!
//! ## Features
//!
//! - Append-only sequential writes while indexing a document block
//! - Memory-mapped sequential scans while merging partial lexicons
//! - Binary-search point lookups at query time
//! - Pluggable record layouts through [`RecordCodec`](storage::RecordCodec)

pub mod config;
mod error;
pub mod lexicon;
pub mod observe;
pub mod storage;

// Re-exports for the public API
pub use config::LexiconConfig;
pub use error::{LexisError, Result};
pub use lexicon::{LexiconEntry, PartialLexicon, TermCodec};
pub use observe::{EventSink, LogSink, StorageEvent};
pub use storage::{MappingState, RecordCodec, RecordFileOptions, SortedRecordFile};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
