//! Fixed-record sorted files.
//!
//! - [`RecordCodec`] describes how one record is laid out.
//! - [`SortedRecordFile`] owns the file through its write and read phases.
//! - [`RecordView`] and [`RecordScanner`] read the mapped bytes.

pub mod codec;
pub mod sorted_file;
pub mod view;

pub use codec::RecordCodec;
pub use sorted_file::{MappingState, RecordFileOptions, SortedRecordFile};
pub use view::{RecordScanner, RecordView};
