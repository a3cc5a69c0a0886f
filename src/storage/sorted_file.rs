//! Disk-resident sorted array of fixed-width records.
//!
//! A [`SortedRecordFile`] goes through two phases:
//!
//! ```text
//! open/create ──► append_sorted()* ──► flush()
//!                                        │
//!                 ┌──────────────────────┴─────────────────────┐
//!                 ▼                                            ▼
//!   lookup() via positional reads          enable_memory_mapping()
//!                                          ├── read_next() / scanner()
//!                                          └── lookup() over the mapping
//! ```
//!
//! Record `i` lives at byte offset `i * entry_size(max_key_length)`. The file
//! carries no header, so every reader must be opened with the same
//! `max_key_length` as the writer.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use memmap2::Mmap;

use crate::error::{LexisError, Result};
use crate::observe::{EventSink, LogSink, StorageEvent};
use crate::storage::codec::RecordCodec;
use crate::storage::view::{RecordScanner, RecordView, search_slots};

/// Largest key width a file can be opened with.
pub const MAX_KEY_LENGTH: usize = u16::MAX as usize;

/// Establishes the read-only mapping of a file.
type Mapper = fn(&File) -> std::io::Result<Mmap>;

fn map_file(file: &File) -> std::io::Result<Mmap> {
    // SAFETY: the mapping is read-only and appends are refused while it is
    // alive. Other processes must not modify the file meanwhile.
    unsafe { Mmap::map(file) }
}

/// Whether sequential reads over a memory mapping are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingState {
    /// No mapping has been requested, or it was released.
    Unmapped,
    /// The whole file is mapped read-only.
    Mapped,
    /// The last mapping attempt failed.
    Failed,
}

/// A read-only view of the file contents.
enum Mapping {
    /// Zero-length files are never handed to `mmap`.
    Empty,
    Mapped(Mmap),
}

impl Mapping {
    fn bytes(&self) -> &[u8] {
        match self {
            Mapping::Empty => &[],
            Mapping::Mapped(mmap) => &mmap[..],
        }
    }
}

/// Options for opening a [`SortedRecordFile`].
#[derive(Debug, Clone)]
pub struct RecordFileOptions {
    truncate: bool,
    sink: Arc<dyn EventSink>,
}

impl RecordFileOptions {
    pub fn new() -> Self {
        Self {
            truncate: false,
            sink: Arc::new(LogSink),
        }
    }

    /// Discard any existing records when opening.
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    /// Report lifecycle events to `sink` instead of the `log` crate.
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Open `dir/file_name`, creating the directory and the file if needed.
    pub fn open<C: RecordCodec>(
        &self,
        dir: impl AsRef<Path>,
        file_name: &str,
        max_key_length: usize,
    ) -> Result<SortedRecordFile<C>> {
        SortedRecordFile::open_with(dir.as_ref(), file_name, max_key_length, self)
    }
}

impl Default for RecordFileOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A file of fixed-width records stored in strictly ascending key order.
///
/// Appends go through a buffered writer opened in append mode. Point lookups
/// flush that writer, then use positional reads on a separate handle, or the
/// mapping when one is active. The mapping is released when the file is
/// dropped.
pub struct SortedRecordFile<C: RecordCodec> {
    path: PathBuf,
    max_key_length: usize,
    record_size: usize,
    record_count: usize,

    /// Handle used for positional reads and for mapping.
    reader: Mutex<File>,

    /// Append handle, opened on the first append. Lookups flush it through
    /// a shared reference, hence the lock.
    writer: Mutex<Option<BufWriter<File>>>,

    /// Encoded key of the last record, used to enforce ordering.
    last_key: Option<Vec<u8>>,

    mapping: Option<Mapping>,
    mapping_state: MappingState,

    /// Byte position of the next sequential read within the mapping.
    cursor: usize,

    sink: Arc<dyn EventSink>,
    mapper: Mapper,
    _codec: PhantomData<fn() -> C>,
}

impl<C: RecordCodec> SortedRecordFile<C> {
    /// Byte width of one record for the given key width.
    pub fn entry_size(max_key_length: usize) -> usize {
        C::entry_size(max_key_length)
    }

    /// Open `dir/file_name`, creating it if it does not exist.
    ///
    /// Existing records are kept and further appends continue after them.
    pub fn open(dir: impl AsRef<Path>, file_name: &str, max_key_length: usize) -> Result<Self> {
        RecordFileOptions::new().open(dir, file_name, max_key_length)
    }

    /// Create `dir/file_name`, discarding any existing records.
    pub fn create(dir: impl AsRef<Path>, file_name: &str, max_key_length: usize) -> Result<Self> {
        RecordFileOptions::new()
            .truncate(true)
            .open(dir, file_name, max_key_length)
    }

    fn open_with(
        dir: &Path,
        file_name: &str,
        max_key_length: usize,
        options: &RecordFileOptions,
    ) -> Result<Self> {
        if max_key_length == 0 || max_key_length > MAX_KEY_LENGTH {
            return Err(LexisError::invalid_config(format!(
                "max_key_length must be between 1 and {MAX_KEY_LENGTH}, got {max_key_length}"
            )));
        }
        let record_size = C::entry_size(max_key_length);
        if record_size < max_key_length {
            return Err(LexisError::invalid_config(format!(
                "record size {record_size} is smaller than the key width {max_key_length}"
            )));
        }

        fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(options.truncate)
            .open(&path)?;

        let len = usize::try_from(file.metadata()?.len()).map_err(|_| {
            LexisError::invalid_config(format!("{} is too large to address", path.display()))
        })?;
        if len % record_size != 0 {
            return Err(LexisError::invalid_config(format!(
                "{} has {len} bytes, which is not a multiple of the record size {record_size}; \
                 the key width {max_key_length} does not match the writer or the file is truncated",
                path.display()
            )));
        }

        let mut sorted_file = Self {
            path,
            max_key_length,
            record_size,
            record_count: len / record_size,
            reader: Mutex::new(file),
            writer: Mutex::new(None),
            last_key: None,
            mapping: None,
            mapping_state: MappingState::Unmapped,
            cursor: 0,
            sink: options.sink.clone(),
            mapper: map_file,
            _codec: PhantomData,
        };

        if sorted_file.record_count > 0 {
            let mut key = vec![0u8; max_key_length];
            sorted_file.read_slot(sorted_file.record_count - 1, &mut key)?;
            sorted_file.last_key = Some(key);
        }

        sorted_file.sink.on_event(&StorageEvent::Opened {
            path: &sorted_file.path,
            record_count: sorted_file.record_count,
            record_size,
        });

        Ok(sorted_file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_key_length(&self) -> usize {
        self.max_key_length
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Number of records, including appends not yet flushed.
    pub fn len(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    // ── Write phase ─────────────────────────────────────────────────

    /// Append one record after the last one.
    ///
    /// The key of `value` must sort strictly after the key of the previous
    /// record once encoded. Records are never reordered; an out-of-order or
    /// duplicate key is rejected and nothing is written.
    pub fn append_sorted(&mut self, value: &C::Value) -> Result<()> {
        if self.mapping.is_some() {
            return Err(LexisError::invalid_operation(format!(
                "cannot append to {} while it is memory mapped",
                self.path.display()
            )));
        }

        let mut record = vec![0u8; self.record_size];
        C::encode(value, self.max_key_length, &mut record)?;

        let key = &record[..self.max_key_length];
        if let Some(last) = &self.last_key
            && key <= last.as_slice()
        {
            return Err(LexisError::invalid_operation(format!(
                "record {} is not strictly greater than the previous key in {}",
                self.record_count,
                self.path.display()
            )));
        }

        self.writer()?.write_all(&record)?;
        self.record_count += 1;
        record.truncate(self.max_key_length);
        self.last_key = Some(record);
        Ok(())
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        let slot = self
            .writer
            .get_mut()
            .map_err(|_| LexisError::internal("writer mutex poisoned"))?;
        let writer = match slot.take() {
            Some(writer) => writer,
            None => BufWriter::new(OpenOptions::new().append(true).open(&self.path)?),
        };
        Ok(slot.insert(writer))
    }

    /// Push buffered appends to the file.
    pub fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| LexisError::internal("writer mutex poisoned"))?;
        if let Some(writer) = writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn close_writer(&mut self) -> Result<()> {
        self.flush()?;
        if let Ok(writer) = self.writer.get_mut() {
            *writer = None;
        }
        Ok(())
    }

    // ── Memory-mapped sequential reads ──────────────────────────────

    /// Map the whole file read-only and reset the sequential cursor.
    ///
    /// Pending appends are flushed and the append handle is closed first;
    /// a flush failure is returned as an error. A failure to establish the
    /// mapping itself is reported to the event sink and leaves the file in
    /// [`MappingState::Failed`]: `Ok(false)` is returned and sequential reads
    /// stay unavailable, while positional lookups keep working.
    pub fn enable_memory_mapping(&mut self) -> Result<bool> {
        if self.mapping.is_some() {
            return Ok(true);
        }

        self.close_writer()?;

        let len = self.record_count * self.record_size;
        let mapped = if len == 0 {
            Ok(Mapping::Empty)
        } else {
            let file = self
                .reader
                .lock()
                .map_err(|_| LexisError::internal("reader mutex poisoned"))?;
            (self.mapper)(&*file).map(Mapping::Mapped)
        };

        match mapped {
            Ok(mapping) => {
                let mapped_len = mapping.bytes().len();
                if mapped_len != len {
                    return Err(LexisError::corrupted(format!(
                        "{} changed size: expected {len} bytes, mapped {mapped_len}",
                        self.path.display()
                    )));
                }
                self.sink.on_event(&StorageEvent::Mapped {
                    path: &self.path,
                    len,
                });
                self.mapping = Some(mapping);
                self.mapping_state = MappingState::Mapped;
                self.cursor = 0;
                Ok(true)
            }
            Err(error) => {
                self.sink.on_event(&StorageEvent::MappingFailed {
                    path: &self.path,
                    error: &error,
                });
                self.mapping_state = MappingState::Failed;
                Ok(false)
            }
        }
    }

    /// Drop the mapping, if any, re-enabling appends.
    pub fn release_mapping(&mut self) {
        if self.mapping.take().is_some() {
            self.sink
                .on_event(&StorageEvent::MappingReleased { path: &self.path });
        }
        self.mapping_state = MappingState::Unmapped;
        self.cursor = 0;
    }

    pub fn mapping_state(&self) -> MappingState {
        self.mapping_state
    }

    #[cfg(test)]
    pub(crate) fn set_mapper(&mut self, mapper: Mapper) {
        self.mapper = mapper;
    }

    pub fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }

    fn mapped_bytes(&self) -> Result<&[u8]> {
        self.mapping
            .as_ref()
            .map(Mapping::bytes)
            .ok_or(LexisError::NotMapped)
    }

    /// Decode the record at the cursor and advance past it.
    ///
    /// Returns [`LexisError::OutOfRange`] once every record has been read and
    /// [`LexisError::NotMapped`] without an active mapping.
    pub fn read_next(&mut self) -> Result<C::Value> {
        let bytes = self.mapped_bytes()?;
        let end = self.cursor + self.record_size;
        if end > bytes.len() {
            return Err(LexisError::OutOfRange {
                position: self.cursor,
                len: bytes.len(),
            });
        }

        let value = C::decode(&bytes[self.cursor..end], self.max_key_length)?;
        self.cursor = end;
        Ok(value)
    }

    /// Number of records left for [`read_next`](Self::read_next).
    pub fn remaining(&self) -> usize {
        match self.mapping.as_ref() {
            Some(mapping) => (mapping.bytes().len() - self.cursor) / self.record_size,
            None => 0,
        }
    }

    /// Move the sequential cursor back to the first record.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Random-access view over the mapping.
    pub fn view(&self) -> Result<RecordView<'_, C>> {
        RecordView::new(self.mapped_bytes()?, self.max_key_length)
    }

    /// Iterate over the mapped records without touching the cursor.
    pub fn scanner(&self) -> Result<RecordScanner<'_, C>> {
        Ok(self.view()?.scan())
    }

    // ── Point reads ─────────────────────────────────────────────────

    /// Read the first `buf.len()` bytes of the record at `index`.
    fn read_slot(&self, index: usize, buf: &mut [u8]) -> Result<()> {
        let position = (index * self.record_size) as u64;
        let mut file = self
            .reader
            .lock()
            .map_err(|_| LexisError::internal("reader mutex poisoned"))?;
        file.seek(SeekFrom::Start(position))?;
        file.read_exact(buf)?;
        Ok(())
    }

    /// Decode the record at slot `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Result<Option<C::Value>> {
        if let Ok(view) = self.view() {
            return view.get(index);
        }

        self.flush()?;
        if index >= self.record_count {
            return Ok(None);
        }
        let mut record = vec![0u8; self.record_size];
        self.read_slot(index, &mut record)?;
        C::decode(&record, self.max_key_length).map(Some)
    }

    /// Find the record with the given key by binary search.
    ///
    /// Uses the mapping when one is active and positional reads otherwise.
    /// A missing key yields `Ok(None)`.
    pub fn lookup(&self, key: &C::Key) -> Result<Option<C::Value>> {
        let mut encoded = vec![0u8; self.max_key_length];
        C::encode_key(key, &mut encoded)?;

        if let Ok(view) = self.view() {
            return view.find_encoded(&encoded);
        }

        self.flush()?;
        let mut slot_key = vec![0u8; self.max_key_length];
        let found = search_slots(self.record_count, |index| {
            self.read_slot(index, &mut slot_key)?;
            Ok(slot_key.as_slice().cmp(encoded.as_slice()))
        })?;

        match found {
            Some(index) => self.get(index),
            None => Ok(None),
        }
    }
}

impl<C: RecordCodec> Drop for SortedRecordFile<C> {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("failed to flush {}: {e}", self.path.display());
        }
        self.release_mapping();
    }
}

impl<C: RecordCodec> fmt::Debug for SortedRecordFile<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedRecordFile")
            .field("path", &self.path)
            .field("max_key_length", &self.max_key_length)
            .field("record_size", &self.record_size)
            .field("record_count", &self.record_count)
            .field("mapping_state", &self.mapping_state)
            .field("cursor", &self.cursor)
            .finish()
    }
}
