//! Read views over the bytes of a sorted record file.
//!
//! [`RecordView`] treats a byte slice as an array of equal-width slots and
//! answers point queries by binary search. [`RecordScanner`] walks the same
//! slots in order. Neither holds mutable state shared with the other, so any
//! number of them can be taken over one mapping.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{LexisError, Result};
use crate::storage::codec::RecordCodec;
use crate::storage::sorted_file::MAX_KEY_LENGTH;

/// Binary search over `count` slots.
///
/// `probe(index)` returns how the key stored at `index` compares to the
/// search key. Returns the index of the matching slot, if any.
pub(crate) fn search_slots<F>(count: usize, mut probe: F) -> Result<Option<usize>>
where
    F: FnMut(usize) -> Result<Ordering>,
{
    let mut low = 0usize;
    let mut high = count;

    while low < high {
        let mid = low + (high - low) / 2;
        match probe(mid)? {
            Ordering::Less => low = mid + 1,
            Ordering::Greater => high = mid,
            Ordering::Equal => return Ok(Some(mid)),
        }
    }

    Ok(None)
}

/// Random-access view over fixed-width records.
pub struct RecordView<'a, C: RecordCodec> {
    bytes: &'a [u8],
    max_key_length: usize,
    record_size: usize,
    _codec: PhantomData<fn() -> C>,
}

impl<'a, C: RecordCodec> RecordView<'a, C> {
    /// Create a view over `bytes`.
    ///
    /// Fails if the byte length is not a whole number of records.
    pub fn new(bytes: &'a [u8], max_key_length: usize) -> Result<Self> {
        if max_key_length > MAX_KEY_LENGTH {
            return Err(LexisError::invalid_config(format!(
                "key width {max_key_length} exceeds {MAX_KEY_LENGTH}"
            )));
        }
        let record_size = C::entry_size(max_key_length);
        if record_size == 0 || bytes.len() % record_size != 0 {
            return Err(LexisError::invalid_config(format!(
                "{} bytes is not a multiple of the record size {record_size}",
                bytes.len()
            )));
        }

        Ok(Self {
            bytes,
            max_key_length,
            record_size,
            _codec: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.record_size
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    fn slot(&self, index: usize) -> &'a [u8] {
        let start = index * self.record_size;
        &self.bytes[start..start + self.record_size]
    }

    /// Decode the record at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Result<Option<C::Value>> {
        if index >= self.len() {
            return Ok(None);
        }
        C::decode(self.slot(index), self.max_key_length).map(Some)
    }

    /// Find the record whose encoded key equals `encoded_key`.
    pub fn find_encoded(&self, encoded_key: &[u8]) -> Result<Option<C::Value>> {
        let found = search_slots(self.len(), |index| {
            Ok(self.slot(index)[..self.max_key_length].cmp(encoded_key))
        })?;

        match found {
            Some(index) => C::decode(self.slot(index), self.max_key_length).map(Some),
            None => Ok(None),
        }
    }

    /// Find the record with the given key.
    pub fn lookup(&self, key: &C::Key) -> Result<Option<C::Value>> {
        let mut encoded = vec![0u8; self.max_key_length];
        C::encode_key(key, &mut encoded)?;
        self.find_encoded(&encoded)
    }

    /// Iterate over all records in key order.
    pub fn scan(&self) -> RecordScanner<'a, C> {
        RecordScanner {
            view: *self,
            next: 0,
        }
    }
}

impl<C: RecordCodec> Clone for RecordView<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: RecordCodec> Copy for RecordView<'_, C> {}

impl<C: RecordCodec> fmt::Debug for RecordView<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordView")
            .field("len", &self.len())
            .field("max_key_length", &self.max_key_length)
            .field("record_size", &self.record_size)
            .finish()
    }
}

/// Sequential iterator over the records of a [`RecordView`].
pub struct RecordScanner<'a, C: RecordCodec> {
    view: RecordView<'a, C>,
    next: usize,
}

impl<C: RecordCodec> RecordScanner<'_, C> {
    /// Number of records not yet yielded.
    pub fn remaining(&self) -> usize {
        self.view.len() - self.next
    }
}

impl<C: RecordCodec> Iterator for RecordScanner<'_, C> {
    type Item = Result<C::Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.view.len() {
            return None;
        }
        let record = self.view.slot(self.next);
        self.next += 1;
        Some(C::decode(record, self.view.max_key_length))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl<C: RecordCodec> fmt::Debug for RecordScanner<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordScanner")
            .field("next", &self.next)
            .field("len", &self.view.len())
            .finish()
    }
}
