//! Fixed-width record encoding.

use crate::error::Result;

/// Encode/decode capability for the records of a [`SortedRecordFile`].
///
/// Every record is exactly [`entry_size`](RecordCodec::entry_size) bytes and
/// starts with its key, encoded in `max_key_length` bytes. Keys are compared
/// byte-wise in that encoded form, so the key encoding must preserve the
/// natural order of keys.
///
/// [`SortedRecordFile`]: crate::storage::SortedRecordFile
pub trait RecordCodec {
    /// The search key type.
    type Key: ?Sized;
    /// The record type.
    type Value;

    /// Byte width of one record for the given key width.
    fn entry_size(max_key_length: usize) -> usize;

    /// Encode `key` into `out`, which is exactly `max_key_length` bytes.
    fn encode_key(key: &Self::Key, out: &mut [u8]) -> Result<()>;

    /// Borrow the key of a record value.
    fn key_of(value: &Self::Value) -> &Self::Key;

    /// Encode the non-key fields of `value` into `out`, which is exactly
    /// `entry_size(max_key_length) - max_key_length` bytes.
    fn encode_fields(value: &Self::Value, out: &mut [u8]) -> Result<()>;

    /// Decode a full record.
    fn decode(record: &[u8], max_key_length: usize) -> Result<Self::Value>;

    /// Encode a full record into `out`, which is exactly one entry wide.
    fn encode(value: &Self::Value, max_key_length: usize, out: &mut [u8]) -> Result<()> {
        let (key, fields) = out.split_at_mut(max_key_length);
        Self::encode_key(Self::key_of(value), key)?;
        Self::encode_fields(value, fields)
    }
}
