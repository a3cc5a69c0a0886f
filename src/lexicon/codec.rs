//! Fixed-width encoding of lexicon entries.
//!
//! Record layout for a key width of `n`:
//!
//! ```text
//! [n bytes: ASCII term, NUL-padded on the right][8 bytes: offset_docid, big-endian]
//! ```
//!
//! Terms longer than `n` keep their first `n` bytes. NUL sorts before every
//! other byte, so comparing padded keys byte-wise gives the same order as
//! comparing the terms themselves.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{LexisError, Result};
use crate::lexicon::entry::LexiconEntry;
use crate::storage::RecordCodec;

const PAD: u8 = 0;
const OFFSET_BYTES: usize = std::mem::size_of::<u64>();

/// [`RecordCodec`] for [`LexiconEntry`] records keyed by term.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermCodec;

impl TermCodec {
    /// Whether `term` can be encoded at all.
    pub fn is_encodable(term: &str) -> bool {
        term.is_ascii() && !term.as_bytes().contains(&PAD)
    }

}

impl RecordCodec for TermCodec {
    type Key = str;
    type Value = LexiconEntry;

    fn entry_size(max_key_length: usize) -> usize {
        max_key_length.saturating_add(OFFSET_BYTES)
    }

    fn encode_key(term: &str, out: &mut [u8]) -> Result<()> {
        if !term.is_ascii() {
            return Err(LexisError::invalid_argument(format!(
                "term {term:?} is not ASCII"
            )));
        }
        let bytes = term.as_bytes();
        if bytes.contains(&PAD) {
            return Err(LexisError::invalid_argument(format!(
                "term {term:?} contains a NUL byte"
            )));
        }

        let len = bytes.len().min(out.len());
        out[..len].copy_from_slice(&bytes[..len]);
        out[len..].fill(PAD);
        Ok(())
    }

    fn key_of(entry: &LexiconEntry) -> &str {
        entry.term()
    }

    fn encode_fields(entry: &LexiconEntry, out: &mut [u8]) -> Result<()> {
        BigEndian::write_u64(out, entry.offset_docid());
        Ok(())
    }

    fn decode(record: &[u8], max_key_length: usize) -> Result<LexiconEntry> {
        if record.len() != Self::entry_size(max_key_length) {
            return Err(LexisError::corrupted(format!(
                "expected a {}-byte record, got {} bytes",
                Self::entry_size(max_key_length),
                record.len()
            )));
        }

        let (key, offset) = record.split_at(max_key_length);
        let term_len = key.iter().rposition(|&b| b != PAD).map_or(0, |i| i + 1);
        let term = &key[..term_len];
        if !term.is_ascii() || term.contains(&PAD) {
            return Err(LexisError::corrupted("term field is not padded ASCII"));
        }
        let term = String::from_utf8(term.to_vec())
            .map_err(|e| LexisError::corrupted(format!("term field is not ASCII: {e}")))?;

        Ok(LexiconEntry::new(term, BigEndian::read_u64(offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(entry: &LexiconEntry, max_term_length: usize) -> Vec<u8> {
        let mut record = vec![0u8; TermCodec::entry_size(max_term_length)];
        TermCodec::encode(entry, max_term_length, &mut record).unwrap();
        record
    }

    #[test]
    fn test_entry_size() {
        assert_eq!(TermCodec::entry_size(10), 18);
        assert_eq!(TermCodec::entry_size(1), 9);
        assert_eq!(TermCodec::entry_size(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_record_layout() {
        let record = encode(&LexiconEntry::new("abc", 0x0102), 5);
        assert_eq!(record, vec![b'a', b'b', b'c', 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x02]);
    }

    #[test]
    fn test_roundtrip_edges() {
        for entry in [
            LexiconEntry::new("", 0),
            LexiconEntry::new("a", u64::MAX),
            LexiconEntry::new("exactly10!", 42),
            LexiconEntry::new("with space", 7),
        ] {
            let record = encode(&entry, 10);
            assert_eq!(TermCodec::decode(&record, 10).unwrap(), entry);
        }
    }

    #[test]
    fn test_truncation() {
        let record = encode(&LexiconEntry::new("strawberry", 9), 4);
        let decoded = TermCodec::decode(&record, 4).unwrap();
        assert_eq!(decoded.term(), "stra");
        assert_eq!(decoded.offset_docid(), 9);
    }

    #[test]
    fn test_padded_keys_preserve_order() {
        let terms = ["a", "ab", "abc", "abd", "b", "ba", "z"];
        let keys: Vec<Vec<u8>> = terms
            .iter()
            .map(|t| {
                let mut key = vec![0u8; 4];
                TermCodec::encode_key(t, &mut key).unwrap();
                key
            })
            .collect();

        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_rejects_unencodable_terms() {
        let mut key = vec![0u8; 8];
        assert!(matches!(
            TermCodec::encode_key("caf\u{e9}", &mut key),
            Err(LexisError::InvalidArgument(_))
        ));
        assert!(matches!(
            TermCodec::encode_key("a\0b", &mut key),
            Err(LexisError::InvalidArgument(_))
        ));
        assert!(!TermCodec::is_encodable("a\0b"));
        assert!(TermCodec::is_encodable("ab"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let mut record = encode(&LexiconEntry::new("ok", 1), 4);
        record[0] = 0xff;
        assert!(matches!(
            TermCodec::decode(&record, 4),
            Err(LexisError::Corrupted(_))
        ));

        // Embedded NUL before the padding.
        let record = [b'a', 0, b'b', 0, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(TermCodec::decode(&record, 4).is_err());

        assert!(TermCodec::decode(&record[..11], 4).is_err());
    }
}
