//! Key Codec
//!
//! Builds versioned internal keys out of user keys and takes them apart
//! again.
//!
//! ## Internal Key Layout
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────┐
//! │ user key (n bytes)   │ suffix (8, LE u64 = seq << 8 | tag)  │
//! └──────────────────────┴──────────────────────────────────────┘
//! ```
//! The tag is the lowest-order byte of the suffix, so it sits at offset
//! `n` of the internal key. The upper 56 bits carry the sequence number.

mod comparator;

use crate::error::{MemwalError, Result};

pub use comparator::{BytewiseComparator, Comparator, InternalKeyComparator};

/// Write-order identifier embedded in every internal key
pub type SequenceNumber = u64;

/// Largest sequence number that fits next to the tag byte
pub const MAX_SEQUENCE_NUMBER: SequenceNumber = (1 << 56) - 1;

/// Bytes appended to a user key to form an internal key
pub const INTERNAL_KEY_SUFFIX_LEN: usize = 8;

/// Operation recorded with each entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// Tombstone; carries no value
    Deletion = 0x0,
    /// Live value
    Value = 0x1,
}

impl TryFrom<u8> for ValueType {
    type Error = MemwalError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0x0 => Ok(ValueType::Deletion),
            0x1 => Ok(ValueType::Value),
            other => Err(MemwalError::WalCorruption(format!(
                "unknown value type tag: 0x{:02x}",
                other
            ))),
        }
    }
}

/// Pack a sequence number and a tag into the 8-byte suffix value
pub fn pack_sequence_and_type(sequence: SequenceNumber, value_type: ValueType) -> u64 {
    debug_assert!(sequence <= MAX_SEQUENCE_NUMBER);
    (sequence << 8) | value_type as u64
}

/// Inverse of [`pack_sequence_and_type`], using all 56 sequence bits
pub fn unpack_sequence_and_type(packed: u64) -> Result<(SequenceNumber, ValueType)> {
    let value_type = ValueType::try_from((packed & 0xff) as u8)?;
    Ok((packed >> 8, value_type))
}

/// Build `user_key ++ suffix` in a freshly allocated buffer
pub fn encode_internal_key(
    user_key: &[u8],
    sequence: SequenceNumber,
    value_type: ValueType,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(user_key.len() + INTERNAL_KEY_SUFFIX_LEN);
    append_internal_key(&mut buf, user_key, sequence, value_type);
    buf
}

/// Append `user_key ++ suffix` to `buf`
pub fn append_internal_key(
    buf: &mut Vec<u8>,
    user_key: &[u8],
    sequence: SequenceNumber,
    value_type: ValueType,
) {
    buf.extend_from_slice(user_key);
    buf.extend_from_slice(&pack_sequence_and_type(sequence, value_type).to_le_bytes());
}

/// The internal key minus its trailing 8 bytes
pub fn extract_user_key(internal_key: &[u8]) -> &[u8] {
    debug_assert!(internal_key.len() >= INTERNAL_KEY_SUFFIX_LEN);
    &internal_key[..internal_key.len() - INTERNAL_KEY_SUFFIX_LEN]
}

/// The raw tag byte of an internal key
pub fn extract_tag(internal_key: &[u8]) -> u8 {
    debug_assert!(internal_key.len() >= INTERNAL_KEY_SUFFIX_LEN);
    internal_key[internal_key.len() - INTERNAL_KEY_SUFFIX_LEN]
}

/// The packed suffix of an internal key
fn extract_suffix(internal_key: &[u8]) -> u64 {
    let start = internal_key.len() - INTERNAL_KEY_SUFFIX_LEN;
    let mut suffix = [0u8; INTERNAL_KEY_SUFFIX_LEN];
    suffix.copy_from_slice(&internal_key[start..]);
    u64::from_le_bytes(suffix)
}

/// The sequence number of an internal key
pub fn extract_sequence(internal_key: &[u8]) -> SequenceNumber {
    debug_assert!(internal_key.len() >= INTERNAL_KEY_SUFFIX_LEN);
    extract_suffix(internal_key) >> 8
}

/// An internal key split into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInternalKey<'a> {
    pub user_key: &'a [u8],
    pub sequence: SequenceNumber,
    pub value_type: ValueType,
}

/// Split an internal key, rejecting short keys and unknown tags
pub fn parse_internal_key(internal_key: &[u8]) -> Result<ParsedInternalKey<'_>> {
    if internal_key.len() < INTERNAL_KEY_SUFFIX_LEN {
        return Err(MemwalError::WalCorruption(format!(
            "internal key too short: {} bytes",
            internal_key.len()
        )));
    }
    let (sequence, value_type) = unpack_sequence_and_type(extract_suffix(internal_key))?;
    Ok(ParsedInternalKey {
        user_key: extract_user_key(internal_key),
        sequence,
        value_type,
    })
}

/// Key used for exact-match memtable lookups.
///
/// Matches a stored entry when both the user key and the sequence number
/// are equal; the stored tag then decides between value and tombstone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    internal_key: Vec<u8>,
}

impl LookupKey {
    pub fn new(user_key: &[u8], sequence: SequenceNumber) -> Self {
        Self {
            internal_key: encode_internal_key(user_key, sequence, ValueType::Value),
        }
    }

    pub fn internal_key(&self) -> &[u8] {
        &self.internal_key
    }

    pub fn user_key(&self) -> &[u8] {
        extract_user_key(&self.internal_key)
    }

    pub fn sequence(&self) -> SequenceNumber {
        extract_sequence(&self.internal_key)
    }
}
