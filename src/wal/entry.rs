//! WAL Entry definitions
//!
//! The put/delete entry carried in each log record payload.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{MemwalError, Result};
use crate::key::{
    pack_sequence_and_type, unpack_sequence_and_type, SequenceNumber, ValueType,
    INTERNAL_KEY_SUFFIX_LEN,
};

/// Size of the internal key length prefix
const KEY_LEN_SIZE: usize = 4;

/// A single mutation in the WAL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalEntry {
    /// Sequence number assigned to the write
    pub sequence: SequenceNumber,

    /// Put or delete
    pub value_type: ValueType,

    /// User key
    pub key: Vec<u8>,

    /// Value bytes; always empty for a delete
    pub value: Vec<u8>,
}

impl WalEntry {
    pub fn new(
        sequence: SequenceNumber,
        value_type: ValueType,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            sequence,
            value_type,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn put(sequence: SequenceNumber, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::new(sequence, ValueType::Value, key, value)
    }

    pub fn delete(sequence: SequenceNumber, key: impl Into<Vec<u8>>) -> Self {
        Self::new(sequence, ValueType::Deletion, key, Vec::new())
    }

    /// Size of the encoded payload
    pub fn encoded_len(&self) -> usize {
        KEY_LEN_SIZE + self.key.len() + INTERNAL_KEY_SUFFIX_LEN + self.value.len()
    }

    /// Encode as `[key_len u32][user key][seq<<8|tag u64][value]`
    pub fn encode(&self) -> Result<Vec<u8>> {
        let internal_key_len = u32::try_from(self.key.len() + INTERNAL_KEY_SUFFIX_LEN)
            .map_err(|_| MemwalError::RecordTooLarge {
                size: self.encoded_len(),
                max: u32::MAX as usize,
            })?;

        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u32_le(internal_key_len);
        buf.put_slice(&self.key);
        buf.put_u64_le(pack_sequence_and_type(self.sequence, self.value_type));
        buf.put_slice(&self.value);
        Ok(buf.to_vec())
    }

    /// Decode a payload produced by [`WalEntry::encode`]
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut buf = payload;

        if buf.remaining() < KEY_LEN_SIZE {
            return Err(MemwalError::WalCorruption(format!(
                "entry too short for key length: {} bytes",
                payload.len()
            )));
        }
        let internal_key_len = buf.get_u32_le() as usize;

        if internal_key_len < INTERNAL_KEY_SUFFIX_LEN {
            return Err(MemwalError::WalCorruption(format!(
                "internal key length {} is shorter than its suffix",
                internal_key_len
            )));
        }
        if buf.remaining() < internal_key_len {
            return Err(MemwalError::WalCorruption(format!(
                "internal key length {} exceeds remaining {} bytes",
                internal_key_len,
                buf.remaining()
            )));
        }

        let key = buf.copy_to_bytes(internal_key_len - INTERNAL_KEY_SUFFIX_LEN).to_vec();
        let (sequence, value_type) = unpack_sequence_and_type(buf.get_u64_le())?;
        let value = buf.to_vec();

        if value_type == ValueType::Deletion && !value.is_empty() {
            return Err(MemwalError::WalCorruption(format!(
                "delete entry at sequence {} carries a {}-byte value",
                sequence,
                value.len()
            )));
        }

        Ok(Self {
            sequence,
            value_type,
            key,
            value,
        })
    }
}
