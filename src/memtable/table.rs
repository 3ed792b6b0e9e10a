//! MemTable implementation
//!
//! Arena-backed sorted table with a cursor-style iterator.

use std::cmp::Ordering;
use std::mem;
use std::ops::Range;

use crate::key::{
    append_internal_key, extract_sequence, extract_tag, extract_user_key, InternalKeyComparator,
    LookupKey, SequenceNumber, ValueType,
};

use super::MemTableEntry;

/// Offsets of one entry's bytes inside the arena
#[derive(Debug, Clone)]
struct Slot {
    internal_key: Range<usize>,
    value: Range<usize>,
}

/// In-memory table for the writes of one log segment
#[derive(Debug)]
pub struct MemTable {
    comparator: InternalKeyComparator,
    /// Backing storage for every key and value ever added
    arena: Vec<u8>,
    /// Sorted ascending by user key, unique by user key
    slots: Vec<Slot>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new(comparator: InternalKeyComparator) -> Self {
        Self {
            comparator,
            arena: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn comparator(&self) -> &InternalKeyComparator {
        &self.comparator
    }

    /// Insert or overwrite the entry for `key`.
    ///
    /// The entry lands before the first key greater than `key`; an entry with
    /// an equal user key has its internal key and value replaced in place.
    /// Both `key` and `value` are copied.
    pub fn add(&mut self, sequence: SequenceNumber, value_type: ValueType, key: &[u8], value: &[u8]) {
        let position = self.find(key);

        let key_start = self.arena.len();
        append_internal_key(&mut self.arena, key, sequence, value_type);
        let value_start = self.arena.len();
        self.arena.extend_from_slice(value);

        let slot = Slot {
            internal_key: key_start..value_start,
            value: value_start..self.arena.len(),
        };

        match position {
            Ok(index) => self.slots[index] = slot,
            Err(index) => self.slots.insert(index, slot),
        }
    }

    /// Exact-match lookup.
    ///
    /// Matches only an entry with the same user key and sequence number as
    /// `key`. Returns `None` when nothing matches and
    /// `Some(MemTableEntry::Tombstone)` when the match is a delete.
    pub fn get(&self, key: &LookupKey) -> Option<MemTableEntry> {
        let index = self.find(key.user_key()).ok()?;
        let slot = &self.slots[index];
        let internal_key = &self.arena[slot.internal_key.clone()];

        if !self.comparator.same_version(internal_key, key.internal_key()) {
            return None;
        }
        Some(self.entry_at(slot))
    }

    /// The live entry for `user_key`, whatever its sequence number
    pub fn get_latest(&self, user_key: &[u8]) -> Option<MemTableEntry> {
        let index = self.find(user_key).ok()?;
        Some(self.entry_at(&self.slots[index]))
    }

    /// Get entry count (tombstones included)
    pub fn entry_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bytes held by the arena and the slot index.
    ///
    /// Overwritten entries keep their old bytes until the table is dropped.
    pub fn approximate_memory_usage(&self) -> usize {
        self.arena.capacity() + self.slots.capacity() * mem::size_of::<Slot>()
    }

    /// Cursor over the entries; starts unpositioned
    pub fn new_iterator(&self) -> MemTableIterator<'_> {
        MemTableIterator {
            table: self,
            position: None,
        }
    }

    /// Entries in ascending user-key order as `(user_key, value)`, with
    /// `None` standing for a tombstone
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            table: self,
            next: 0,
        }
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Binary search by user key over the sorted slots
    fn find(&self, user_key: &[u8]) -> std::result::Result<usize, usize> {
        let ucmp = self.comparator.user_comparator();
        let arena = &self.arena;
        self.slots.binary_search_by(|slot| {
            ucmp.compare(extract_user_key(&arena[slot.internal_key.clone()]), user_key)
        })
    }

    /// First slot whose user key is >= `target`
    fn lower_bound(&self, target: &[u8]) -> usize {
        let ucmp = self.comparator.user_comparator();
        self.slots.partition_point(|slot| {
            ucmp.compare(self.user_key_at(slot), target) == Ordering::Less
        })
    }

    fn internal_key_at(&self, slot: &Slot) -> &[u8] {
        &self.arena[slot.internal_key.clone()]
    }

    fn user_key_at(&self, slot: &Slot) -> &[u8] {
        extract_user_key(self.internal_key_at(slot))
    }

    fn value_at(&self, slot: &Slot) -> &[u8] {
        &self.arena[slot.value.clone()]
    }

    fn value_type_at(&self, slot: &Slot) -> ValueType {
        // Only add() writes slots, and it always writes a valid tag
        match extract_tag(self.internal_key_at(slot)) {
            0x0 => ValueType::Deletion,
            _ => ValueType::Value,
        }
    }

    fn entry_at(&self, slot: &Slot) -> MemTableEntry {
        match self.value_type_at(slot) {
            ValueType::Value => MemTableEntry::Value(self.value_at(slot).to_vec()),
            ValueType::Deletion => MemTableEntry::Tombstone,
        }
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new(InternalKeyComparator::default())
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Bidirectional cursor over a MemTable.
///
/// Moving past either end makes the cursor invalid. `key`, `value` and the
/// other accessors must only be called while [`MemTableIterator::valid`].
pub struct MemTableIterator<'a> {
    table: &'a MemTable,
    position: Option<usize>,
}

impl<'a> MemTableIterator<'a> {
    pub fn valid(&self) -> bool {
        self.position.is_some()
    }

    pub fn seek_to_first(&mut self) {
        self.position = if self.table.is_empty() { None } else { Some(0) };
    }

    pub fn seek_to_last(&mut self) {
        self.position = self.table.slots.len().checked_sub(1);
    }

    /// Position at the first entry whose user key is >= `target`
    pub fn seek(&mut self, target: &[u8]) {
        let index = self.table.lower_bound(target);
        self.position = (index < self.table.slots.len()).then_some(index);
    }

    pub fn next(&mut self) {
        debug_assert!(self.valid(), "next() on an invalid cursor");
        self.position = self
            .position
            .map(|p| p + 1)
            .filter(|&p| p < self.table.slots.len());
    }

    pub fn prev(&mut self) {
        debug_assert!(self.valid(), "prev() on an invalid cursor");
        self.position = self.position.and_then(|p| p.checked_sub(1));
    }

    /// User key at the cursor
    pub fn key(&self) -> &'a [u8] {
        self.table.user_key_at(self.slot())
    }

    /// Value at the cursor (empty for a tombstone)
    pub fn value(&self) -> &'a [u8] {
        self.table.value_at(self.slot())
    }

    pub fn internal_key(&self) -> &'a [u8] {
        self.table.internal_key_at(self.slot())
    }

    pub fn sequence(&self) -> SequenceNumber {
        extract_sequence(self.internal_key())
    }

    pub fn value_type(&self) -> ValueType {
        self.table.value_type_at(self.slot())
    }

    fn slot(&self) -> &'a Slot {
        let table: &'a MemTable = self.table;
        match self.position {
            Some(index) => &table.slots[index],
            None => panic!("MemTableIterator accessed while not positioned on an entry"),
        }
    }
}

/// Ordered iterator returned by [`MemTable::iter`]
pub struct Iter<'a> {
    table: &'a MemTable,
    next: usize,
}

impl<'a> Iterator for Iter<'a> {
    /// (user key, Option<value>) — None value means tombstone
    type Item = (&'a [u8], Option<&'a [u8]>);

    fn next(&mut self) -> Option<Self::Item> {
        let table: &'a MemTable = self.table;
        let slot = table.slots.get(self.next)?;
        self.next += 1;

        let value = match table.value_type_at(slot) {
            ValueType::Value => Some(table.value_at(slot)),
            ValueType::Deletion => None,
        };
        Some((table.user_key_at(slot), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.slots.len() - self.next;
        (remaining, Some(remaining))
    }
}
