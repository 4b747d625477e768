//! Deduplicated record storage
//!
//! Builds the data segment incrementally. Each distinct [`RecordTuple`] is
//! encoded once; equal tuples get the same [`RecordId`] and the same offset.

use crate::records::RecordTuple;
use rustc_hash::FxHashMap;

/// Position of a record in the pool (insertion order of distinct tuples)
pub type RecordId = u32;

/// Offset of the first record: byte 0 of the data segment is the separator
pub const FIRST_RECORD_OFFSET: u32 = 1;

/// Data segment builder with deduplication
#[derive(Debug, Clone)]
pub struct RecordPool {
    /// Tuple to record id
    ids: FxHashMap<RecordTuple, RecordId>,
    /// Tuples by record id
    tuples: Vec<RecordTuple>,
    /// Data-segment offset by record id
    offsets: Vec<u32>,
    /// Concatenated encodings in offset order
    data: Vec<u8>,
}

impl RecordPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            ids: FxHashMap::default(),
            tuples: Vec::new(),
            offsets: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Register a record and return its id
    ///
    /// If an equal record was registered before, returns the existing id.
    pub fn insert(&mut self, record: RecordTuple) -> RecordId {
        if let Some(&id) = self.ids.get(&record) {
            return id;
        }

        let id = self.tuples.len() as RecordId;
        let offset = FIRST_RECORD_OFFSET + self.data.len() as u32;
        record.encode_into(&mut self.data);
        self.offsets.push(offset);
        self.tuples.push(record.clone());
        self.ids.insert(record, id);
        id
    }

    /// Data-segment offset of a record
    pub fn offset(&self, id: RecordId) -> u32 {
        self.offsets[id as usize]
    }

    /// Record by id
    pub fn get(&self, id: RecordId) -> Option<&RecordTuple> {
        self.tuples.get(id as usize)
    }

    /// Id of an already registered record
    pub fn id_of(&self, record: &RecordTuple) -> Option<RecordId> {
        self.ids.get(record).copied()
    }

    /// Number of distinct records
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    /// True when no record was registered
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Encoded records in offset order (without the leading separator)
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Default for RecordPool {
    fn default() -> Self {
        Self::new()
    }
}
