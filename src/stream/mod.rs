//! Append-mostly stream log.
//!
//! A [`Stream`] maps [`StreamId`]s to field/value payloads. Entries are kept
//! in a radix tree under their 16-byte encoded IDs, so ascending key order is
//! ascending ID order and range queries are cursor walks.

mod id;

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

pub use id::{ParsedId, RangeBound, StreamId, ENCODED_LEN, MAX_ID_LEN};

use crate::art::{Cursor, SeekOp, Tree};
use crate::error::{Error, Result};
use crate::store::Object;

/// Field/value pairs of one entry, in insertion order.
pub type Fields = Vec<(String, String)>;

/// An ordered log of entries keyed by monotonically increasing IDs.
#[derive(Default)]
pub struct Stream {
    tree: Tree<Fields>,
    length: u64,
    first_id: StreamId,
    last_id: StreamId,
    max_deleted_entry: StreamId,
    total_entries: u64,
}

impl Stream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// View a stored object as a stream.
    pub fn from_object(object: &Object) -> Result<&Stream> {
        match object {
            Object::Stream(stream) => Ok(stream),
            _ => Err(Error::WrongType),
        }
    }

    /// Mutable view of a stored object as a stream.
    pub fn from_object_mut(object: &mut Object) -> Result<&mut Stream> {
        match object {
            Object::Stream(stream) => Ok(stream),
            _ => Err(Error::WrongType),
        }
    }

    /// Number of entries currently held.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Whether the stream holds no entries.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// ID of the oldest entry, `0-0` when empty.
    pub fn first_id(&self) -> StreamId {
        self.first_id
    }

    /// ID of the newest entry ever added.
    pub fn last_id(&self) -> StreamId {
        self.last_id
    }

    /// Largest ID removed by trimming.
    pub fn max_deleted_entry(&self) -> StreamId {
        self.max_deleted_entry
    }

    /// Entries ever added, including removed ones.
    pub fn total_entries(&self) -> u64 {
        self.total_entries
    }

    /// Whether no ID can follow the last one.
    pub fn is_exhausted(&self) -> bool {
        self.last_id == StreamId::MAX
    }

    /// Look up one entry.
    pub fn get(&self, id: StreamId) -> Option<&Fields> {
        self.tree.get(&id.encode())
    }

    /// The ID the next auto-assigned append would receive.
    pub fn next_id(&self) -> Result<StreamId> {
        self.next_id_at(now_ms())
    }

    /// [`next_id`](Stream::next_id) against a supplied clock reading.
    ///
    /// A clock behind the last ID never yields a smaller ID: the successor of
    /// the last ID is used instead.
    pub fn next_id_at(&self, now_ms: u64) -> Result<StreamId> {
        if now_ms > self.last_id.ms() {
            return Ok(StreamId::new(now_ms, 0));
        }
        let mut id = self.last_id;
        id.incr()?;
        Ok(id)
    }

    /// Append with an auto-assigned ID.
    pub fn append(&mut self, fields: Fields) -> Result<StreamId> {
        self.append_at(now_ms(), fields)
    }

    /// [`append`](Stream::append) against a supplied clock reading.
    pub fn append_at(&mut self, now_ms: u64, fields: Fields) -> Result<StreamId> {
        if self.is_exhausted() {
            return Err(Error::Exhausted);
        }
        let id = self.next_id_at(now_ms)?;
        self.insert_entry(id, fields);
        Ok(id)
    }

    /// Append with a client-chosen ID.
    ///
    /// When `seq_given` is false only the millisecond part of `id` counts and
    /// the sequence is derived from the last ID.
    pub fn append_with_id(&mut self, id: StreamId, seq_given: bool, fields: Fields) -> Result<StreamId> {
        if seq_given && id.is_zero() {
            return Err(Error::ZeroId);
        }
        let id = if seq_given {
            id
        } else if id.ms() == self.last_id.ms() {
            if self.last_id.seq() == u64::MAX {
                debug!(%id, last = %self.last_id, "no sequence left in millisecond");
                return Err(Error::NonMonotonicId);
            }
            StreamId::new(id.ms(), self.last_id.seq() + 1)
        } else {
            StreamId::new(id.ms(), 0)
        };

        if id.is_zero() {
            return Err(Error::ZeroId);
        }
        if id <= self.last_id {
            debug!(%id, last = %self.last_id, "rejected non-monotonic id");
            return Err(Error::NonMonotonicId);
        }
        self.insert_entry(id, fields);
        Ok(id)
    }

    fn insert_entry(&mut self, id: StreamId, fields: Fields) {
        self.tree.insert(&id.encode(), fields);
        if self.length == 0 {
            self.first_id = id;
        }
        self.length += 1;
        self.total_entries += 1;
        self.last_id = id;
    }

    /// Walk entries starting at the near edge of `[start, end]`.
    ///
    /// Forward walks begin at `start`, reverse walks at `end`. Only the near
    /// edge is applied; the caller stops at the far edge and enforces any
    /// count limit.
    pub fn range(&self, start: StreamId, end: StreamId, reverse: bool) -> StreamRange<'_> {
        let (mut cursor, near) = if reverse {
            (self.tree.reverse_iter(), end)
        } else {
            (self.tree.iter(), start)
        };
        if !cursor.seek_le(&near.encode()) {
            if reverse {
                cursor.seek_to_last();
            } else {
                cursor.seek_to_first();
            }
        }
        StreamRange {
            cursor,
            near,
            reverse,
        }
    }

    /// All entries in ascending ID order.
    pub fn iter(&self) -> StreamRange<'_> {
        self.range(StreamId::MIN, StreamId::MAX, false)
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("length", &self.length)
            .field("first_id", &self.first_id)
            .field("last_id", &self.last_id)
            .field("total_entries", &self.total_entries)
            .finish()
    }
}

/// Entries of a [`Stream`] from a starting edge onwards.
pub struct StreamRange<'a> {
    cursor: Cursor<'a, Fields>,
    near: StreamId,
    reverse: bool,
}

impl<'a> Iterator for StreamRange<'a> {
    type Item = (StreamId, &'a Fields);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (key, fields) = self.cursor.next()?;
            let id = StreamId::decode(key)?;
            // The floor seek can land one entry before the near edge.
            let before_near = if self.reverse {
                id > self.near
            } else {
                id < self.near
            };
            if !before_near {
                return Some((id, fields));
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
