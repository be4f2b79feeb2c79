//! Secondary Index Module
//!
//! Maintains the shared index bucket that orders records by time.
//!
//! ## Responsibilities
//! - Build index keys for a record's created/updated timestamps
//! - Insert and remove entries inside the caller's write transaction, so the
//!   index commits or rolls back together with the main bucket
//! - Remember which keys each record owns, so stale entries are found from
//!   stored state rather than the caller's copy of the record
//! - Dump entries for inspection
//!
//! ## Layout
//! ```text
//! index bucket:  {ts}[_{primary key}]_{created|updated}  →  {primary key}
//! refs bucket:   {primary key}  →  IndexRefs { created key, updated key }
//! ```
//! Every index value is the primary key of the record the entry orders.

use redb::{ReadableTable, Table};
use serde::{Deserialize, Serialize};

use crate::config::IndexKeyScheme;
use crate::error::{Result, StoreError};
use crate::keys::{self, IndexKind};
use crate::record::codec;

/// Writable byte table as handed out by a write transaction
pub type ByteTable<'txn> = Table<'txn, &'static [u8], &'static [u8]>;

/// A decoded index entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Index key as stored
    pub key: String,
    /// Primary key the entry resolves to
    pub primary_key: String,
    /// `None` for keys without a recognised suffix
    pub kind: Option<IndexKind>,
}

/// Index keys written for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRefs {
    pub created: Vec<u8>,
    pub updated: Vec<u8>,
}

/// Builds and applies index mutations
#[derive(Debug, Clone, Copy)]
pub struct IndexManager {
    scheme: IndexKeyScheme,
}

impl IndexManager {
    pub fn new(scheme: IndexKeyScheme) -> Self {
        Self { scheme }
    }

    /// Index key for one timestamp of one record
    pub fn key(&self, ts: i64, kind: IndexKind, primary_key: &[u8]) -> Vec<u8> {
        keys::index_key(self.scheme, ts, kind, primary_key)
    }

    /// Both index keys for a record's stamps
    pub fn refs_for(&self, created: i64, updated: i64, primary_key: &[u8]) -> IndexRefs {
        IndexRefs {
            created: self.key(created, IndexKind::Created, primary_key),
            updated: self.key(updated, IndexKind::Updated, primary_key),
        }
    }

    /// Insert `key → primary_key`, replacing any entry already under `key`
    pub fn add_index(table: &mut ByteTable<'_>, primary_key: &[u8], key: &[u8]) -> Result<()> {
        table.insert(key, primary_key)?;
        Ok(())
    }

    /// Remove `key` if it still belongs to `primary_key`
    ///
    /// Under the legacy scheme another record may have taken over the key in
    /// the same second; its entry is left alone. Returns whether an entry was
    /// removed. A missing key is not an error.
    pub fn delete_index(table: &mut ByteTable<'_>, key: &[u8], primary_key: &[u8]) -> Result<bool> {
        let owned = match table.get(key)? {
            Some(current) => current.value() == primary_key,
            None => false,
        };
        if owned {
            table.remove(key)?;
        }
        Ok(owned)
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    /// Keys recorded for `primary_key`, if any
    pub fn refs(table: &ByteTable<'_>, primary_key: &[u8]) -> Result<Option<IndexRefs>> {
        match table.get(primary_key)? {
            Some(raw) => codec::decode(raw.value())
                .map(Some)
                .map_err(StoreError::Serialization),
            None => Ok(None),
        }
    }

    /// Record `refs` as the keys `primary_key` owns
    pub fn set_refs(table: &mut ByteTable<'_>, primary_key: &[u8], refs: &IndexRefs) -> Result<()> {
        let raw = codec::encode(refs).map_err(StoreError::Serialization)?;
        table.insert(primary_key, raw.as_slice())?;
        Ok(())
    }

    /// Forget the keys of `primary_key`, returning what was recorded
    pub fn take_refs(table: &mut ByteTable<'_>, primary_key: &[u8]) -> Result<Option<IndexRefs>> {
        let refs = Self::refs(table, primary_key)?;
        if refs.is_some() {
            table.remove(primary_key)?;
        }
        Ok(refs)
    }

    /// Remove both entries in `refs` that still belong to `primary_key`
    ///
    /// `_created` goes first; the first failure is returned.
    pub fn unlink(index: &mut ByteTable<'_>, refs: &IndexRefs, primary_key: &[u8]) -> Result<()> {
        Self::delete_index(index, &refs.created, primary_key)?;
        Self::delete_index(index, &refs.updated, primary_key)?;
        Ok(())
    }

    /// All entries in key order
    pub fn entries<T>(table: &T) -> Result<Vec<IndexEntry>>
    where
        T: ReadableTable<&'static [u8], &'static [u8]>,
    {
        let mut entries = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            let key = key.value();
            entries.push(IndexEntry {
                key: String::from_utf8_lossy(key).into_owned(),
                primary_key: String::from_utf8_lossy(value.value()).into_owned(),
                kind: IndexKind::of(key),
            });
        }
        Ok(entries)
    }
}
