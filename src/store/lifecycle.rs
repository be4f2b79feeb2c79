//! Record lifecycle: create, read, update, delete
//!
//! Each mutation is one write transaction:
//! ```text
//! begin_write ─► refs bucket (owned keys) ─► index bucket (add/remove) ─► main bucket (put/remove) ─► commit
//! ```
//! Any failure before commit drops the transaction, which rolls back every
//! change made in it, so the index never drifts from the main bucket.
//!
//! Stale index entries are located through the refs bucket, not through the
//! caller's copy of the record. Records stored without refs fall back to the
//! caller's timestamps on update and delete.

use redb::ReadableTable;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::index::{IndexManager, IndexRefs};
use crate::keys::{self, IndexKind};
use crate::record::Record;

use super::{not_serializable, open_optional, Store};

impl Store {
    /// Persist a new record
    ///
    /// Steps:
    /// 1. Assign a UUID if the record accepts one
    /// 2. Stamp created = updated = now if the record tracks time
    /// 3. In one write transaction: drop the index entries of any record
    ///    already stored under the key, add both new entries, put the record
    ///
    /// An existing record under the same key is overwritten. If encoding
    /// fails the record's id and stamps are restored and nothing is written.
    pub fn create<R: Record>(&self, record: &mut R) -> Result<()> {
        let _enter = self.span.enter();

        if record.as_serializable().is_none() {
            return Err(not_serializable::<R>());
        }

        let previous_id = record.id().to_string();
        let previous_stamps = stamps_of(record);

        if let Some(identity) = record.as_identity_mut() {
            identity.set_id(Uuid::new_v4().to_string());
        }

        if let Some(times) = record.as_timestamps_mut() {
            let now = self.clock.now_unix();
            times.set_created(now);
            times.set_updated(now);
        }

        let value = match marshal(record) {
            Ok(value) => value,
            Err(e) => {
                restore(record, previous_id, previous_stamps);
                return Err(e);
            }
        };
        let primary = keys::primary_key(record.namespace(), record.id());
        let fresh = stamps_of(record)
            .map(|(created, updated)| self.index.refs_for(created, updated, &primary));

        let replaced = self.with_db(|db| {
            let txn = db.begin_write()?;
            let stale = {
                let mut refs = txn.open_table(self.refs_bucket())?;
                let stale = IndexManager::take_refs(&mut refs, &primary)?;

                if stale.is_some() || fresh.is_some() {
                    let mut index = txn.open_table(self.index_bucket())?;
                    if let Some(stale) = &stale {
                        IndexManager::unlink(&mut index, stale, &primary)?;
                    }
                    if let Some(fresh) = &fresh {
                        IndexManager::add_index(&mut index, &primary, &fresh.created)?;
                        IndexManager::add_index(&mut index, &primary, &fresh.updated)?;
                        IndexManager::set_refs(&mut refs, &primary, fresh)?;
                    }
                }

                let mut main = txn.open_table(self.main_bucket())?;
                main.insert(primary.as_slice(), value.as_slice())?;
                stale
            };
            txn.commit()?;
            Ok(stale.is_some())
        })?;

        tracing::debug!(
            namespace = record.namespace(),
            id = record.id(),
            indexed = fresh.is_some(),
            replaced,
            "Record created"
        );
        Ok(())
    }

    /// Load a record in place by namespace + id
    ///
    /// Returns `RecordNotFound` if the key (or the whole bucket) is absent.
    pub fn read<R: Record>(&self, record: &mut R) -> Result<()> {
        let _enter = self.span.enter();

        if record.as_serializable().is_none() {
            return Err(not_serializable::<R>());
        }
        let primary = keys::primary_key(record.namespace(), record.id());

        let bytes = self.with_db(|db| {
            let txn = db.begin_read()?;
            let Some(main) = open_optional(&txn, self.main_bucket())? else {
                return Err(StoreError::RecordNotFound);
            };
            let found = main.get(primary.as_slice())?;
            match found {
                Some(value) => Ok(value.value().to_vec()),
                None => Err(StoreError::RecordNotFound),
            }
        })?;

        unmarshal(record, &bytes)
    }

    /// Overwrite a record, refreshing its `_updated` index entry
    ///
    /// The `_created` entry is never touched. If encoding fails the record's
    /// previous updated time is restored and nothing is written.
    pub fn update<R: Record>(&self, record: &mut R) -> Result<()> {
        let _enter = self.span.enter();

        if record.as_serializable().is_none() {
            return Err(not_serializable::<R>());
        }

        let primary = keys::primary_key(record.namespace(), record.id());
        let now = self.clock.now_unix();
        let previous = record.as_timestamps_mut().map(|times| {
            let previous = (times.created(), times.updated());
            times.set_updated(now);
            previous
        });

        let value = match marshal(record) {
            Ok(value) => value,
            Err(e) => {
                if let (Some((_, updated)), Some(times)) = (previous, record.as_timestamps_mut()) {
                    times.set_updated(updated);
                }
                return Err(e);
            }
        };

        self.with_db(|db| {
            let txn = db.begin_write()?;
            {
                if let Some((created, updated)) = previous {
                    let mut refs = txn.open_table(self.refs_bucket())?;
                    let mut index = txn.open_table(self.index_bucket())?;

                    let owned = match IndexManager::refs(&refs, &primary)? {
                        Some(owned) => owned,
                        None => self.index.refs_for(created, updated, &primary),
                    };
                    IndexManager::delete_index(&mut index, &owned.updated, &primary)?;

                    let fresh = IndexRefs {
                        created: owned.created,
                        updated: self.index.key(now, IndexKind::Updated, &primary),
                    };
                    IndexManager::add_index(&mut index, &primary, &fresh.updated)?;
                    IndexManager::set_refs(&mut refs, &primary, &fresh)?;
                }

                let mut main = txn.open_table(self.main_bucket())?;
                main.insert(primary.as_slice(), value.as_slice())?;
            }
            txn.commit()?;
            Ok(())
        })?;

        tracing::debug!(
            namespace = record.namespace(),
            id = record.id(),
            previous_updated = ?previous.map(|(_, updated)| updated),
            "Record updated"
        );
        Ok(())
    }

    /// Remove a record and both of its index entries
    ///
    /// Steps run in a fixed order inside one transaction: main entry,
    /// `_created` entry, `_updated` entry. The first failure aborts the
    /// transaction and is the error returned. Deleting an absent record is
    /// not an error.
    ///
    /// Only namespace and id are needed: the entries removed are the ones the
    /// store holds for the key, whatever stamps `record` carries.
    pub fn delete<R: Record>(&self, record: &R) -> Result<()> {
        let _enter = self.span.enter();

        let primary = keys::primary_key(record.namespace(), record.id());
        let stamps = stamps_of(record);

        let removed = self.with_db(|db| {
            let txn = db.begin_write()?;
            let removed = {
                let mut main = txn.open_table(self.main_bucket())?;
                let removed = main.remove(primary.as_slice())?.is_some();

                let mut refs = txn.open_table(self.refs_bucket())?;
                let owned = match IndexManager::take_refs(&mut refs, &primary)? {
                    Some(owned) => Some(owned),
                    None => stamps
                        .map(|(created, updated)| self.index.refs_for(created, updated, &primary)),
                };
                if let Some(owned) = owned {
                    let mut index = txn.open_table(self.index_bucket())?;
                    IndexManager::unlink(&mut index, &owned, &primary)?;
                }
                removed
            };
            txn.commit()?;
            Ok(removed)
        })?;

        tracing::debug!(
            namespace = record.namespace(),
            id = record.id(),
            removed,
            "Record deleted"
        );
        Ok(())
    }
}

fn stamps_of<R: Record>(record: &R) -> Option<(i64, i64)> {
    record
        .as_timestamps()
        .map(|times| (times.created(), times.updated()))
}

/// Undo the id and stamps `create` assigned
fn restore<R: Record>(record: &mut R, id: String, stamps: Option<(i64, i64)>) {
    if let Some(identity) = record.as_identity_mut() {
        identity.set_id(id);
    }
    if let (Some((created, updated)), Some(times)) = (stamps, record.as_timestamps_mut()) {
        times.set_created(created);
        times.set_updated(updated);
    }
}

fn marshal<R: Record>(record: &R) -> Result<Vec<u8>> {
    let serializable = record.as_serializable().ok_or_else(not_serializable::<R>)?;
    serializable.marshal().map_err(StoreError::Serialization)
}

pub(super) fn unmarshal<R: Record>(record: &mut R, bytes: &[u8]) -> Result<()> {
    let serializable = record
        .as_serializable_mut()
        .ok_or_else(not_serializable::<R>)?;
    serializable.unmarshal(bytes).map_err(StoreError::Serialization)
}
