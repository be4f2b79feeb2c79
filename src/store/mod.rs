//! Store Module
//!
//! The record store that coordinates keys, the index and the main bucket.
//!
//! ## Responsibilities
//! - Own the engine handle and its lifecycle (open/close)
//! - Run each create/update/delete as ONE write transaction covering the
//!   index bucket, its refs bucket and the main bucket
//! - Run each read/list as ONE read transaction
//!
//! ## Concurrency Model
//! The engine allows a single writer and any number of snapshot readers.
//! The handle sits behind an `RwLock<Option<Database>>`: every operation holds
//! the read guard for its whole duration and `close()` takes the write guard,
//! so closing waits for in-flight operations and later calls see `Closed`.

mod lifecycle;
mod list;
mod token;

pub use list::{ListOptions, PartialList, SortOrder};
pub use token::{Page, PageToken};

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use redb::{
    Database, ReadOnlyTable, ReadTransaction, ReadableTable, TableDefinition, TableError, TableHandle,
};
use tracing::Span;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::index::{IndexEntry, IndexManager};
use crate::keys::{self, IndexKind};
use crate::record::Record;

type ByteTableDef<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;
type ReadTable = ReadOnlyTable<&'static [u8], &'static [u8]>;

/// Entry counts across both buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub records: u64,
    pub created_entries: u64,
    pub updated_entries: u64,
}

/// Persistent typed record store
pub struct Store {
    config: Config,

    /// Resolved database file
    path: PathBuf,

    /// `None` once closed
    db: RwLock<Option<Database>>,

    clock: Arc<dyn Clock>,

    index: IndexManager,

    /// Name of the bucket mapping primary keys to their index keys
    refs_bucket: String,

    /// Parent span for every event the store emits
    span: Span,
}

/// Builder for Store
pub struct StoreBuilder {
    config: Config,
    clock: Option<Arc<dyn Clock>>,
    span: Option<Span>,
}

impl StoreBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clock: None,
            span: None,
        }
    }

    /// Time source for created/updated stamps (default: wall clock)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Span the store logs under (default: `recordstore` with path and bucket)
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Open or create the database file
    ///
    /// The root directory must exist. A new file is created owner-only.
    pub fn open(self) -> Result<Store> {
        self.config.validate()?;

        let path = self.config.store_file();
        let span = self.span.unwrap_or_else(|| {
            tracing::info_span!(
                "recordstore",
                path = %path.display(),
                bucket = %self.config.bucket
            )
        });

        let db = {
            let _enter = span.enter();
            let file = open_store_file(&path)?;
            let db = redb::Builder::new().create_file(file)?;
            tracing::info!(
                handler = self.config.handler(),
                scheme = ?self.config.index_key_scheme,
                "Store opened"
            );
            db
        };

        Ok(Store {
            index: IndexManager::new(self.config.index_key_scheme),
            refs_bucket: self.config.refs_bucket(),
            config: self.config,
            path,
            db: RwLock::new(Some(db)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            span,
        })
    }
}

impl Store {
    /// Open with the wall clock and default span
    pub fn open(config: Config) -> Result<Self> {
        StoreBuilder::new(config).open()
    }

    pub fn builder(config: Config) -> StoreBuilder {
        StoreBuilder::new(config)
    }

    /// Release the engine handle
    ///
    /// Idempotent. Waits for in-flight operations to finish.
    pub fn close(&self) -> Result<()> {
        let _enter = self.span.enter();
        if self.db.write().take().is_some() {
            tracing::info!("Store closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.db.read().is_none()
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Every index entry in key order
    pub fn index_entries(&self) -> Result<Vec<IndexEntry>> {
        self.with_db(|db| {
            let txn = db.begin_read()?;
            match self.open_index_bucket(&txn)? {
                Some(table) => IndexManager::entries(&table),
                None => Ok(Vec::new()),
            }
        })
    }

    /// Primary keys in natural order, optionally limited to one namespace
    pub fn primary_keys(&self, namespace: Option<&str>) -> Result<Vec<String>> {
        self.with_db(|db| {
            let txn = db.begin_read()?;
            let Some(table) = open_optional(&txn, self.main_bucket())? else {
                return Ok(Vec::new());
            };

            let prefix = namespace.map(keys::namespace_prefix).unwrap_or_default();
            let mut found = Vec::new();
            for item in table.range::<&[u8]>(prefix.as_slice()..)? {
                let (key, _) = item?;
                let key = key.value();
                if !key.starts_with(&prefix) {
                    break;
                }
                found.push(String::from_utf8_lossy(key).into_owned());
            }
            Ok(found)
        })
    }

    /// Count records and index entries in one snapshot
    pub fn stats(&self) -> Result<StoreStats> {
        self.with_db(|db| {
            let txn = db.begin_read()?;
            let mut stats = StoreStats::default();

            if let Some(table) = open_optional(&txn, self.main_bucket())? {
                for item in table.iter()? {
                    item?;
                    stats.records += 1;
                }
            }
            if let Some(table) = self.open_index_bucket(&txn)? {
                for item in table.iter()? {
                    let (key, _) = item?;
                    match IndexKind::of(key.value()) {
                        Some(IndexKind::Created) => stats.created_entries += 1,
                        Some(IndexKind::Updated) => stats.updated_entries += 1,
                        None => {}
                    }
                }
            }
            Ok(stats)
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Run `f` against the open engine, or fail with `Closed`
    fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        f(db)
    }

    fn main_bucket(&self) -> ByteTableDef<'_> {
        TableDefinition::new(&self.config.bucket)
    }

    fn index_bucket(&self) -> ByteTableDef<'_> {
        TableDefinition::new(&self.config.index_bucket)
    }

    fn refs_bucket(&self) -> ByteTableDef<'_> {
        TableDefinition::new(&self.refs_bucket)
    }

    fn open_index_bucket(&self, txn: &ReadTransaction) -> Result<Option<ReadTable>> {
        open_optional(txn, self.index_bucket())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// `StoreError::NotSerializable` for a record type
fn not_serializable<R: Record>() -> StoreError {
    StoreError::NotSerializable {
        type_name: std::any::type_name::<R>(),
    }
}

/// Open a bucket for reading; `None` if it was never created
fn open_optional(txn: &ReadTransaction, def: ByteTableDef<'_>) -> Result<Option<ReadTable>> {
    match txn.open_table(def) {
        Ok(table) => Ok(Some(table)),
        Err(TableError::TableDoesNotExist(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Open a bucket for reading; `BucketNotFound` if it was never created
fn open_required(txn: &ReadTransaction, def: ByteTableDef<'_>) -> Result<ReadTable> {
    let name = def.name().to_string();
    open_optional(txn, def)?.ok_or(StoreError::BucketNotFound(name))
}

/// Open (or create) the database file with owner-only permissions
fn open_store_file(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    Ok(options.open(path)?)
}
