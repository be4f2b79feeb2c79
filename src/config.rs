//! Configuration for recordstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Main configuration for a record store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // File Location
    // -------------------------------------------------------------------------
    /// Directory holding the database file. Must already exist.
    pub root: PathBuf,

    /// Database file name without extension
    /// Resolved file: {root}/{db_name}.db
    pub db_name: String,

    // -------------------------------------------------------------------------
    // Bucket Configuration
    // -------------------------------------------------------------------------
    /// Main bucket: primary key → serialized record
    pub bucket: String,

    /// Shared index bucket: time-ordered key → primary key
    pub index_bucket: String,

    /// How index keys are laid out
    pub index_key_scheme: IndexKeyScheme,
}

/// Index key layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexKeyScheme {
    /// `"<ts>_created"` / `"<ts>_updated"`
    ///
    /// Byte-compatible with stores written by older handlers. Two records
    /// stamped within the same second share one index key, so the later
    /// write hides the earlier one from time-ordered listings.
    Legacy,

    /// `"<ts:020>_<primary key>_created"` / `"..._updated"`
    ///
    /// One entry per record per kind; timestamps are zero-padded so byte order
    /// matches numeric order for every non-negative timestamp.
    #[default]
    Unique,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./recordstore_data"),
            db_name: "store".to_string(),
            bucket: "records".to_string(),
            index_bucket: Self::DEFAULT_INDEX_BUCKET.to_string(),
            index_key_scheme: IndexKeyScheme::Unique,
        }
    }
}

impl Config {
    /// Index bucket name used by older handlers
    pub const DEFAULT_INDEX_BUCKET: &'static str = "Index";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Name of the storage backend
    pub fn handler(&self) -> &'static str {
        "redb"
    }

    /// Reverse bucket holding each record's current index keys
    ///
    /// Derived from the index bucket: `Index` → `IndexRefs`.
    pub fn refs_bucket(&self) -> String {
        format!("{}Refs", self.index_bucket)
    }

    /// Full path of the database file
    pub fn store_file(&self) -> PathBuf {
        self.root.join(format!("{}.db", self.db_name))
    }

    /// Reject configurations that cannot address a store
    pub fn validate(&self) -> Result<()> {
        if self.db_name.is_empty() {
            return Err(StoreError::Config("database name must not be empty".into()));
        }
        if self.bucket.is_empty() {
            return Err(StoreError::Config("bucket name must not be empty".into()));
        }
        if self.index_bucket.is_empty() {
            return Err(StoreError::Config("index bucket name must not be empty".into()));
        }
        if self.bucket == self.index_bucket {
            return Err(StoreError::Config(format!(
                "bucket and index bucket must differ (both are {:?})",
                self.bucket
            )));
        }
        if self.bucket == self.refs_bucket() {
            return Err(StoreError::Config(format!(
                "bucket {:?} collides with the index reference bucket",
                self.bucket
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the root directory
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root = path.into();
        self
    }

    /// Set the database file name (without `.db`)
    pub fn db_name(mut self, name: impl Into<String>) -> Self {
        self.config.db_name = name.into();
        self
    }

    /// Set the main bucket name
    pub fn bucket(mut self, name: impl Into<String>) -> Self {
        self.config.bucket = name.into();
        self
    }

    /// Set the index bucket name
    pub fn index_bucket(mut self, name: impl Into<String>) -> Self {
        self.config.index_bucket = name.into();
        self
    }

    /// Set the index key scheme
    pub fn index_key_scheme(mut self, scheme: IndexKeyScheme) -> Self {
        self.config.index_key_scheme = scheme;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
