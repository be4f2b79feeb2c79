//! Shared fixtures for store tests

#![allow(dead_code)]

use std::sync::Arc;

use recordstore::record::codec;
use recordstore::{
    BoxError, Config, IdentityAssignable, IndexKeyScheme, ManualClock, Record, Serializable,
    Store, TimestampTracked,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

/// Clock value every fixture store starts at
pub const START: i64 = 1_700_000_000;

// =============================================================================
// Fixture Records
// =============================================================================

/// Serializable + TimestampTracked
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub namespace: String,
    pub id: String,
    pub body: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Makes `marshal` fail
    #[serde(skip)]
    pub poisoned: bool,
}

impl Note {
    pub fn new(namespace: &str, id: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            id: id.to_string(),
            body: format!("body of {}", id),
            ..Default::default()
        }
    }

    /// Empty record used as a listing factory
    pub fn factory(namespace: &str) -> impl Fn() -> Note + '_ {
        move || Note {
            namespace: namespace.to_string(),
            ..Default::default()
        }
    }
}

impl Serializable for Note {
    fn marshal(&self) -> Result<Vec<u8>, BoxError> {
        if self.poisoned {
            return Err("poisoned note".into());
        }
        codec::encode(self)
    }

    fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        codec::decode_into(self, bytes)
    }
}

impl TimestampTracked for Note {
    fn created(&self) -> i64 {
        self.created_at
    }
    fn set_created(&mut self, ts: i64) {
        self.created_at = ts;
    }
    fn updated(&self) -> i64 {
        self.updated_at
    }
    fn set_updated(&mut self, ts: i64) {
        self.updated_at = ts;
    }
}

impl Record for Note {
    fn namespace(&self) -> &str {
        &self.namespace
    }
    fn id(&self) -> &str {
        &self.id
    }
    fn as_serializable(&self) -> Option<&dyn Serializable> {
        Some(self)
    }
    fn as_serializable_mut(&mut self) -> Option<&mut dyn Serializable> {
        Some(self)
    }
    fn as_timestamps(&self) -> Option<&dyn TimestampTracked> {
        Some(self)
    }
    fn as_timestamps_mut(&mut self) -> Option<&mut dyn TimestampTracked> {
        Some(self)
    }
}

/// Serializable + IdentityAssignable, no timestamps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub namespace: String,
    pub id: String,
    pub title: String,
    /// Makes `marshal` fail
    #[serde(skip)]
    pub poisoned: bool,
}

impl Serializable for Ticket {
    fn marshal(&self) -> Result<Vec<u8>, BoxError> {
        if self.poisoned {
            return Err("poisoned ticket".into());
        }
        codec::encode(self)
    }

    fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        codec::decode_into(self, bytes)
    }
}

impl IdentityAssignable for Ticket {
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Record for Ticket {
    fn namespace(&self) -> &str {
        &self.namespace
    }
    fn id(&self) -> &str {
        &self.id
    }
    fn as_serializable(&self) -> Option<&dyn Serializable> {
        Some(self)
    }
    fn as_serializable_mut(&mut self) -> Option<&mut dyn Serializable> {
        Some(self)
    }
    fn as_identity_mut(&mut self) -> Option<&mut dyn IdentityAssignable> {
        Some(self)
    }
}

/// No capabilities at all
#[derive(Debug, Clone, Default)]
pub struct Opaque {
    pub namespace: String,
    pub id: String,
}

impl Record for Opaque {
    fn namespace(&self) -> &str {
        &self.namespace
    }
    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

pub fn test_config(dir: &TempDir, scheme: IndexKeyScheme) -> Config {
    Config::builder()
        .root(dir.path())
        .db_name("ssBolt")
        .bucket("ss-curator")
        .index_key_scheme(scheme)
        .build()
}

/// Store on a temp dir with a manual clock at `START`
pub fn setup_store(scheme: IndexKeyScheme) -> (TempDir, Arc<ManualClock>, Store) {
    let temp_dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(START));
    let store = Store::builder(test_config(&temp_dir, scheme))
        .clock(clock.clone())
        .open()
        .unwrap();
    (temp_dir, clock, store)
}

/// Create `ids` in `namespace`, one clock second apart
pub fn create_notes(store: &Store, clock: &ManualClock, namespace: &str, ids: &[&str]) -> Vec<Note> {
    ids.iter()
        .map(|id| {
            clock.advance(1);
            let mut note = Note::new(namespace, id);
            store.create(&mut note).unwrap();
            note
        })
        .collect()
}

pub fn ids(notes: &[Note]) -> Vec<String> {
    notes.iter().map(|n| n.id.clone()).collect()
}
