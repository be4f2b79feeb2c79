//! Key encoding
//!
//! ## Primary keys
//! ```text
//! {namespace}_{id}
//! ```
//! Natural listing walks these in byte order, so records group by namespace
//! as long as no namespace equals another namespace followed by `_`.
//!
//! ## Index keys
//! ```text
//! Legacy:  {ts}_{kind}
//! Unique:  {ts:020}_{namespace}_{id}_{kind}
//! ```
//! `kind` is `created` or `updated`; both kinds share one index bucket and are
//! told apart by suffix only. Legacy keys compare numerically only while all
//! timestamps have the same number of digits (Unix seconds until 2286).

use crate::config::IndexKeyScheme;

/// Separator between key components
pub const SEPARATOR: u8 = b'_';

/// Which timestamp an index entry orders by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Created,
    Updated,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Created => "created",
            IndexKind::Updated => "updated",
        }
    }

    /// Key suffix including the separator, e.g. `_created`
    pub fn suffix(&self) -> &'static [u8] {
        match self {
            IndexKind::Created => b"_created",
            IndexKind::Updated => b"_updated",
        }
    }

    /// Does this index key belong to this kind
    pub fn matches(&self, index_key: &[u8]) -> bool {
        index_key.ends_with(self.suffix())
    }

    /// Classify an index key by suffix
    pub fn of(index_key: &[u8]) -> Option<IndexKind> {
        [IndexKind::Created, IndexKind::Updated]
            .into_iter()
            .find(|kind| kind.matches(index_key))
    }
}

/// Build the primary key `namespace_id`
pub fn primary_key(namespace: &str, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(namespace.len() + 1 + id.len());
    key.extend_from_slice(namespace.as_bytes());
    key.push(SEPARATOR);
    key.extend_from_slice(id.as_bytes());
    key
}

/// Prefix shared by every primary key in a namespace
pub fn namespace_prefix(namespace: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(namespace.len() + 1);
    prefix.extend_from_slice(namespace.as_bytes());
    prefix.push(SEPARATOR);
    prefix
}

/// Build an index key for a record's timestamp
///
/// `primary_key` is only part of the key under [`IndexKeyScheme::Unique`].
pub fn index_key(scheme: IndexKeyScheme, ts: i64, kind: IndexKind, primary_key: &[u8]) -> Vec<u8> {
    match scheme {
        IndexKeyScheme::Legacy => format!("{}_{}", ts, kind.as_str()).into_bytes(),
        IndexKeyScheme::Unique => {
            let stamp = format!("{:020}", ts);
            let mut key =
                Vec::with_capacity(stamp.len() + primary_key.len() + kind.suffix().len() + 1);
            key.extend_from_slice(stamp.as_bytes());
            key.push(SEPARATOR);
            key.extend_from_slice(primary_key);
            key.extend_from_slice(kind.suffix());
            key
        }
    }
}
