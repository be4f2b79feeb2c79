//! Seek-based paging
//!
//! A [`PageToken`] remembers the sort order and the last source-bucket key a
//! page returned. The next call seeks straight past that key instead of
//! re-counting from the start of the bucket, so every page costs the same.
//!
//! Unlike skip paging, a token pins the position, not the offset: records
//! written behind it between calls are not seen, and deletions do not shift
//! later pages.
//!
//! ## Token Format
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────┬──────────┐
//! │Version(1)│ Sort (1) │ Len (4)  │  Key (Len)  │ CRC32(4) │
//! └──────────┴──────────┴──────────┴─────────────┴──────────┘
//! ```
//! Integers are big-endian; the CRC covers everything before it. The bytes
//! are hex encoded for transport.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::record::Record;

use super::list::{PartialList, Scan, SortOrder};
use super::{not_serializable, Store};

const TOKEN_VERSION: u8 = 1;

/// Version + sort + key length
const TOKEN_HEADER_SIZE: usize = 6;

const TOKEN_CRC_SIZE: usize = 4;

/// Resume point for [`Store::list_after`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken {
    sort: SortOrder,
    key: Vec<u8>,
}

/// One page of a seek-based listing
#[derive(Debug)]
pub struct Page<R> {
    pub items: Vec<R>,
    /// `None` once the listing is exhausted
    pub next: Option<PageToken>,
}

impl PageToken {
    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Source-bucket key the token resumes after
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Encode to a hex string
    pub fn encode(&self) -> String {
        let mut buf = BytesMut::with_capacity(TOKEN_HEADER_SIZE + self.key.len() + TOKEN_CRC_SIZE);
        buf.put_u8(TOKEN_VERSION);
        buf.put_u8(self.sort.code());
        buf.put_u32(self.key.len() as u32);
        buf.put_slice(&self.key);
        let crc = crc32fast::hash(&buf);
        buf.put_u32(crc);
        hex::encode(&buf)
    }

    /// Decode a token produced by [`PageToken::encode`]
    pub fn decode(token: &str) -> Result<Self> {
        let raw = hex::decode(token).map_err(|e| StoreError::InvalidPageToken(e.to_string()))?;

        if raw.len() < TOKEN_HEADER_SIZE + TOKEN_CRC_SIZE {
            return Err(StoreError::InvalidPageToken(format!(
                "too short: {} bytes",
                raw.len()
            )));
        }

        let (body, mut crc_bytes) = raw.split_at(raw.len() - TOKEN_CRC_SIZE);
        let expected = crc_bytes.get_u32();
        if crc32fast::hash(body) != expected {
            return Err(StoreError::InvalidPageToken("checksum mismatch".into()));
        }

        let mut body = body;
        let version = body.get_u8();
        if version != TOKEN_VERSION {
            return Err(StoreError::InvalidPageToken(format!(
                "unsupported version {}",
                version
            )));
        }

        let code = body.get_u8();
        let sort = SortOrder::from_code(code)
            .ok_or_else(|| StoreError::InvalidPageToken(format!("unknown sort code {}", code)))?;

        let key_len = body.get_u32() as usize;
        if body.remaining() != key_len {
            return Err(StoreError::InvalidPageToken(format!(
                "key length {} does not match {} remaining bytes",
                key_len,
                body.remaining()
            )));
        }

        Ok(Self {
            sort,
            key: body.to_vec(),
        })
    }
}

impl Store {
    /// List up to `limit` records that follow `after` in `sort` order
    ///
    /// Pass `None` for the first page, then the previous page's `next`.
    /// A token minted for another sort order fails with `InvalidPageToken`.
    pub fn list_after<R, F>(
        &self,
        factory: F,
        limit: usize,
        sort: SortOrder,
        after: Option<&PageToken>,
    ) -> std::result::Result<Page<R>, PartialList<R>>
    where
        R: Record,
        F: Fn() -> R,
    {
        let _enter = self.span.enter();

        let probe = factory();
        if probe.as_serializable().is_none() {
            return Err(PartialList::empty(not_serializable::<R>()));
        }
        if let Some(token) = after {
            if token.sort != sort {
                return Err(PartialList::empty(StoreError::InvalidPageToken(format!(
                    "token was issued for {:?}, not {:?}",
                    token.sort, sort
                ))));
            }
        }
        if limit == 0 {
            return Ok(Page {
                items: Vec::new(),
                next: after.cloned(),
            });
        }

        let scan = Scan {
            sort,
            prefix: keys::namespace_prefix(probe.namespace()),
            skip: 0,
            limit,
            after: after.map(|token| token.key.as_slice()),
        };

        let mut items = Vec::with_capacity(limit.min(256));
        match self.with_db(|db| self.scan_into(db, &factory, &scan, &mut items)) {
            Ok(end) => {
                let next = match (end.exhausted, end.last_key) {
                    (false, Some(key)) => Some(PageToken { sort, key }),
                    _ => None,
                };
                tracing::debug!(
                    namespace = probe.namespace(),
                    sort = ?sort,
                    limit,
                    returned = items.len(),
                    more = next.is_some(),
                    "Listed page"
                );
                Ok(Page { items, next })
            }
            Err(error) => {
                tracing::warn!(
                    namespace = probe.namespace(),
                    sort = ?sort,
                    decoded = items.len(),
                    error = %error,
                    "Paged listing failed"
                );
                Err(PartialList { items, error })
            }
        }
    }
}
