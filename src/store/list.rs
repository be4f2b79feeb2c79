//! Listing
//!
//! One read transaction per call. The sort order picks the source bucket and
//! direction:
//!
//! | Sort        | Bucket | Direction  | Match                                        |
//! |-------------|--------|------------|----------------------------------------------|
//! | Natural     | main   | ascending  | key starts with `{ns}_`                      |
//! | CreatedAsc  | index  | ascending  | key ends `_created`, value starts with `{ns}_` |
//! | CreatedDesc | index  | descending | same                                         |
//! | UpdatedAsc  | index  | ascending  | key ends `_updated`, value starts with `{ns}_` |
//! | UpdatedDesc | index  | descending | same                                         |
//!
//! Page `p` of size `l` skips the first `p * l` matching entries, so the
//! cost of a page grows with its depth. See [`PageToken`] for seek-based paging.
//!
//! [`PageToken`]: super::PageToken

use std::fmt;
use std::ops::Bound;

use redb::{AccessGuard, Database, ReadableTable, StorageError};

use crate::error::{Result, StoreError};
use crate::keys::{self, IndexKind};
use crate::record::Record;

use super::lifecycle::unmarshal;
use super::{not_serializable, open_required, ReadTable, Store};

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Primary key order
    #[default]
    Natural,
    CreatedAsc,
    CreatedDesc,
    UpdatedAsc,
    UpdatedDesc,
}

impl SortOrder {
    /// Index kind walked by this order; `None` for natural order
    pub fn index_kind(&self) -> Option<IndexKind> {
        match self {
            SortOrder::Natural => None,
            SortOrder::CreatedAsc | SortOrder::CreatedDesc => Some(IndexKind::Created),
            SortOrder::UpdatedAsc | SortOrder::UpdatedDesc => Some(IndexKind::Updated),
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, SortOrder::CreatedDesc | SortOrder::UpdatedDesc)
    }

    /// Stable wire code
    pub fn code(&self) -> u8 {
        match self {
            SortOrder::Natural => 0,
            SortOrder::CreatedAsc => 1,
            SortOrder::CreatedDesc => 2,
            SortOrder::UpdatedAsc => 3,
            SortOrder::UpdatedDesc => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SortOrder::Natural),
            1 => Some(SortOrder::CreatedAsc),
            2 => Some(SortOrder::CreatedDesc),
            3 => Some(SortOrder::UpdatedAsc),
            4 => Some(SortOrder::UpdatedDesc),
            _ => None,
        }
    }
}

/// Skip/limit listing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    /// Zero-based page number
    pub page: usize,
    /// Page size
    pub limit: usize,
    pub sort: SortOrder,
}

impl ListOptions {
    pub fn new(page: usize, limit: usize, sort: SortOrder) -> Self {
        Self { page, limit, sort }
    }

    /// Matching entries passed over before collecting
    pub fn skip(&self) -> usize {
        self.page.saturating_mul(self.limit)
    }
}

/// A listing that failed part way
///
/// `items` holds every record decoded before `error` stopped the scan.
pub struct PartialList<R> {
    pub items: Vec<R>,
    pub error: StoreError,
}

impl<R> PartialList<R> {
    pub(super) fn empty(error: StoreError) -> Self {
        Self {
            items: Vec::new(),
            error,
        }
    }
}

impl<R> fmt::Debug for PartialList<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialList")
            .field("items", &self.items.len())
            .field("error", &self.error)
            .finish()
    }
}

impl<R> fmt::Display for PartialList<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listing stopped after {} items: {}", self.items.len(), self.error)
    }
}

impl<R> std::error::Error for PartialList<R> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<R> From<PartialList<R>> for StoreError {
    fn from(partial: PartialList<R>) -> Self {
        partial.error
    }
}

// =============================================================================
// Scan
// =============================================================================

/// One pass over a bucket
pub(super) struct Scan<'a> {
    pub sort: SortOrder,
    /// `{namespace}_`
    pub prefix: Vec<u8>,
    /// Matching entries to pass over first
    pub skip: usize,
    pub limit: usize,
    /// Resume strictly after this source-bucket key
    pub after: Option<&'a [u8]>,
}

/// Where a scan stopped
pub(super) struct ScanEnd {
    /// Source-bucket key of the last collected record
    pub last_key: Option<Vec<u8>>,
    /// True if no matching entry remains past `last_key`
    pub exhausted: bool,
}

type RawEntry = std::result::Result<(Vec<u8>, Vec<u8>), StorageError>;
type Guard<'a> = AccessGuard<'a, &'static [u8]>;

impl Store {
    /// List one page of records from a namespace
    ///
    /// `factory` yields an empty record; its namespace selects the records
    /// listed and its type decodes them. On failure the records decoded so far
    /// are returned alongside the error.
    pub fn list<R, F>(&self, factory: F, options: ListOptions) -> std::result::Result<Vec<R>, PartialList<R>>
    where
        R: Record,
        F: Fn() -> R,
    {
        let _enter = self.span.enter();

        let probe = factory();
        if probe.as_serializable().is_none() {
            return Err(PartialList::empty(not_serializable::<R>()));
        }
        if options.limit == 0 {
            return Ok(Vec::new());
        }

        let scan = Scan {
            sort: options.sort,
            prefix: keys::namespace_prefix(probe.namespace()),
            skip: options.skip(),
            limit: options.limit,
            after: None,
        };

        let mut items = Vec::with_capacity(options.limit.min(256));
        match self.with_db(|db| self.scan_into(db, &factory, &scan, &mut items)) {
            Ok(_) => {
                tracing::debug!(
                    namespace = probe.namespace(),
                    sort = ?options.sort,
                    page = options.page,
                    limit = options.limit,
                    returned = items.len(),
                    "Listed records"
                );
                Ok(items)
            }
            Err(error) => {
                tracing::warn!(
                    namespace = probe.namespace(),
                    sort = ?options.sort,
                    decoded = items.len(),
                    error = %error,
                    "Listing failed"
                );
                Err(PartialList { items, error })
            }
        }
    }

    /// Walk the source bucket for `scan`, pushing decoded records into `out`
    pub(super) fn scan_into<R, F>(
        &self,
        db: &Database,
        factory: &F,
        scan: &Scan<'_>,
        out: &mut Vec<R>,
    ) -> Result<ScanEnd>
    where
        R: Record,
        F: Fn() -> R,
    {
        let txn = db.begin_read()?;
        let main = open_required(&txn, self.main_bucket())?;

        match scan.sort.index_kind() {
            None => {
                let lower = match scan.after {
                    Some(key) => Bound::Excluded(key),
                    None => Bound::Included(scan.prefix.as_slice()),
                };
                let entries = main
                    .range::<&[u8]>((lower, Bound::Unbounded))?
                    .map(owned_entry);
                walk(entries, scan, out, |key, value, out| {
                    if !key.starts_with(&scan.prefix) {
                        return Ok(Step::Stop);
                    }
                    let Some(out) = out else {
                        return Ok(Step::Match);
                    };
                    let mut item = factory();
                    unmarshal(&mut item, value)?;
                    out.push(item);
                    Ok(Step::Match)
                })
            }
            Some(kind) => {
                let index = open_required(&txn, self.index_bucket())?;
                let (lower, upper) = match (scan.after, scan.sort.is_descending()) {
                    (None, _) => (Bound::Unbounded, Bound::Unbounded),
                    (Some(key), false) => (Bound::Excluded(key), Bound::Unbounded),
                    (Some(key), true) => (Bound::Unbounded, Bound::Excluded(key)),
                };
                let range = index.range::<&[u8]>((lower, upper))?;

                let visit = |key: &[u8], value: &[u8], out: Option<&mut Vec<R>>| -> Result<Step> {
                    if !kind.matches(key) || !value.starts_with(&scan.prefix) {
                        return Ok(Step::Skip);
                    }
                    tracing::trace!(
                        index_key = %String::from_utf8_lossy(key),
                        primary_key = %String::from_utf8_lossy(value),
                        "Index entry matched"
                    );
                    let Some(out) = out else {
                        return Ok(Step::Match);
                    };
                    let item = resolve(&main, factory, key, value)?;
                    out.push(item);
                    Ok(Step::Match)
                };

                if scan.sort.is_descending() {
                    walk(range.rev().map(owned_entry), scan, out, visit)
                } else {
                    walk(range.map(owned_entry), scan, out, visit)
                }
            }
        }
    }
}

/// What a visited entry turned out to be
enum Step {
    /// Matches the filter (and was decoded if collecting)
    Match,
    /// Filtered out; keep going
    Skip,
    /// Past the last possible match
    Stop,
}

/// Shared skip/limit loop
///
/// `visit` receives `Some(out)` when the entry should be decoded and
/// collected, `None` while skipping or when only probing for more matches.
fn walk<R, I, V>(entries: I, scan: &Scan<'_>, out: &mut Vec<R>, mut visit: V) -> Result<ScanEnd>
where
    I: Iterator<Item = RawEntry>,
    V: FnMut(&[u8], &[u8], Option<&mut Vec<R>>) -> Result<Step>,
{
    let mut skipped = 0usize;
    let mut collected = 0usize;
    let mut last_key = None;

    for entry in entries {
        let (key, value) = entry?;

        let collecting = skipped >= scan.skip && collected < scan.limit;
        let sink = if collecting { Some(&mut *out) } else { None };

        match visit(&key, &value, sink)? {
            Step::Skip => continue,
            Step::Stop => break,
            Step::Match => {}
        }

        if skipped < scan.skip {
            skipped += 1;
        } else if collected < scan.limit {
            collected += 1;
            last_key = Some(key);
        } else {
            // One more match exists past the page
            return Ok(ScanEnd {
                last_key,
                exhausted: false,
            });
        }
    }

    Ok(ScanEnd {
        last_key,
        exhausted: true,
    })
}

/// Load and decode the record an index entry points to
fn resolve<R, F>(main: &ReadTable, factory: &F, index_key: &[u8], primary_key: &[u8]) -> Result<R>
where
    R: Record,
    F: Fn() -> R,
{
    let found = main.get(primary_key)?;
    let Some(value) = found else {
        return Err(StoreError::DanglingIndex {
            index_key: String::from_utf8_lossy(index_key).into_owned(),
            primary_key: String::from_utf8_lossy(primary_key).into_owned(),
        });
    };
    let mut item = factory();
    unmarshal(&mut item, value.value())?;
    Ok(item)
}

fn owned_entry(entry: std::result::Result<(Guard<'_>, Guard<'_>), StorageError>) -> RawEntry {
    entry.map(|(key, value)| (key.value().to_vec(), value.value().to_vec()))
}
