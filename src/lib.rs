//! # recordstore
//!
//! Typed record persistence over an embedded transactional KV engine with:
//! - CRUD on any type implementing the [`Record`] capability traits
//! - Automatic id assignment and created/updated stamping
//! - Time-ordered secondary index maintained in the same transaction as the data
//! - Namespace-filtered listing in natural or time order, by page or by token
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Store                                │
//! │        create / read / update / delete / list                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  one transaction per operation
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Main Bucket │          │Index Bucket │
//!   │ ns_id → rec │◄─────────│ ts_kind → pk│
//!   └─────────────┘          └─────────────┘
//!          │                         │
//!          └────────────┬────────────┘
//!                       ▼
//!               ┌──────────────┐
//!               │ redb (file)  │
//!               │ {root}/{db}.db│
//!               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod clock;
pub mod keys;
pub mod record;
pub mod index;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BoxError, Result, StoreError};
pub use config::{Config, IndexKeyScheme};
pub use clock::{Clock, ManualClock, SystemClock};
pub use record::{IdentityAssignable, Record, Serializable, TimestampTracked};
pub use index::IndexEntry;
pub use store::{ListOptions, Page, PageToken, PartialList, SortOrder, Store, StoreBuilder, StoreStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of recordstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
