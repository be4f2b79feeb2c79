//! Record Module
//!
//! The capability contract a type implements to be stored.
//!
//! ## Capabilities
//! - `Serializable`: mandatory; the record encodes and decodes itself
//! - `IdentityAssignable`: optional; the store assigns a UUID on create
//! - `TimestampTracked`: optional; the store stamps created/updated times and
//!   maintains time-ordered index entries
//!
//! Capabilities are queried per call through the `as_*` methods on [`Record`].
//! Each defaults to `None`; a record opts in by returning `Some(self)`.
//!
//! ```ignore
//! impl Record for Note {
//!     fn namespace(&self) -> &str { &self.namespace }
//!     fn id(&self) -> &str { &self.id }
//!     fn as_serializable(&self) -> Option<&dyn Serializable> { Some(self) }
//!     fn as_serializable_mut(&mut self) -> Option<&mut dyn Serializable> { Some(self) }
//! }
//! ```

pub mod codec;

use crate::error::BoxError;

/// A storable unit: namespace + id plus optional capabilities
pub trait Record {
    /// Logical group used for key prefixing and listing filters
    fn namespace(&self) -> &str;

    /// Unique within the namespace
    fn id(&self) -> &str;

    fn as_serializable(&self) -> Option<&dyn Serializable> {
        None
    }

    fn as_serializable_mut(&mut self) -> Option<&mut dyn Serializable> {
        None
    }

    fn as_identity_mut(&mut self) -> Option<&mut dyn IdentityAssignable> {
        None
    }

    fn as_timestamps(&self) -> Option<&dyn TimestampTracked> {
        None
    }

    fn as_timestamps_mut(&mut self) -> Option<&mut dyn TimestampTracked> {
        None
    }
}

/// Encode/decode to the bytes kept in the main bucket
pub trait Serializable {
    fn marshal(&self) -> Result<Vec<u8>, BoxError>;

    /// Overwrite `self` with the decoded bytes
    fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), BoxError>;
}

/// Records whose id is assigned by the store
pub trait IdentityAssignable {
    fn set_id(&mut self, id: String);
}

/// Records carrying created/updated Unix timestamps
pub trait TimestampTracked {
    fn created(&self) -> i64;
    fn set_created(&mut self, ts: i64);
    fn updated(&self) -> i64;
    fn set_updated(&mut self, ts: i64);
}
