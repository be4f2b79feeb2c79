//! bincode helpers for serde records
//!
//! Lets a `Serialize + DeserializeOwned` record implement [`Serializable`]
//! in two lines:
//!
//! ```ignore
//! impl Serializable for Note {
//!     fn marshal(&self) -> Result<Vec<u8>, BoxError> { codec::encode(self) }
//!     fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), BoxError> { codec::decode_into(self, bytes) }
//! }
//! ```
//!
//! [`Serializable`]: super::Serializable

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::BoxError;

/// Encode a value with bincode
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, BoxError> {
    Ok(bincode::serialize(value)?)
}

/// Decode a value with bincode
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, BoxError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Decode into an existing value, replacing it
pub fn decode_into<T: DeserializeOwned>(target: &mut T, bytes: &[u8]) -> Result<(), BoxError> {
    *target = decode(bytes)?;
    Ok(())
}
