//! JSON encoding and decoding of request and response bodies.
//!
//! Decoding is permissive: fields the target type does not declare are
//! ignored. Values are written through their own `Serialize` impls, so date
//! types whose serde support is textual (such as `chrono`'s RFC 3339 form)
//! stay text rather than epoch numbers.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors from the JSON codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Input was not valid JSON for the target shape.
    #[error("failed to decode {target}: {source}")]
    Decode {
        /// Target type name.
        target: &'static str,
        /// Parser diagnostic.
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be serialized.
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decodes `bytes` into `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|source| CodecError::Decode {
        target: std::any::type_name::<T>(),
        source,
    })
}

/// Encodes `value` as JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Bytes, CodecError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(CodecError::Encode)
}
