//! Payload codecs
//!
//! The cache accounts for payloads purely by their encoded size; a codec is
//! only needed to turn bytes back into a value on `get`.

use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Converts cached values to and from their on-disk bytes
pub trait PayloadCodec: Send + Sync + 'static {
    type Value: Send;

    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: Vec<u8>) -> Result<Self::Value, CodecError>;
}

/// Stores byte payloads unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBytes;

impl PayloadCodec for RawBytes {
    type Value = Vec<u8>;

    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(bytes)
    }
}

/// Stores serde values as JSON documents
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> PayloadCodec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Value = T;

    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(&bytes)?)
    }
}
