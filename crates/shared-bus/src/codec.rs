//! # Payload Codec
//!
//! Turns typed values into message bodies and back.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::CodecError;

/// Content type stamped on JSON message bodies.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Encoding used for message bodies.
///
/// The publisher and subscriber of a given routing key must agree on the
/// codec; the content type travels with every message.
pub trait MessageCodec: Send + Sync + 'static {
    /// Value for the message's `content-type` property.
    fn content_type(&self) -> &'static str;

    /// Encode `value` into a message body.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode a message body into `T`.
    ///
    /// Fails on malformed input, missing required fields or type mismatches.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// UTF-8 JSON, one object per message body.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE_JSON
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(CodecError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Decode)
    }
}
