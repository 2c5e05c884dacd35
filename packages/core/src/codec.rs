//! JSON codec for gateway envelopes.
//!
//! Decoding enforces a maximum body size before parsing so that oversized
//! bodies are rejected without allocating a document for them.

use bytes::Bytes;
use tracing::debug;

use crate::envelope::{RequestEnvelope, ResponseEnvelope};

/// Default maximum accepted request body: 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1_048_576;

/// Errors produced while decoding or encoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("request body is empty")]
    Empty,
    #[error("request body of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("malformed request body: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Stateless envelope codec configured with a body size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeCodec {
    max_body_bytes: usize,
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY_BYTES)
    }
}

impl EnvelopeCodec {
    #[must_use]
    pub const fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }

    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Decodes a request body into a [`RequestEnvelope`].
    ///
    /// The body must hold exactly one JSON object; trailing data after it is
    /// rejected.
    ///
    /// # Errors
    ///
    /// - [`CodecError::Empty`] for a zero-length body
    /// - [`CodecError::TooLarge`] when the body exceeds the configured limit
    /// - [`CodecError::Malformed`] for anything that is not a single JSON
    ///   object of the envelope shape
    pub fn decode(&self, body: &[u8]) -> Result<RequestEnvelope, CodecError> {
        if body.len() > self.max_body_bytes {
            debug!(size = body.len(), limit = self.max_body_bytes, "rejecting oversized body");
            return Err(CodecError::TooLarge {
                size: body.len(),
                limit: self.max_body_bytes,
            });
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(CodecError::Empty);
        }
        serde_json::from_slice(body).map_err(CodecError::Malformed)
    }

    /// Encodes a response envelope as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] only if the `data` value cannot be
    /// serialized, which does not happen for values produced by `serde_json`.
    pub fn encode(&self, response: &ResponseEnvelope) -> Result<Bytes, CodecError> {
        serde_json::to_vec(response)
            .map(Bytes::from)
            .map_err(CodecError::Encode)
    }
}
