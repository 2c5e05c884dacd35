//! `Courier` core: action tags, request/response envelopes, and the envelope codec.

pub mod action;
pub mod codec;
pub mod envelope;

pub use action::{Action, Transport, UnknownActionTag};
pub use codec::{CodecError, EnvelopeCodec, DEFAULT_MAX_BODY_BYTES};
pub use envelope::{AuthPayload, LogPayload, MailPayload, RequestEnvelope, ResponseEnvelope};
