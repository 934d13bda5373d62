//! Boundary to the external wire codec.
//!
//! Payloads, attributes and host signature values are opaque byte strings to this crate. Turning
//! envelopes into bytes and back belongs to the caller's codec, which plugs in through [Codec].

use alloc::{string::String, vec::Vec};

use crate::envelope::SignatureEnvelope;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("decode error: {0}")]
pub struct DecodeError(pub String);

pub trait Codec {
    fn encode(&self, envelope: &SignatureEnvelope) -> Vec<u8>;

    fn decode(&self, bytes: &[u8]) -> Result<SignatureEnvelope, DecodeError>;
}

impl<C: Codec + ?Sized> Codec for &C {
    fn encode(&self, envelope: &SignatureEnvelope) -> Vec<u8> {
        (**self).encode(envelope)
    }

    fn decode(&self, bytes: &[u8]) -> Result<SignatureEnvelope, DecodeError> {
        (**self).decode(bytes)
    }
}
