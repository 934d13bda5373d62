#![cfg_attr(not(feature = "std"), no_std)]

//! Signatures for a decentralized identity network.
//!
//! Every message between a client and a host travels in a [SignatureEnvelope] carrying one of four
//! kinds of [Signature]: none at all, a host signature, a client commitment, or an anonymous
//! credential show. [Verifier::verify] applies the freshness window and then the check for the
//! envelope's kind, rejecting with an [Error] that says why.
//!
//! Anonymous credentials are certificates a host issues over a client's committed secret and one
//! attribute. [show] proves possession of one or more of them, optionally disclosing attributes,
//! without revealing the secret or linking two shows by the same client.

extern crate alloc;

pub mod bounded;
pub mod certificate;
pub mod codec;
pub mod commitment;
pub mod credential;
pub mod envelope;
pub mod error;
pub mod freshness;
pub mod group;
pub mod hash;
pub mod host;
pub mod store;
pub mod verifier;
pub mod zkp;

#[cfg(any(test, feature = "issuer"))]
pub mod issuer;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bounded::{BoundedInteger, Exponent};
pub use certificate::{Certificate, IssuedCertificate, ValidityWindow};
pub use codec::{Codec, DecodeError};
pub use commitment::Commitment;
pub use credential::{show, CredentialShowProof, Presentation, ShownCertificate};
pub use envelope::{Signature, SignatureEnvelope, Subject, Timestamp};
pub use error::{Error, ProofParameter};
pub use freshness::{Freshness, FreshnessPolicy};
pub use group::{GroupConfig, GroupParameters, HostId};
pub use host::{HostPublicKey, HostSecretKey, SignerKeyId};
pub use store::KeyStore;
#[cfg(feature = "std")]
pub use store::MemoryKeyStore;
pub use verifier::{verify, Verifier, VerifierConfig};
