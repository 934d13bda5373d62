//! Signature envelopes: a payload, who it is about, when it was signed, and the signature itself.

use alloc::{string::String, sync::Arc, vec::Vec};
use core::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    bounded::Exponent,
    commitment::Commitment,
    credential::{CredentialShowProof, ShownCertificate},
    error::Error,
    group::GroupParameters,
    host::{HostSecretKey, SignerKeyId},
};

/// Seconds since the Unix epoch.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_secs()))
    }

    pub fn saturating_sub(self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration.as_secs()))
    }

    /// The current system time. Times before the epoch read as zero.
    #[cfg(feature = "std")]
    pub fn now() -> Self {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self(secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies what a signed payload is about.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Subject(String);

impl Subject {
    pub fn new(subject: impl Into<String>) -> Self {
        Self(subject.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The cryptographic material carried by an envelope. Exactly one kind per envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signature {
    /// No signature. Verification always accepts these; refusing them is an authorization
    /// decision left to the caller.
    Unsigned,
    HostSigned {
        signer_key_id: SignerKeyId,
        signature_value: Vec<u8>,
    },
    ClientCommitted {
        commitment: Commitment,
    },
    CredentialsBased {
        proof: CredentialShowProof,
        certificates: Vec<ShownCertificate>,
        /// Attributes of the leading certificates, in order.
        disclosed_attributes: Vec<Vec<u8>>,
    },
}

impl Signature {
    pub fn kind(&self) -> &'static str {
        match self {
            Signature::Unsigned => "unsigned",
            Signature::HostSigned { .. } => "host_signed",
            Signature::ClientCommitted { .. } => "client_committed",
            Signature::CredentialsBased { .. } => "credentials_based",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureEnvelope {
    subject: Subject,
    timestamp: Timestamp,
    payload: Vec<u8>,
    signature: Signature,
}

impl SignatureEnvelope {
    /// Assemble an envelope from its parts, as a codec does after decoding.
    pub fn new(
        subject: Subject,
        timestamp: Timestamp,
        payload: Vec<u8>,
        signature: Signature,
    ) -> Self {
        Self {
            subject,
            timestamp,
            payload,
            signature,
        }
    }

    pub fn unsigned(subject: Subject, timestamp: Timestamp, payload: Vec<u8>) -> Self {
        Self::new(subject, timestamp, payload, Signature::Unsigned)
    }

    pub fn host_signed(
        key: &HostSecretKey,
        signer_key_id: SignerKeyId,
        subject: Subject,
        timestamp: Timestamp,
        payload: Vec<u8>,
    ) -> Self {
        let signature_value = key.sign(&signer_key_id, &subject, timestamp, &payload);
        Self::new(
            subject,
            timestamp,
            payload,
            Signature::HostSigned {
                signer_key_id,
                signature_value,
            },
        )
    }

    /// Sign by committing to `secret` in the context of this message.
    pub fn client_committed(
        group: &Arc<GroupParameters>,
        secret: &Exponent,
        subject: Subject,
        timestamp: Timestamp,
        payload: Vec<u8>,
    ) -> Result<Self, Error> {
        let commitment = Commitment::for_context(group, secret, &subject, timestamp, &payload)?;
        Ok(Self::new(
            subject,
            timestamp,
            payload,
            Signature::ClientCommitted { commitment },
        ))
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn into_parts(self) -> (Subject, Timestamp, Vec<u8>, Signature) {
        (self.subject, self.timestamp, self.payload, self.signature)
    }
}
