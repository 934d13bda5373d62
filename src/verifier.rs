//! Envelope verification: freshness first, then the check for the envelope's signature kind.

use alloc::{sync::Arc, vec::Vec};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    codec::Codec,
    commitment::Commitment,
    credential::{verify_show, ShowContext},
    envelope::{Signature, SignatureEnvelope, Timestamp},
    error::Error,
    freshness::{Freshness, FreshnessPolicy},
    group::{GroupParameters, HostId, DEFAULT_MIN_MODULUS_BITS},
    store::KeyStore,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub freshness: FreshnessPolicy,
    /// Groups resolved from the key store with a smaller modulus are refused.
    pub min_modulus_bits: u32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            freshness: FreshnessPolicy::default(),
            min_modulus_bits: DEFAULT_MIN_MODULUS_BITS,
        }
    }
}

/// Verifies envelopes against a key store.
///
/// Holds no mutable state, so one verifier can be shared by any number of threads.
#[derive(Clone, Debug)]
pub struct Verifier<K> {
    store: K,
    config: VerifierConfig,
}

impl<K: KeyStore> Verifier<K> {
    pub fn new(store: K, config: VerifierConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify `envelope` at time `now`, returning its payload when accepted.
    pub fn verify<'e>(
        &self,
        envelope: &'e SignatureEnvelope,
        now: Timestamp,
    ) -> Result<&'e [u8], Error> {
        let result = self.check(envelope, now);
        match &result {
            Ok(()) => debug!(
                subject = %envelope.subject(),
                kind = envelope.signature().kind(),
                "envelope accepted"
            ),
            Err(error) => debug!(
                subject = %envelope.subject(),
                kind = envelope.signature().kind(),
                %error,
                "envelope rejected"
            ),
        }
        result.map(|()| envelope.payload())
    }

    /// Decode `bytes` with `codec` and verify the result.
    pub fn verify_encoded<C: Codec>(
        &self,
        codec: &C,
        bytes: &[u8],
        now: Timestamp,
    ) -> Result<Vec<u8>, Error> {
        let envelope = codec.decode(bytes).inspect_err(|error| {
            debug!(%error, "envelope failed to decode");
        })?;
        self.verify(&envelope, now)?;
        let (_, _, payload, _) = envelope.into_parts();
        Ok(payload)
    }

    fn check(&self, envelope: &SignatureEnvelope, now: Timestamp) -> Result<(), Error> {
        if self.config.freshness.check(envelope.timestamp(), now) == Freshness::Inactive {
            return Err(Error::Inactive);
        }
        debug!(timestamp = %envelope.timestamp(), %now, "freshness checked");

        match envelope.signature() {
            Signature::Unsigned => Ok(()),
            Signature::HostSigned {
                signer_key_id,
                signature_value,
            } => {
                let key = self
                    .store
                    .resolve_signer_key(signer_key_id)
                    .map_err(|error| match error {
                        Error::NotFound => Error::UnknownSigner,
                        error => error,
                    })?;
                key.verify(
                    signer_key_id,
                    envelope.subject(),
                    envelope.timestamp(),
                    envelope.payload(),
                    signature_value,
                )
            }
            Signature::ClientCommitted { commitment } => {
                self.check_commitment(commitment, envelope)
            }
            Signature::CredentialsBased {
                proof,
                certificates,
                disclosed_attributes,
            } => {
                let context = ShowContext {
                    subject: envelope.subject(),
                    timestamp: envelope.timestamp(),
                    payload: envelope.payload(),
                };
                verify_show(
                    proof,
                    certificates,
                    disclosed_attributes,
                    context,
                    now,
                    |host| self.trusted_group(host),
                )
                .inspect_err(|error| {
                    if let Error::InvalidCredentialsSignature { parameter } = error {
                        debug!(%parameter, "credential show failed");
                    }
                })
            }
        }
    }

    /// A client commitment is accepted when it is well formed in the trusted group of its host.
    /// It proves nothing about who knows the opening.
    fn check_commitment(
        &self,
        commitment: &Commitment,
        envelope: &SignatureEnvelope,
    ) -> Result<(), Error> {
        let trusted = self
            .trusted_group(commitment.group().host())
            .map_err(|_| Error::InvalidClientSignature)?;
        if *trusted != **commitment.group() {
            return Err(Error::InvalidClientSignature);
        }
        match commitment.verify_context(envelope.subject(), envelope.timestamp(), envelope.payload())
        {
            true => Ok(()),
            false => Err(Error::InvalidClientSignature),
        }
    }

    fn trusted_group(&self, host: &HostId) -> Result<Arc<GroupParameters>, Error> {
        let group = self.store.resolve_group(host)?;
        if group.modulus_bits() < self.config.min_modulus_bits {
            return Err(Error::InvalidGroup("group modulus is below the verifier minimum"));
        }
        Ok(group)
    }
}

/// Verify a single envelope against `store` under `policy` and the default group minimum.
pub fn verify<'e, K: KeyStore + ?Sized>(
    envelope: &'e SignatureEnvelope,
    now: Timestamp,
    policy: &FreshnessPolicy,
    store: &K,
) -> Result<&'e [u8], Error> {
    let config = VerifierConfig {
        freshness: *policy,
        ..VerifierConfig::default()
    };
    Verifier::new(store, config).verify(envelope, now)
}
