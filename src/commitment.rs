//! Pedersen-style commitments over a host's group.

use alloc::sync::Arc;

use num_bigint::BigUint;

use crate::{
    bounded::{BoundedInteger, Exponent},
    envelope::{Subject, Timestamp},
    error::Error,
    group::{Generator, GroupParameters},
    hash::HashTranscript,
};

/// A commitment `C = g^secret * h^randomizer mod n`.
///
/// The secret and randomizer are never stored next to the commitment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commitment {
    group: Arc<GroupParameters>,
    value: BoundedInteger,
}

impl Commitment {
    /// Commit to `secret` under `randomizer`.
    ///
    /// Deterministic in its inputs. Fails with [Error::ExponentTooLarge] if the secret exceeds the
    /// group's exponent bound or the randomizer exceeds its blinding bound.
    pub fn compute(
        group: &Arc<GroupParameters>,
        secret: &Exponent,
        randomizer: &Exponent,
    ) -> Result<Self, Error> {
        // Re-stating both exponents under the group bounds also pins the ladder length, so it
        // does not depend on how the caller sized them.
        let secret = group_exponent(secret, group.exponent_bits())?;
        let randomizer = group_exponent(randomizer, group.blinding_bits())?;
        let value = group.multi_pow([
            (group.generator(Generator::Secret), &secret),
            (group.generator(Generator::Randomizer), &randomizer),
        ]);
        Ok(Self {
            group: group.clone(),
            value: group.element(value)?,
        })
    }

    /// Commit to `secret` with a randomizer derived from the message it signs.
    ///
    /// This is the form carried by a client-committed envelope. Equal inputs always give an equal
    /// commitment, and anyone holding the message can strip the context term off again.
    pub fn for_context(
        group: &Arc<GroupParameters>,
        secret: &Exponent,
        subject: &Subject,
        timestamp: Timestamp,
        payload: &[u8],
    ) -> Result<Self, Error> {
        let randomizer = Self::context_randomizer(group, subject, timestamp, payload);
        Self::compute(group, secret, &randomizer)
    }

    /// Randomizer bound to a message, sized to the group's blinding bound.
    pub fn context_randomizer(
        group: &GroupParameters,
        subject: &Subject,
        timestamp: Timestamp,
        payload: &[u8],
    ) -> Exponent {
        let mut transcript = HashTranscript::new("anonsig::commitment::context");
        transcript.append_bytes("host", group.host().as_str().as_bytes());
        transcript.append_bytes("subject", subject.as_str().as_bytes());
        transcript.append_u64("timestamp", timestamp.as_secs());
        transcript.append_bytes("payload", payload);
        transcript.finalize_exponent(group.blinding_bits())
    }

    /// Wrap a commitment value received from elsewhere, checking only its size.
    pub fn from_value(group: Arc<GroupParameters>, value: BigUint) -> Result<Self, Error> {
        let value = group.element(value)?;
        Ok(Self { group, value })
    }

    pub fn group(&self) -> &Arc<GroupParameters> {
        &self.group
    }

    pub fn value(&self) -> &BoundedInteger {
        &self.value
    }

    /// Whether the value is a usable element of its group. Says nothing about who knows the
    /// opening.
    pub fn is_well_formed(&self) -> bool {
        self.value.bits() <= u64::from(self.group.modulus_bits())
            && self.group.verify_membership(self.value.value())
    }

    /// Check that this commitment is well formed and carries a non-trivial secret once the
    /// context term of the given message is accounted for.
    pub fn verify_context(&self, subject: &Subject, timestamp: Timestamp, payload: &[u8]) -> bool {
        if !self.is_well_formed() {
            return false;
        }
        let context = Self::context_randomizer(&self.group, subject, timestamp, payload);
        let context_term = self.group.pow(Generator::Randomizer, &context);
        !self.group.elements_eq(self.value.value(), &context_term)
    }

    /// Recompute the commitment from its opening and compare.
    ///
    /// Verification of signed messages never calls this; it needs the secret.
    pub fn verify_opening(
        &self,
        group: &GroupParameters,
        secret: &Exponent,
        randomizer: &Exponent,
    ) -> bool {
        if *self.group != *group {
            return false;
        }
        match Self::compute(&self.group, secret, randomizer) {
            Ok(expected) => group.elements_eq(self.value.value(), expected.value.value()),
            Err(_) => false,
        }
    }
}

fn group_exponent(exponent: &Exponent, max_bits: u32) -> Result<Exponent, Error> {
    exponent
        .rebound(max_bits)
        .map_err(|_| Error::ExponentTooLarge {
            bits: exponent.bits(),
            max_bits,
        })
}
