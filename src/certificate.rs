//! Host-issued certificates binding a client secret to one attribute.
//!
//! A certificate is a signature `(A, e, v)` over the client secret `u`, the attribute encoding `m`
//! and the validity encoding `w`, satisfying
//!
//! ```text
//! A^e * R0^u * R1^m * R2^w * S^v = Z  (mod n)
//! ```
//!
//! Only the holder ever sees `A`, `e` and `v`. Presenting a certificate goes through a show proof in
//! [crate::credential], which reveals none of them.

use alloc::{sync::Arc, vec::Vec};

use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::{
    bounded::{BoundedInteger, Exponent},
    envelope::Timestamp,
    error::Error,
    group::{Generator, GroupParameters, OFFSET_BITS},
    hash::HashTranscript,
};

/// Inclusive range of times during which a certificate may be shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidityWindow {
    not_before: Timestamp,
    not_after: Timestamp,
}

impl ValidityWindow {
    pub fn new(not_before: Timestamp, not_after: Timestamp) -> Result<Self, Error> {
        if not_before > not_after {
            return Err(Error::InvalidCertificate("validity window ends before it starts"));
        }
        Ok(Self {
            not_before,
            not_after,
        })
    }

    pub fn not_before(&self) -> Timestamp {
        self.not_before
    }

    pub fn not_after(&self) -> Timestamp {
        self.not_after
    }

    pub fn contains(&self, now: Timestamp) -> bool {
        self.not_before <= now && now <= self.not_after
    }

    /// The exponent the window is signed under in `group`.
    pub fn encode(&self, group: &GroupParameters) -> Exponent {
        let mut transcript = HashTranscript::new("anonsig::certificate::validity");
        transcript.append_u64("not_before", self.not_before.as_secs());
        transcript.append_u64("not_after", self.not_after.as_secs());
        transcript.finalize_exponent(group.exponent_bits())
    }
}

/// The exponent an attribute is signed under in `group`.
pub fn encode_attribute(group: &GroupParameters, attribute: &[u8]) -> Exponent {
    let mut transcript = HashTranscript::new("anonsig::certificate::attribute");
    transcript.append_bytes("attribute", attribute);
    transcript.finalize_exponent(group.exponent_bits())
}

/// A certificate as held by the client it was issued to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certificate {
    group: Arc<GroupParameters>,
    blinded_value: BoundedInteger,
    issuer_exponent: Exponent,
    randomizer: Exponent,
    attribute: Vec<u8>,
    validity: ValidityWindow,
}

impl Certificate {
    /// Assemble a certificate, checking each component lies in the range the group allows.
    ///
    /// This does not check the signature itself. Use [Certificate::verify] with the holder's
    /// secret for that.
    pub fn new(
        group: Arc<GroupParameters>,
        blinded_value: BigUint,
        issuer_exponent: BigUint,
        randomizer: BigUint,
        attribute: Vec<u8>,
        validity: ValidityWindow,
    ) -> Result<Self, Error> {
        if !group.verify_membership(&blinded_value) {
            return Err(Error::InvalidCertificate("blinded value outside the group"));
        }
        let l_e = group.certificate_exponent_bits();
        let e_floor = BigUint::one() << (l_e - 1);
        let e_ceiling = &e_floor + (BigUint::one() << OFFSET_BITS);
        if issuer_exponent < e_floor || issuer_exponent >= e_ceiling {
            return Err(Error::InvalidCertificate("issuer exponent out of range"));
        }
        let l_v = group.signature_randomizer_bits();
        if randomizer < BigUint::one() << (l_v - 1) || randomizer.bits() > u64::from(l_v) {
            return Err(Error::InvalidCertificate("randomizer out of range"));
        }

        Ok(Self {
            blinded_value: group.element(blinded_value)?,
            issuer_exponent: Exponent::new(issuer_exponent, l_e)?,
            randomizer: Exponent::new(randomizer, l_v)?,
            group,
            attribute,
            validity,
        })
    }

    pub fn group(&self) -> &Arc<GroupParameters> {
        &self.group
    }

    /// `A`
    pub fn blinded_value(&self) -> &BoundedInteger {
        &self.blinded_value
    }

    /// `e`
    pub fn issuer_exponent(&self) -> &Exponent {
        &self.issuer_exponent
    }

    /// `v`
    pub fn randomizer(&self) -> &Exponent {
        &self.randomizer
    }

    pub fn attribute(&self) -> &[u8] {
        &self.attribute
    }

    pub fn validity(&self) -> &ValidityWindow {
        &self.validity
    }

    /// Check the certificate equation for the holder's secret.
    pub fn verify(&self, secret: &Exponent) -> Result<(), Error> {
        let group = &self.group;
        let secret = secret
            .rebound(group.exponent_bits())
            .map_err(|_| Error::ExponentTooLarge {
                bits: secret.bits(),
                max_bits: group.exponent_bits(),
            })?;
        let attribute = encode_attribute(group, &self.attribute);
        let validity = self.validity.encode(group);
        let lhs = group.multi_pow([
            (self.blinded_value.value(), &self.issuer_exponent),
            (group.generator(Generator::Secret), &secret),
            (group.generator(Generator::Attribute), &attribute),
            (group.generator(Generator::Validity), &validity),
            (group.generator(Generator::Randomizer), &self.randomizer),
        ]);
        match group.elements_eq(&lhs, group.generator(Generator::Certificate)) {
            true => Ok(()),
            false => Err(Error::InvalidCertificate("signature does not verify")),
        }
    }
}

/// A certificate as returned by the issuing host, before the holder adds its share of the
/// randomizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedCertificate {
    pub blinded_value: BigUint,
    pub issuer_exponent: BigUint,
    pub randomizer_share: BigUint,
    pub attribute: Vec<u8>,
    pub validity: ValidityWindow,
}

impl IssuedCertificate {
    /// Finish the certificate with the secret and randomizer the holder committed to at issuance,
    /// and check the result.
    pub fn complete(
        self,
        group: Arc<GroupParameters>,
        secret: &Exponent,
        commitment_randomizer: &Exponent,
    ) -> Result<Certificate, Error> {
        let randomizer = self.randomizer_share + commitment_randomizer.value();
        let certificate = Certificate::new(
            group,
            self.blinded_value,
            self.issuer_exponent,
            randomizer,
            self.attribute,
            self.validity,
        )?;
        certificate.verify(secret)?;
        Ok(certificate)
    }
}
