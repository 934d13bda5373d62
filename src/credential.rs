//! Anonymous credential shows.
//!
//! A show proves, for each presented certificate, knowledge of a valid signature over the client
//! secret, the certificate's attribute and its validity window, without revealing the signature or
//! the secret. Each certificate is re-randomized as `t = A * S^r`, after which the certificate
//! equation becomes a linear relation in the exponents:
//!
//! ```text
//! t^e' * R0^u * S^v' [* R1^m] = T' = Z / (R2^w * t^(2^(l_e - 1)) [* R1^m])
//! ```
//!
//! with `e' = e - 2^(l_e - 1)` and `v' = v - e * r`. The bracketed `R1^m` term sits on the left
//! when the attribute stays hidden and on the right when it is disclosed.
//!
//! By default the secret is additionally committed in a relation commitment `V = R0^u * S^rho`,
//! which splits the proof into a relation equation over `(u, rho)` and a certificate equation over
//! `(e', v' - rho, m)`. All shown certificates must respond with the same `s_u`, which ties them
//! to one secret.
//!
//! Responses are computed over the integers, `s = r + c * x`, with `r` large enough to
//! statistically hide `x`. Every response has a fixed bound derived from the group, and proofs
//! with a response over its bound are rejected before any exponentiation.

use alloc::{sync::Arc, vec::Vec};

use itertools::zip_eq;
use num_bigint::BigUint;
use num_traits::{CheckedSub, One};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{
    bounded::{ct_eq_width, mod_pow, BoundedInteger, Exponent},
    certificate::{encode_attribute, Certificate, ValidityWindow},
    envelope::{Signature, SignatureEnvelope, Subject, Timestamp},
    error::{Error, ProofParameter},
    group::{
        Generator, GroupParameters, HostId, CHALLENGE_BITS, OFFSET_BITS, STATISTICAL_BITS,
    },
    hash::HashTranscript,
};

macro_rules! label {
    ($s:literal) => {
        concat!("anonsig::credential::", $s)
    };
}

/// The public part of a presented certificate: who issued it and when it may be shown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShownCertificate {
    pub host: HostId,
    pub validity: ValidityWindow,
}

impl From<&Certificate> for ShownCertificate {
    fn from(certificate: &Certificate) -> Self {
        Self {
            host: certificate.group().host().clone(),
            validity: *certificate.validity(),
        }
    }
}

/// Commitment `V = R0^u * S^rho` to the client secret, with its own proof of opening.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCommitment {
    pub v: BoundedInteger,
    /// `R0^r_u * S^r_rho`
    pub w: BoundedInteger,
    pub s_r: Exponent,
}

/// Proof of possession for one certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateProof {
    /// The re-randomized certificate `A * S^r`.
    pub t: BoundedInteger,
    /// Witness commitment for the certificate equation.
    pub w: BoundedInteger,
    pub s_u: Exponent,
    pub s_v: Exponent,
    pub s_e: Exponent,
    /// Present exactly when the attribute is not disclosed.
    pub s_m: Option<Exponent>,
    pub relation: Option<RelationCommitment>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialShowProof {
    pub challenge: BoundedInteger,
    pub certificates: Vec<CertificateProof>,
}

/// The message a show is bound to.
#[derive(Clone, Copy, Debug)]
pub struct ShowContext<'a> {
    pub subject: &'a Subject,
    pub timestamp: Timestamp,
    pub payload: &'a [u8],
}

/// Builder for a show over a list of certificates.
///
/// Attributes are disclosed for a prefix of the list, so the disclosed attributes in the envelope
/// line up with the leading certificates.
#[derive(Clone, Debug)]
pub struct Presentation<'a> {
    certificates: &'a [Certificate],
    disclosed: usize,
    relation: bool,
}

impl<'a> Presentation<'a> {
    pub fn new(certificates: &'a [Certificate]) -> Self {
        Self {
            certificates,
            disclosed: 0,
            relation: true,
        }
    }

    /// Disclose the attributes of the first `count` certificates.
    pub fn disclose(mut self, count: usize) -> Self {
        self.disclosed = count;
        self
    }

    /// Prove the certificate equations directly over `u`, without a relation commitment.
    pub fn without_relation(mut self) -> Self {
        self.relation = false;
        self
    }

    /// Produce a credentials-based envelope over `payload`.
    ///
    /// Fails with [Error::ExponentTooLarge] if `secret` exceeds the exponent bound of any issuing
    /// group.
    pub fn show<R>(
        &self,
        secret: &Exponent,
        subject: Subject,
        timestamp: Timestamp,
        payload: Vec<u8>,
        rng: &mut R,
    ) -> Result<SignatureEnvelope, Error>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let context = ShowContext {
            subject: &subject,
            timestamp,
            payload: &payload,
        };
        let proof = self.prove(secret, context, rng)?;
        let signature = Signature::CredentialsBased {
            proof,
            certificates: self.certificates.iter().map(ShownCertificate::from).collect(),
            disclosed_attributes: self.certificates[..self.disclosed]
                .iter()
                .map(|certificate| certificate.attribute().to_vec())
                .collect(),
        };
        Ok(SignatureEnvelope::new(subject, timestamp, payload, signature))
    }

    fn prove<R>(
        &self,
        secret: &Exponent,
        context: ShowContext<'_>,
        rng: &mut R,
    ) -> Result<CredentialShowProof, Error>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        if self.certificates.is_empty() {
            return Err(Error::InvalidCertificate("no certificates to show"));
        }
        if self.disclosed > self.certificates.len() {
            return Err(Error::DisclosureMismatch);
        }
        let secret_bits = self
            .certificates
            .iter()
            .map(|certificate| certificate.group().exponent_bits())
            .min()
            .unwrap_or(0);
        if secret.bits() > u64::from(secret_bits) {
            return Err(Error::ExponentTooLarge {
                bits: secret.bits(),
                max_bits: secret_bits,
            });
        }
        // One randomizer for u across every certificate, so honest s_u values agree.
        let r_u = Exponent::random(rng, secret_bits + CHALLENGE_BITS + STATISTICAL_BITS);

        let commitments = self
            .certificates
            .iter()
            .enumerate()
            .map(|(i, certificate)| {
                CertificateCommitment::new(
                    certificate,
                    secret,
                    &r_u,
                    i < self.disclosed,
                    self.relation,
                    rng,
                )
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let disclosed_attributes: Vec<&[u8]> = self.certificates[..self.disclosed]
            .iter()
            .map(Certificate::attribute)
            .collect();
        let challenge = compute_challenge(
            context,
            commitments.iter().map(CertificateCommitment::statement),
            commitments.len(),
            &disclosed_attributes,
        );

        Ok(CredentialShowProof {
            certificates: commitments
                .iter()
                .map(|commitment| commitment.respond(&challenge, &r_u))
                .collect::<Result<Vec<_>, Error>>()?,
            challenge: Exponent::new(challenge, CHALLENGE_BITS)?,
        })
    }
}

/// Produce a credentials-based envelope disclosing `disclosed_attributes` for the leading
/// certificates.
///
/// Every disclosed attribute must equal the attribute of the certificate at the same position.
pub fn show<A, R>(
    certificates: &[Certificate],
    disclosed_attributes: &[A],
    secret: &Exponent,
    subject: Subject,
    timestamp: Timestamp,
    payload: Vec<u8>,
    rng: &mut R,
) -> Result<SignatureEnvelope, Error>
where
    A: AsRef<[u8]>,
    R: RngCore + CryptoRng + ?Sized,
{
    if disclosed_attributes.len() > certificates.len() {
        return Err(Error::DisclosureMismatch);
    }
    let matches = disclosed_attributes
        .iter()
        .zip(certificates)
        .all(|(attribute, certificate)| attribute.as_ref() == certificate.attribute());
    if !matches {
        return Err(Error::DisclosureMismatch);
    }
    Presentation::new(certificates)
        .disclose(disclosed_attributes.len())
        .show(secret, subject, timestamp, payload, rng)
}

/// Prover state for one certificate between the commitment and response phases.
struct CertificateCommitment<'a> {
    certificate: &'a Certificate,
    group: &'a GroupParameters,
    secret: Exponent,
    t: BigUint,
    restated: BigUint,
    e_offset: Exponent,
    v_adjusted: Exponent,
    hidden_attribute: Option<Exponent>,
    r_e: Exponent,
    r_v: Exponent,
    r_m: Option<Exponent>,
    w: BigUint,
    relation: Option<RelationState>,
}

struct RelationState {
    rho: Exponent,
    r_rho: Exponent,
    v: BigUint,
    w: BigUint,
}

impl<'a> CertificateCommitment<'a> {
    fn new<R>(
        certificate: &'a Certificate,
        secret: &Exponent,
        r_u: &Exponent,
        disclosed: bool,
        relation: bool,
        rng: &mut R,
    ) -> Result<Self, Error>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let group = certificate.group().as_ref();
        let secret = secret
            .rebound(group.exponent_bits())
            .map_err(|_| Error::ExponentTooLarge {
                bits: secret.bits(),
                max_bits: group.exponent_bits(),
            })?;
        let l_v = group.signature_randomizer_bits();
        let hiding = CHALLENGE_BITS + STATISTICAL_BITS;

        let r = Exponent::random(rng, group.blinding_bits());
        let t = group.mul(
            certificate.blinded_value().value(),
            &group.pow(Generator::Randomizer, &r),
        );
        let half = exponent_floor(group);
        let e_offset = certificate
            .issuer_exponent()
            .value()
            .checked_sub(half.value())
            .ok_or(Error::InvalidCertificate("issuer exponent out of range"))?;
        let e_offset = Exponent::new(e_offset, OFFSET_BITS)?;
        let v_prime = certificate
            .randomizer()
            .value()
            .checked_sub(&(certificate.issuer_exponent().value() * r.value()))
            .ok_or(Error::InvalidCertificate("randomizer out of range"))?;

        let attribute = encode_attribute(group, certificate.attribute());
        let validity = certificate.validity().encode(group);
        let restated = restate(group, &t, &validity, disclosed.then_some(&attribute))
            .ok_or(Error::InvalidCertificate("blinded value outside the group"))?;

        let relation = relation
            .then(|| {
                let rho = Exponent::random(rng, group.blinding_bits());
                let r_rho = Exponent::random(rng, group.blinding_bits() + hiding);
                let v = group.multi_pow([
                    (group.generator(Generator::Secret), &secret),
                    (group.generator(Generator::Randomizer), &rho),
                ]);
                let w = group.multi_pow([
                    (group.generator(Generator::Secret), r_u),
                    (group.generator(Generator::Randomizer), &r_rho),
                ]);
                RelationState { rho, r_rho, v, w }
            });
        let v_adjusted = match &relation {
            Some(relation) => v_prime
                .checked_sub(relation.rho.value())
                .ok_or(Error::InvalidCertificate("randomizer out of range"))?,
            None => v_prime,
        };
        let v_adjusted = Exponent::new(v_adjusted, l_v)?;

        let r_e = Exponent::random(rng, OFFSET_BITS + hiding);
        let r_v = Exponent::random(rng, l_v + hiding);
        let hidden_attribute = (!disclosed).then_some(attribute);
        let r_m = hidden_attribute
            .as_ref()
            .map(|_| Exponent::random(rng, group.exponent_bits() + hiding));

        let mut terms = Vec::with_capacity(4);
        terms.push((&t, &r_e));
        terms.push((group.generator(Generator::Randomizer), &r_v));
        if relation.is_none() {
            terms.push((group.generator(Generator::Secret), r_u));
        }
        if let Some(r_m) = &r_m {
            terms.push((group.generator(Generator::Attribute), r_m));
        }
        let w = group.multi_pow(terms);

        Ok(Self {
            certificate,
            group,
            secret,
            t,
            restated,
            e_offset,
            v_adjusted,
            hidden_attribute,
            r_e,
            r_v,
            r_m,
            w,
            relation,
        })
    }

    fn statement(&self) -> Statement<'_> {
        Statement {
            host: self.group.host(),
            validity: self.certificate.validity(),
            t: &self.t,
            w: &self.w,
            restated: &self.restated,
            relation: self.relation.as_ref().map(|relation| (&relation.v, &relation.w)),
        }
    }

    fn respond(&self, challenge: &BigUint, r_u: &Exponent) -> Result<CertificateProof, Error> {
        let bounds = ResponseBounds::new(self.group);
        let hidden = self.r_m.as_ref().zip(self.hidden_attribute.as_ref());
        let relation = self
            .relation
            .as_ref()
            .map(|relation| {
                Ok::<_, Error>(RelationCommitment {
                    v: self.group.element(relation.v.clone())?,
                    w: self.group.element(relation.w.clone())?,
                    s_r: respond(&relation.r_rho, challenge, &relation.rho, bounds.s_r)?,
                })
            })
            .transpose()?;

        Ok(CertificateProof {
            t: self.group.element(self.t.clone())?,
            w: self.group.element(self.w.clone())?,
            s_u: respond(r_u, challenge, &self.secret, bounds.s_u)?,
            s_v: respond(&self.r_v, challenge, &self.v_adjusted, bounds.s_v)?,
            s_e: respond(&self.r_e, challenge, &self.e_offset, bounds.s_e)?,
            s_m: hidden
                .map(|(r_m, m)| respond(r_m, challenge, m, bounds.s_m))
                .transpose()?,
            relation,
        })
    }
}

fn respond(
    randomness: &Exponent,
    challenge: &BigUint,
    witness: &Exponent,
    max_bits: u32,
) -> Result<Exponent, Error> {
    Exponent::new(randomness.value() + challenge * witness.value(), max_bits)
}

/// `2^(l_e - 1)`, the public floor of every issuer exponent.
fn exponent_floor(group: &GroupParameters) -> Exponent {
    let l_e = group.certificate_exponent_bits();
    Exponent::truncated(BigUint::one() << (l_e - 1), l_e)
}

/// `T' = Z / (R2^w * t^(2^(l_e - 1)) [* R1^m])`. `None` if `t` is not invertible.
fn restate(
    group: &GroupParameters,
    t: &BigUint,
    validity: &Exponent,
    disclosed_attribute: Option<&Exponent>,
) -> Option<BigUint> {
    let floor = exponent_floor(group);
    let mut divisor = group.mul(
        &group.pow(Generator::Validity, validity),
        &mod_pow(t, &floor, group.modulus()),
    );
    if let Some(attribute) = disclosed_attribute {
        divisor = group.mul(&divisor, &group.pow(Generator::Attribute, attribute));
    }
    group.div(group.generator(Generator::Certificate), &divisor)
}

/// Bit bounds of each response in a group, never above its proof bound.
struct ResponseBounds {
    s_u: u32,
    s_v: u32,
    s_e: u32,
    s_m: u32,
    s_r: u32,
}

impl ResponseBounds {
    fn new(group: &GroupParameters) -> Self {
        let bound = |witness_bits| group.response_bits(witness_bits).min(group.proof_bits());
        Self {
            s_u: bound(group.exponent_bits()),
            s_v: bound(group.signature_randomizer_bits()),
            s_e: bound(OFFSET_BITS),
            s_m: bound(group.exponent_bits()),
            s_r: bound(group.blinding_bits()),
        }
    }
}

/// Public values the challenge commits to for one certificate.
struct Statement<'a> {
    host: &'a HostId,
    validity: &'a ValidityWindow,
    t: &'a BigUint,
    w: &'a BigUint,
    restated: &'a BigUint,
    relation: Option<(&'a BigUint, &'a BigUint)>,
}

fn compute_challenge<'a>(
    context: ShowContext<'_>,
    statements: impl IntoIterator<Item = Statement<'a>>,
    count: usize,
    disclosed_attributes: &[&[u8]],
) -> BigUint {
    let mut transcript = HashTranscript::new(label!("challenge"));
    transcript.append_bytes(label!("subject"), context.subject.as_str().as_bytes());
    transcript.append_u64(label!("timestamp"), context.timestamp.as_secs());
    transcript.append_bytes(label!("payload"), context.payload);
    transcript.append_u64(label!("certificates"), count as u64);
    for statement in statements {
        transcript.append_bytes(label!("host"), statement.host.as_str().as_bytes());
        transcript.append_u64(label!("not_before"), statement.validity.not_before().as_secs());
        transcript.append_u64(label!("not_after"), statement.validity.not_after().as_secs());
        transcript.append_integer(label!("t"), statement.t);
        transcript.append_integer(label!("w"), statement.w);
        transcript.append_integer(label!("restated"), statement.restated);
        match statement.relation {
            Some((v, w)) => {
                transcript.append_u64(label!("relation"), 1);
                transcript.append_integer(label!("relation_v"), v);
                transcript.append_integer(label!("relation_w"), w);
            }
            None => transcript.append_u64(label!("relation"), 0),
        }
    }
    transcript.append_u64(label!("disclosed"), disclosed_attributes.len() as u64);
    for attribute in disclosed_attributes {
        transcript.append_bytes(label!("attribute"), attribute);
    }
    transcript.finalize_integer(CHALLENGE_BITS)
}

/// A certificate proof whose values passed their bound and membership checks, re-stated under
/// the verifier's bounds.
struct CheckedProof {
    group: Arc<GroupParameters>,
    t: BigUint,
    w: BigUint,
    restated: BigUint,
    s_u: Exponent,
    s_v: Exponent,
    s_e: Exponent,
    s_m: Option<Exponent>,
    relation: Option<CheckedRelation>,
}

struct CheckedRelation {
    v: BigUint,
    w: BigUint,
    s_r: Exponent,
}

fn reject(parameter: ProofParameter) -> Error {
    Error::credentials(parameter)
}

/// Re-state a decoded response under the trusted bound, so it cannot choose its own ladder length.
fn within(value: &Exponent, max_bits: u32, parameter: ProofParameter) -> Result<Exponent, Error> {
    value.rebound(max_bits).map_err(|_| reject(parameter))
}

fn member(
    group: &GroupParameters,
    value: &BoundedInteger,
    parameter: ProofParameter,
) -> Result<BigUint, Error> {
    match group.verify_membership(value.value()) {
        true => Ok(value.value().clone()),
        false => Err(reject(parameter)),
    }
}

/// Verify a credentials-based signature over the message in `context`.
///
/// `resolve_group` supplies the trusted group for each issuing host; its errors are returned
/// unchanged. Every other failure is [Error::InvalidCredentialsSignature] naming the part of the
/// proof that failed.
pub fn verify_show<F>(
    proof: &CredentialShowProof,
    certificates: &[ShownCertificate],
    disclosed_attributes: &[Vec<u8>],
    context: ShowContext<'_>,
    now: Timestamp,
    resolve_group: F,
) -> Result<(), Error>
where
    F: Fn(&HostId) -> Result<Arc<GroupParameters>, Error>,
{
    let count = certificates.len();
    if count == 0 {
        return Err(reject(ProofParameter::Certificate(0)));
    }
    if proof.certificates.len() != count {
        return Err(reject(ProofParameter::Certificate(
            proof.certificates.len().min(count),
        )));
    }
    if disclosed_attributes.len() > count {
        // The first disclosed attribute without a certificate sits one past the last certificate.
        return Err(reject(ProofParameter::Certificate(count)));
    }
    let challenge = within(&proof.challenge, CHALLENGE_BITS, ProofParameter::T)?;

    let checked = zip_eq(certificates, &proof.certificates)
        .enumerate()
        .map(|(i, (shown, certificate_proof))| {
            let group = resolve_group(&shown.host)?;
            if !shown.validity.contains(now) {
                return Err(reject(ProofParameter::Certificate(i)));
            }
            check_certificate_proof(
                group,
                shown,
                certificate_proof,
                disclosed_attributes.get(i).map(Vec::as_slice),
            )
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let disclosed: Vec<&[u8]> = disclosed_attributes.iter().map(Vec::as_slice).collect();
    let expected = compute_challenge(
        context,
        zip_eq(certificates, &checked).map(|(shown, checked)| Statement {
            host: &shown.host,
            validity: &shown.validity,
            t: &checked.t,
            w: &checked.w,
            restated: &checked.restated,
            relation: checked.relation.as_ref().map(|relation| (&relation.v, &relation.w)),
        }),
        count,
        &disclosed,
    );
    if !bool::from(ct_eq_width(&expected, challenge.value(), CHALLENGE_BITS)) {
        return Err(reject(ProofParameter::T));
    }

    let first_s_u = checked[0].s_u.value();
    if checked.iter().any(|checked| checked.s_u.value() != first_s_u) {
        return Err(reject(ProofParameter::SU));
    }

    checked
        .iter()
        .try_for_each(|checked| check_equations(checked, &challenge))
}

fn check_certificate_proof(
    group: Arc<GroupParameters>,
    shown: &ShownCertificate,
    proof: &CertificateProof,
    disclosed_attribute: Option<&[u8]>,
) -> Result<CheckedProof, Error> {
    if proof.s_m.is_some() == disclosed_attribute.is_some() {
        return Err(reject(ProofParameter::SM));
    }
    let bounds = ResponseBounds::new(&group);
    let s_u = within(&proof.s_u, bounds.s_u, ProofParameter::SU)?;
    let s_v = within(&proof.s_v, bounds.s_v, ProofParameter::SV)?;
    let s_e = within(&proof.s_e, bounds.s_e, ProofParameter::SE)?;
    let s_m = proof
        .s_m
        .as_ref()
        .map(|s_m| within(s_m, bounds.s_m, ProofParameter::SM))
        .transpose()?;
    let t = member(&group, &proof.t, ProofParameter::T)?;
    let w = member(&group, &proof.w, ProofParameter::T)?;
    let relation = proof
        .relation
        .as_ref()
        .map(|relation| {
            Ok::<_, Error>(CheckedRelation {
                v: member(&group, &relation.v, ProofParameter::V)?,
                w: member(&group, &relation.w, ProofParameter::V)?,
                s_r: within(&relation.s_r, bounds.s_r, ProofParameter::V)?,
            })
        })
        .transpose()?;

    let validity = shown.validity.encode(&group);
    let attribute = disclosed_attribute.map(|attribute| encode_attribute(&group, attribute));
    let restated =
        restate(&group, &t, &validity, attribute.as_ref()).ok_or_else(|| reject(ProofParameter::T))?;

    Ok(CheckedProof {
        group,
        t,
        w,
        restated,
        s_u,
        s_v,
        s_e,
        s_m,
        relation,
    })
}

fn check_equations(checked: &CheckedProof, challenge: &Exponent) -> Result<(), Error> {
    let group = checked.group.as_ref();

    if let Some(relation) = &checked.relation {
        // R0^s_u * S^s_r = w_v * V^c
        let lhs = group.multi_pow([
            (group.generator(Generator::Secret), &checked.s_u),
            (group.generator(Generator::Randomizer), &relation.s_r),
        ]);
        let rhs = group.mul(&relation.w, &mod_pow(&relation.v, challenge, group.modulus()));
        if !group.elements_eq(&lhs, &rhs) {
            return Err(reject(ProofParameter::SU));
        }
    }

    // t^s_e * S^s_v [* R0^s_u] [* R1^s_m] [* V^c] = w * T'^c
    let mut terms = Vec::with_capacity(4);
    terms.push((&checked.t, &checked.s_e));
    terms.push((group.generator(Generator::Randomizer), &checked.s_v));
    if checked.relation.is_none() {
        terms.push((group.generator(Generator::Secret), &checked.s_u));
    }
    if let Some(s_m) = &checked.s_m {
        terms.push((group.generator(Generator::Attribute), s_m));
    }
    let mut lhs = group.multi_pow(terms);
    if let Some(relation) = &checked.relation {
        lhs = group.mul(&lhs, &mod_pow(&relation.v, challenge, group.modulus()));
    }
    let rhs = group.mul(
        &checked.w,
        &mod_pow(&checked.restated, challenge, group.modulus()),
    );
    match group.elements_eq(&lhs, &rhs) {
        true => Ok(()),
        false if checked.relation.is_some() => Err(reject(ProofParameter::SV)),
        false => Err(reject(ProofParameter::SU)),
    }
}

#[cfg(test)]
mod test {
    use alloc::{sync::Arc, vec, vec::Vec};

    use num_bigint::BigUint;

    use super::{show, verify_show, Presentation, ShowContext};
    use crate::{
        certificate::Certificate,
        envelope::{Signature, SignatureEnvelope, Subject},
        error::{Error, ProofParameter},
        group::{GroupParameters, HostId},
        testing,
    };

    fn resolve(host: &HostId) -> Result<Arc<GroupParameters>, Error> {
        [testing::group(0), testing::group(1)]
            .into_iter()
            .find(|group| group.host() == host)
            .ok_or(Error::NotFound)
    }

    fn check(envelope: &SignatureEnvelope) -> Result<(), Error> {
        let Signature::CredentialsBased {
            proof,
            certificates,
            disclosed_attributes,
        } = envelope.signature()
        else {
            panic!("expected a credentials-based signature");
        };
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
            testing::NOW,
            resolve,
        )
    }

    fn certificates(count: usize) -> (crate::bounded::Exponent, Vec<Certificate>) {
        let mut rng = rand::thread_rng();
        let secret = testing::secret(0, &mut rng);
        let certificates = (0..count)
            .map(|i| {
                let attribute = alloc::format!("attribute-{i}");
                testing::issue(i % 2, &secret, attribute.as_bytes(), testing::validity(), &mut rng)
            })
            .collect();
        (secret, certificates)
    }

    fn envelope(presentation: Presentation<'_>, secret: &crate::bounded::Exponent) -> SignatureEnvelope {
        presentation
            .show(
                secret,
                Subject::new("alice"),
                testing::NOW,
                b"payload".to_vec(),
                &mut rand::thread_rng(),
            )
            .unwrap()
    }

    #[test]
    fn disclosed_and_hidden_round_trip() {
        let (secret, certificates) = certificates(2);
        check(&envelope(Presentation::new(&certificates), &secret)).unwrap();
        check(&envelope(Presentation::new(&certificates).disclose(1), &secret)).unwrap();
        check(&envelope(Presentation::new(&certificates).disclose(2), &secret)).unwrap();
        check(&envelope(
            Presentation::new(&certificates).disclose(1).without_relation(),
            &secret,
        ))
        .unwrap();
    }

    #[test]
    fn show_checks_disclosed_attributes() {
        let (secret, certificates) = certificates(1);
        let mut rng = rand::thread_rng();
        let Err(Error::DisclosureMismatch) = show(
            &certificates,
            &[b"not-the-attribute".as_slice()],
            &secret,
            Subject::new("alice"),
            testing::NOW,
            vec![],
            &mut rng,
        ) else {
            panic!("mismatched disclosure accepted");
        };
        let Err(Error::DisclosureMismatch) = show(
            &certificates,
            &[b"attribute-0".as_slice(), b"attribute-1".as_slice()],
            &secret,
            Subject::new("alice"),
            testing::NOW,
            vec![],
            &mut rng,
        ) else {
            panic!("more disclosed attributes than certificates accepted");
        };
        let envelope = show(
            &certificates,
            &[b"attribute-0".as_slice()],
            &secret,
            Subject::new("alice"),
            testing::NOW,
            vec![],
            &mut rng,
        )
        .unwrap();
        check(&envelope).unwrap();
    }

    #[test]
    fn oversized_secret_fails_to_show() {
        let (_, certificates) = certificates(1);
        let bits = certificates[0].group().exponent_bits() + 1;
        let secret =
            crate::bounded::Exponent::new(BigUint::from(1u8) << (bits - 1), bits).unwrap();
        let Err(Error::ExponentTooLarge { .. }) = Presentation::new(&certificates).show(
            &secret,
            Subject::new("alice"),
            testing::NOW,
            vec![],
            &mut rand::thread_rng(),
        ) else {
            panic!("secret over the exponent bound was shown");
        };
    }

    #[test]
    fn wrong_secret_fails() {
        let (_, certificates) = certificates(1);
        let other = testing::secret(0, &mut rand::thread_rng());
        let envelope = envelope(Presentation::new(&certificates), &other);
        let Err(Error::InvalidCredentialsSignature {
            parameter: ProofParameter::SV,
        }) = check(&envelope)
        else {
            panic!("show with the wrong secret verified");
        };
    }

    #[test]
    fn tampered_responses_name_their_field() {
        let (secret, certificates) = certificates(1);
        let original = envelope(Presentation::new(&certificates), &secret);

        let cases: [(fn(&mut super::CertificateProof), ProofParameter); 4] = [
            (|p| p.s_e = flip(&p.s_e), ProofParameter::SV),
            (|p| p.s_v = flip(&p.s_v), ProofParameter::SV),
            (
                |p| p.s_m = p.s_m.as_ref().map(flip),
                ProofParameter::SV,
            ),
            (
                |p| {
                    if let Some(relation) = p.relation.as_mut() {
                        relation.s_r = flip(&relation.s_r);
                    }
                },
                ProofParameter::SU,
            ),
        ];
        for (tamper, parameter) in cases {
            let envelope = with_proof(&original, |proof| tamper(&mut proof.certificates[0]));
            let Err(Error::InvalidCredentialsSignature { parameter: found }) = check(&envelope)
            else {
                panic!("tampered proof verified");
            };
            assert_eq!(found, parameter);
        }
    }

    #[test]
    fn oversized_response_is_rejected_by_bound() {
        let (secret, certificates) = certificates(1);
        let original = envelope(Presentation::new(&certificates), &secret);
        let envelope = with_proof(&original, |proof| {
            let s_e = &mut proof.certificates[0].s_e;
            let bits = s_e.max_bits() + 64;
            *s_e = crate::bounded::Exponent::new(BigUint::from(1u8) << (bits - 1), bits).unwrap();
        });
        let Err(Error::InvalidCredentialsSignature {
            parameter: ProofParameter::SE,
        }) = check(&envelope)
        else {
            panic!("oversized s_e accepted");
        };
    }

    #[test]
    fn mismatched_shapes_name_a_certificate() {
        let (secret, certificates) = certificates(2);
        let original = envelope(Presentation::new(&certificates), &secret);
        let envelope = with_proof(&original, |proof| {
            proof.certificates.pop();
        });
        let Err(Error::InvalidCredentialsSignature {
            parameter: ProofParameter::Certificate(1),
        }) = check(&envelope)
        else {
            panic!("proof with a missing certificate verified");
        };
    }

    #[test]
    fn extra_disclosed_attribute_names_the_index_past_the_end() {
        let (secret, certificates) = certificates(2);
        let original = envelope(Presentation::new(&certificates).disclose(2), &secret);
        let (subject, timestamp, payload, signature) = original.into_parts();
        let Signature::CredentialsBased {
            proof,
            certificates: shown,
            mut disclosed_attributes,
        } = signature
        else {
            panic!("expected a credentials-based signature");
        };
        disclosed_attributes.push(b"attribute-2".to_vec());
        let envelope = SignatureEnvelope::new(
            subject,
            timestamp,
            payload,
            Signature::CredentialsBased {
                proof,
                certificates: shown,
                disclosed_attributes,
            },
        );
        let Err(Error::InvalidCredentialsSignature {
            parameter: ProofParameter::Certificate(2),
        }) = check(&envelope)
        else {
            panic!("disclosed attribute without a certificate accepted");
        };
    }

    #[test]
    fn without_relation_equation_failures_name_s_u() {
        let (secret, certificates) = certificates(1);
        let original = envelope(
            Presentation::new(&certificates).disclose(1).without_relation(),
            &secret,
        );
        let envelope = with_proof(&original, |proof| {
            proof.certificates[0].s_v = flip(&proof.certificates[0].s_v);
        });
        let Err(Error::InvalidCredentialsSignature {
            parameter: ProofParameter::SU,
        }) = check(&envelope)
        else {
            panic!("tampered s_v verified without a relation commitment");
        };
    }

    #[test]
    fn removed_attribute_response_names_s_m() {
        let (secret, certificates) = certificates(1);
        let original = envelope(Presentation::new(&certificates), &secret);
        let envelope = with_proof(&original, |proof| proof.certificates[0].s_m = None);
        let Err(Error::InvalidCredentialsSignature {
            parameter: ProofParameter::SM,
        }) = check(&envelope)
        else {
            panic!("hidden attribute without a response verified");
        };
    }

    fn flip(value: &crate::bounded::Exponent) -> crate::bounded::Exponent {
        let flipped = value.value() ^ BigUint::from(1u8);
        crate::bounded::Exponent::new(flipped, value.max_bits()).unwrap()
    }

    fn with_proof(
        envelope: &SignatureEnvelope,
        tamper: impl FnOnce(&mut super::CredentialShowProof),
    ) -> SignatureEnvelope {
        let (subject, timestamp, payload, signature) = envelope.clone().into_parts();
        let Signature::CredentialsBased {
            mut proof,
            certificates,
            disclosed_attributes,
        } = signature
        else {
            panic!("expected a credentials-based signature");
        };
        tamper(&mut proof);
        SignatureEnvelope::new(
            subject,
            timestamp,
            payload,
            Signature::CredentialsBased {
                proof,
                certificates,
                disclosed_attributes,
            },
        )
    }
}
