//! Host signing keys.
//!
//! A host signature is a non-interactive Schnorr proof of knowledge of the host's secret key, with
//! the signed message absorbed into the Fiat-Shamir transcript before the proof is generated.

use alloc::{string::String, vec::Vec};
use core::{convert::Infallible, fmt};

use curve25519_dalek::{
    constants::{
        RISTRETTO_BASEPOINT_COMPRESSED, RISTRETTO_BASEPOINT_POINT, RISTRETTO_BASEPOINT_TABLE,
    },
    ristretto::{CompressedRistretto, RistrettoPoint},
    traits::IsIdentity,
    Scalar as RistrettoScalar,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    envelope::{Subject, Timestamp},
    error::Error,
    zkp::{
        decode_proof, encode_proof, CompactProof, Constraint, ProofError, ProofSide, Prover,
        Transcript, Verifier,
    },
};

macro_rules! label {
    ($s:literal) => {
        concat!("anonsig::host::", $s)
    };
}

/// Length of an encoded host signature: a challenge and one response.
pub const SIGNATURE_LEN: usize = 64;

/// Names a host signing key in a key store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SignerKeyId(String);

impl SignerKeyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignerKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HostSecretKey(RistrettoScalar);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostPublicKey {
    point: RistrettoPoint,
    compressed: CompressedRistretto,
}

impl HostSecretKey {
    pub fn gen<R>(rng: &mut R) -> Self
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let mut bytes = [0u8; 64];
        rng.fill_bytes(&mut bytes);
        let key = Self(RistrettoScalar::from_bytes_mod_order_wide(&bytes));
        bytes.zeroize();
        key
    }

    pub fn public_key(&self) -> HostPublicKey {
        let point = &self.0 * RISTRETTO_BASEPOINT_TABLE;
        HostPublicKey {
            point,
            compressed: point.compress(),
        }
    }

    /// Sign `payload` on behalf of `subject` at `timestamp`, under the given key id.
    ///
    /// The proof nonce is derived from the transcript, the secret key and fresh thread-local
    /// randomness.
    pub fn sign(
        &self,
        key_id: &SignerKeyId,
        subject: &Subject,
        timestamp: Timestamp,
        payload: &[u8],
    ) -> Vec<u8> {
        let mut transcript = message_transcript(key_id, subject, timestamp, payload);
        match self.prove(&mut transcript) {
            Ok(proof) => encode_proof(&proof),
            Err(never) => match never {},
        }
    }

    fn prove(&self, transcript: &mut Transcript) -> Result<CompactProof, Infallible> {
        let mut prover = Prover::new(label!("constraints").as_bytes(), transcript);
        key_statement(
            &mut prover,
            self.0,
            RISTRETTO_BASEPOINT_POINT,
            self.public_key().point,
        )?;
        Ok(prover.prove_compact())
    }
}

impl fmt::Debug for HostSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostSecretKey(..)")
    }
}

impl HostPublicKey {
    /// Parse a compressed Ristretto point. The identity is not a valid key.
    pub fn from_bytes(bytes: [u8; 32]) -> Option<Self> {
        let compressed = CompressedRistretto(bytes);
        let point = compressed.decompress()?;
        if point.is_identity() {
            return None;
        }
        Some(Self { point, compressed })
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.compressed.to_bytes()
    }

    /// Check a host signature over the message.
    pub fn verify(
        &self,
        key_id: &SignerKeyId,
        subject: &Subject,
        timestamp: Timestamp,
        payload: &[u8],
        signature: &[u8],
    ) -> Result<(), Error> {
        if signature.len() != SIGNATURE_LEN {
            return Err(Error::InvalidHostSignature);
        }
        let proof = decode_proof(signature, 1).ok_or(Error::InvalidHostSignature)?;
        let mut transcript = message_transcript(key_id, subject, timestamp, payload);
        self.check(&mut transcript, &proof)
            .map_err(|_| Error::InvalidHostSignature)
    }

    fn check(&self, transcript: &mut Transcript, proof: &CompactProof) -> Result<(), ProofError> {
        let mut verifier = Verifier::new(label!("constraints").as_bytes(), transcript);
        key_statement(
            &mut verifier,
            (),
            RISTRETTO_BASEPOINT_COMPRESSED,
            self.compressed,
        )?;
        verifier.verify_compact(proof)
    }
}

/// `X = x * B`
fn key_statement<CS: ProofSide>(
    cs: &mut CS,
    secret: CS::Scalar,
    basepoint: CS::Point,
    public: CS::Point,
) -> Result<(), CS::Error> {
    let mut constraint = Constraint::new();
    constraint.add(cs, (label!("x"), secret), (label!("B"), basepoint))?;
    constraint.eq(cs, (label!("X"), public))
}

fn message_transcript(
    key_id: &SignerKeyId,
    subject: &Subject,
    timestamp: Timestamp,
    payload: &[u8],
) -> Transcript {
    let mut transcript = Transcript::new(label!("transcript").as_bytes());
    transcript.append_message(label!("key_id").as_bytes(), key_id.as_str().as_bytes());
    transcript.append_message(label!("subject").as_bytes(), subject.as_str().as_bytes());
    transcript.append_message(label!("timestamp").as_bytes(), &timestamp.as_secs().to_be_bytes());
    transcript.append_message(label!("payload").as_bytes(), payload);
    transcript
}

#[cfg(test)]
mod test {
    use super::{HostPublicKey, HostSecretKey, SignerKeyId, SIGNATURE_LEN};
    use crate::{
        envelope::{Subject, Timestamp},
        error::Error,
    };

    fn fixture() -> (HostSecretKey, SignerKeyId, Subject, Timestamp) {
        (
            HostSecretKey::gen(&mut rand::thread_rng()),
            SignerKeyId::new("host-a#1"),
            Subject::new("alice"),
            Timestamp::from_secs(1_700_000_000),
        )
    }

    #[test]
    fn basic_success() {
        let (key, id, subject, ts) = fixture();
        let sig = key.sign(&id, &subject, ts, b"hello");
        assert_eq!(sig.len(), SIGNATURE_LEN);
        key.public_key()
            .verify(&id, &subject, ts, b"hello", &sig)
            .unwrap();
    }

    #[test]
    fn any_changed_input_fails() {
        let (key, id, subject, ts) = fixture();
        let public = key.public_key();
        let sig = key.sign(&id, &subject, ts, b"hello");

        let Err(Error::InvalidHostSignature) = public.verify(&id, &subject, ts, b"hellp", &sig)
        else {
            panic!("signature verified over a different payload");
        };
        let Err(Error::InvalidHostSignature) =
            public.verify(&id, &Subject::new("bob"), ts, b"hello", &sig)
        else {
            panic!("signature verified for a different subject");
        };
        let Err(Error::InvalidHostSignature) =
            public.verify(&id, &subject, Timestamp::from_secs(1), b"hello", &sig)
        else {
            panic!("signature verified at a different timestamp");
        };
        let Err(Error::InvalidHostSignature) =
            public.verify(&SignerKeyId::new("host-a#2"), &subject, ts, b"hello", &sig)
        else {
            panic!("signature verified under a different key id");
        };
        let other = HostSecretKey::gen(&mut rand::thread_rng()).public_key();
        let Err(Error::InvalidHostSignature) = other.verify(&id, &subject, ts, b"hello", &sig)
        else {
            panic!("signature verified under a different key");
        };
    }

    #[test]
    fn every_signature_byte_matters() {
        let (key, id, subject, ts) = fixture();
        let public = key.public_key();
        let sig = key.sign(&id, &subject, ts, b"hello");
        for i in 0..sig.len() {
            let mut tampered = sig.clone();
            tampered[i] ^= 0x01;
            let Err(Error::InvalidHostSignature) =
                public.verify(&id, &subject, ts, b"hello", &tampered)
            else {
                panic!("signature verified with byte {i} flipped");
            };
        }
        let Err(Error::InvalidHostSignature) =
            public.verify(&id, &subject, ts, b"hello", &sig[..SIGNATURE_LEN - 1])
        else {
            panic!("truncated signature verified");
        };
    }

    #[test]
    fn public_key_bytes() {
        let public = HostSecretKey::gen(&mut rand::thread_rng()).public_key();
        assert_eq!(HostPublicKey::from_bytes(public.to_bytes()), Some(public));
        assert_eq!(HostPublicKey::from_bytes([0u8; 32]), None);
    }
}
