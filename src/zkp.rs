//! Schnorr proofs over Ristretto, built on lox-zkp.

use alloc::vec::Vec;
use core::convert::Infallible;

use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    Scalar as RistrettoScalar,
};

pub use lox_zkp::{
    toolbox::{prover::Prover, verifier::Verifier, SchnorrCS},
    CompactProof, ProofError, Transcript,
};

/// One side of a proof. The prover allocates variables with their assignments, the verifier with
/// only the public points.
pub trait ProofSide: SchnorrCS {
    type Scalar;
    type Point;
    type Error;

    fn alloc_scalar(
        &mut self,
        label: &'static str,
        value: Self::Scalar,
    ) -> Result<Self::ScalarVar, Self::Error>;

    fn alloc_point(
        &mut self,
        label: &'static str,
        value: Self::Point,
    ) -> Result<Self::PointVar, Self::Error>;
}

impl ProofSide for Prover<'_> {
    type Scalar = RistrettoScalar;
    type Point = RistrettoPoint;
    type Error = Infallible;

    fn alloc_scalar(
        &mut self,
        label: &'static str,
        value: RistrettoScalar,
    ) -> Result<Self::ScalarVar, Self::Error> {
        Ok(self.allocate_scalar(label.as_bytes(), value))
    }

    fn alloc_point(
        &mut self,
        label: &'static str,
        value: RistrettoPoint,
    ) -> Result<Self::PointVar, Self::Error> {
        Ok(self.allocate_point(label.as_bytes(), value).0)
    }
}

impl ProofSide for Verifier<'_> {
    type Scalar = ();
    type Point = CompressedRistretto;
    type Error = ProofError;

    fn alloc_scalar(&mut self, label: &'static str, _: ()) -> Result<Self::ScalarVar, Self::Error> {
        Ok(self.allocate_scalar(label.as_bytes()))
    }

    fn alloc_point(
        &mut self,
        label: &'static str,
        value: CompressedRistretto,
    ) -> Result<Self::PointVar, Self::Error> {
        self.allocate_point(label.as_bytes(), value)
    }
}

/// A linear relation `lhs = sum_i x_i * G_i`, built up term by term.
pub struct Constraint<CS: SchnorrCS> {
    linear_combination: Vec<(CS::ScalarVar, CS::PointVar)>,
}

impl<CS: ProofSide> Constraint<CS> {
    pub fn new() -> Self {
        Self {
            linear_combination: Vec::new(),
        }
    }

    pub fn add(
        &mut self,
        cs: &mut CS,
        scalar: (&'static str, CS::Scalar),
        point: (&'static str, CS::Point),
    ) -> Result<(), CS::Error> {
        let x_var = cs.alloc_scalar(scalar.0, scalar.1)?;
        let g_var = cs.alloc_point(point.0, point.1)?;
        self.linear_combination.push((x_var, g_var));
        Ok(())
    }

    pub fn eq(self, cs: &mut CS, lhs: (&'static str, CS::Point)) -> Result<(), CS::Error> {
        let lhs_var = cs.alloc_point(lhs.0, lhs.1)?;
        cs.constrain(lhs_var, self.linear_combination);
        Ok(())
    }
}

impl<CS: ProofSide> Default for Constraint<CS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a proof as its challenge followed by its responses, 32 bytes each.
pub fn encode_proof(proof: &CompactProof) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 * (1 + proof.responses.len()));
    out.extend_from_slice(proof.challenge.as_bytes());
    for response in &proof.responses {
        out.extend_from_slice(response.as_bytes());
    }
    out
}

/// Parse a proof with exactly `responses` responses. Non-canonical scalars are rejected.
pub fn decode_proof(bytes: &[u8], responses: usize) -> Option<CompactProof> {
    if bytes.len() != 32 * (1 + responses) {
        return None;
    }
    let mut scalars = bytes.chunks_exact(32).map(|chunk| {
        let bytes: [u8; 32] = chunk.try_into().ok()?;
        Option::<RistrettoScalar>::from(RistrettoScalar::from_canonical_bytes(bytes))
    });
    let challenge = scalars.next()??;
    let responses = scalars.collect::<Option<Vec<_>>>()?;
    Some(CompactProof {
        challenge,
        responses,
    })
}
