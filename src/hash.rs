//! Hash-to-integer helpers used for Fiat-Shamir challenges and attribute encodings.

use alloc::vec::Vec;

use blake2::Blake2b512;
use digest::Digest;
use num_bigint::BigUint;

use crate::bounded::Exponent;

pub trait FromHash: Sized {
    /// Derive a value of at most `bits` bits from a hash state. When more bits are requested than
    /// the digest produces, the output is extended by finalizing copies of the state with a block
    /// counter appended.
    fn from_hash<D>(hash: D, bits: u32) -> Self
    where
        D: Digest + Clone;

    fn hash_from_bytes<D>(input: &[u8], bits: u32) -> Self
    where
        D: Digest + Clone,
    {
        let mut hash = D::new();
        Digest::update(&mut hash, input);
        Self::from_hash(hash, bits)
    }
}

impl FromHash for BigUint {
    fn from_hash<D>(hash: D, bits: u32) -> Self
    where
        D: Digest + Clone,
    {
        let len = (bits as usize).div_ceil(8);
        let mut out = Vec::with_capacity(len + <D as Digest>::output_size());
        let mut counter = 0u32;
        while out.len() < len {
            let mut block = hash.clone();
            Digest::update(&mut block, counter.to_be_bytes());
            out.extend_from_slice(&block.finalize());
            counter += 1;
        }
        out.truncate(len);
        BigUint::from_bytes_be(&out) >> (len * 8 - bits as usize)
    }
}

/// Running hash over labeled, length-prefixed values.
///
/// Every value is framed by its length so two different sequences of appends never produce the
/// same input to the hash.
#[derive(Clone)]
pub struct HashTranscript(Blake2b512);

impl HashTranscript {
    pub fn new(domain: &'static str) -> Self {
        let mut transcript = Self(Blake2b512::new());
        transcript.append_raw(domain.as_bytes());
        transcript
    }

    pub fn append_bytes(&mut self, label: &'static str, bytes: &[u8]) {
        self.append_raw(label.as_bytes());
        self.append_raw(bytes);
    }

    pub fn append_u64(&mut self, label: &'static str, value: u64) {
        self.append_bytes(label, &value.to_be_bytes());
    }

    pub fn append_integer(&mut self, label: &'static str, value: &BigUint) {
        self.append_bytes(label, &value.to_bytes_be());
    }

    pub fn finalize_integer(self, bits: u32) -> BigUint {
        BigUint::from_hash(self.0, bits)
    }

    pub fn finalize_exponent(self, bits: u32) -> Exponent {
        Exponent::truncated(self.finalize_integer(bits), bits)
    }

    fn append_raw(&mut self, bytes: &[u8]) {
        Digest::update(&mut self.0, (bytes.len() as u64).to_be_bytes());
        Digest::update(&mut self.0, bytes);
    }
}

/// Hash arbitrary bytes into an integer of at most `bits` bits under a domain label.
pub fn hash_to_integer(domain: &'static str, input: &[u8], bits: u32) -> BigUint {
    let mut transcript = HashTranscript::new(domain);
    transcript.append_bytes("input", input);
    transcript.finalize_integer(bits)
}
