//! Arbitrary-precision integers with an enforced bit-length ceiling, and the modular arithmetic
//! built on them.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use crate::{codec::DecodeError, error::Error};

/// An unsigned integer whose bit length never exceeds `max_bits`.
///
/// Values over the bound are rejected at construction rather than truncated. The bound also fixes
/// the number of ladder steps taken when the integer is used as an exponent in [mod_pow], so it is
/// part of the value's identity and not just a check.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBoundedInteger", into = "RawBoundedInteger")]
pub struct BoundedInteger {
    value: BigUint,
    max_bits: u32,
}

/// A [BoundedInteger] used as the power in group arithmetic. Exponents may be secret.
pub type Exponent = BoundedInteger;

impl BoundedInteger {
    pub fn new(value: BigUint, max_bits: u32) -> Result<Self, Error> {
        let bits = value.bits();
        if bits > u64::from(max_bits) {
            return Err(Error::OutOfRange { bits, max_bits });
        }
        Ok(Self { value, max_bits })
    }

    pub fn from_u64(value: u64, max_bits: u32) -> Result<Self, Error> {
        Self::new(BigUint::from(value), max_bits)
    }

    pub fn from_bytes_be(bytes: &[u8], max_bits: u32) -> Result<Self, Error> {
        Self::new(BigUint::from_bytes_be(bytes), max_bits)
    }

    /// Sample a uniformly random integer below `2^max_bits`.
    pub fn random<R>(rng: &mut R, max_bits: u32) -> Self
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        Self {
            value: rng.gen_biguint(u64::from(max_bits)),
            max_bits,
        }
    }

    /// Keep only the low `max_bits` bits of `value`.
    pub(crate) fn truncated(value: BigUint, max_bits: u32) -> Self {
        let mask = (BigUint::one() << max_bits) - 1u8;
        Self {
            value: value & mask,
            max_bits,
        }
    }

    /// Re-state this value under a different bound, failing if it does not fit.
    pub fn rebound(&self, max_bits: u32) -> Result<Self, Error> {
        Self::new(self.value.clone(), max_bits)
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn into_value(self) -> BigUint {
        self.value
    }

    pub fn max_bits(&self) -> u32 {
        self.max_bits
    }

    /// Actual bit length of the value, which is at most [BoundedInteger::max_bits].
    pub fn bits(&self) -> u64 {
        self.value.bits()
    }

    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.value.to_bytes_be()
    }

    pub fn add(&self, rhs: &BoundedInteger, modulus: &BigUint) -> BoundedInteger {
        Self::reduced((&self.value + &rhs.value) % modulus, modulus)
    }

    pub fn mul(&self, rhs: &BoundedInteger, modulus: &BigUint) -> BoundedInteger {
        Self::reduced((&self.value * &rhs.value) % modulus, modulus)
    }

    pub fn mod_pow(&self, exponent: &Exponent, modulus: &BigUint) -> BoundedInteger {
        Self::reduced(mod_pow(&self.value, exponent, modulus), modulus)
    }

    fn reduced(value: BigUint, modulus: &BigUint) -> Self {
        Self {
            value,
            max_bits: bit_length(modulus),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawBoundedInteger {
    value: String,
    max_bits: u32,
}

impl TryFrom<RawBoundedInteger> for BoundedInteger {
    type Error = Error;

    fn try_from(raw: RawBoundedInteger) -> Result<Self, Self::Error> {
        let value = BigUint::parse_bytes(raw.value.as_bytes(), 16).ok_or_else(|| {
            Error::Decode(DecodeError("bounded integer is not hexadecimal".to_string()))
        })?;
        Self::new(value, raw.max_bits)
    }
}

impl From<BoundedInteger> for RawBoundedInteger {
    fn from(value: BoundedInteger) -> Self {
        Self {
            value: value.value.to_str_radix(16),
            max_bits: value.max_bits,
        }
    }
}

pub(crate) fn bit_length(value: &BigUint) -> u32 {
    u32::try_from(value.bits()).unwrap_or(u32::MAX)
}

/// Compute `base^exponent mod modulus` with a Montgomery ladder.
///
/// The ladder has a constant structure: it always runs for `exponent.max_bits()` steps, performs
/// the same multiplications on every step, and swaps registers limb by limb with constant-time
/// selection. Neither the bit pattern nor the actual length of the exponent changes which
/// operations run.
///
/// NOTE: This is not constant time. The multiplications go through `BigUint`, whose running time
/// follows the normalized size of the registers.
///
/// # Panics
///
/// Panics if `modulus` is zero.
pub fn mod_pow(base: &BigUint, exponent: &Exponent, modulus: &BigUint) -> BigUint {
    assert!(!modulus.is_zero(), "modulus must be non-zero");
    let width = limb_count(modulus);
    let exponent_limbs = Limbs::new(exponent.value(), limb_count_bits(exponent.max_bits()));

    let mut r0 = Limbs::new(&(BigUint::one() % modulus), width);
    let mut r1 = Limbs::new(&(base % modulus), width);
    for i in (0..exponent.max_bits() as usize).rev() {
        let bit = Choice::from(((exponent_limbs.0[i / 32] >> (i % 32)) & 1) as u8);
        Limbs::conditional_swap(&mut r0, &mut r1, bit);
        let (a, b) = (r0.to_biguint(), r1.to_biguint());
        r1 = Limbs::new(&((&a * &b) % modulus), width);
        r0 = Limbs::new(&((&a * &a) % modulus), width);
        Limbs::conditional_swap(&mut r0, &mut r1, bit);
    }
    r0.to_biguint()
}

/// Modular inverse by the extended Euclidean algorithm. Returns `None` when `value` and `modulus`
/// share a factor.
///
/// NOTE: Running time depends on the inputs. Only call this on public values.
pub fn mod_inverse(value: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    if modulus.is_zero() {
        return None;
    }
    let m = BigInt::from(modulus.clone());
    let (mut old_r, mut r) = (BigInt::from(value % modulus), m.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = core::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = core::mem::replace(&mut s, next_s);
    }
    if !old_r.is_one() {
        return None;
    }
    (((old_s % &m) + &m) % &m).to_biguint()
}

/// Constant-time equality of two values encoded at the byte width of `width_bits`.
pub(crate) fn ct_eq_width(a: &BigUint, b: &BigUint, width_bits: u32) -> Choice {
    let len = (width_bits as usize).div_ceil(8);
    fixed_bytes(a, len).as_slice().ct_eq(fixed_bytes(b, len).as_slice())
}

fn fixed_bytes(value: &BigUint, len: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    if bytes.len() >= len {
        return bytes;
    }
    let mut padded = Vec::with_capacity(len);
    padded.resize(len - bytes.len(), 0u8);
    padded.extend_from_slice(&bytes);
    padded
}

fn limb_count(modulus: &BigUint) -> usize {
    limb_count_bits(bit_length(modulus))
}

fn limb_count_bits(bits: u32) -> usize {
    (bits as usize).div_ceil(32).max(1)
}

/// Fixed-width little-endian limbs, so that two registers always have the same shape.
struct Limbs(Vec<u32>);

impl Limbs {
    fn new(value: &BigUint, width: usize) -> Self {
        let mut limbs = value.to_u32_digits();
        limbs.resize(width.max(limbs.len()), 0);
        Self(limbs)
    }

    fn to_biguint(&self) -> BigUint {
        BigUint::from_slice(&self.0)
    }

    fn conditional_swap(a: &mut Self, b: &mut Self, choice: Choice) {
        for (x, y) in a.0.iter_mut().zip(b.0.iter_mut()) {
            u32::conditional_swap(x, y, choice);
        }
    }
}
