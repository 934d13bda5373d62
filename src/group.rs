//! Public group parameters owned by a host.
//!
//! All group arithmetic happens in the quadratic residues modulo an RSA modulus. The host knows the
//! factorization, which is what lets it sign certificates; everyone else only sees the modulus and
//! the generators.

use alloc::{string::String, vec::Vec};
use core::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::{
    bounded::{bit_length, ct_eq_width, mod_inverse, mod_pow, BoundedInteger, Exponent},
    error::Error,
};

/// Size of Fiat-Shamir challenges.
pub const CHALLENGE_BITS: u32 = 256;
/// Extra bits of randomness that statistically hide a witness inside its response.
pub const STATISTICAL_BITS: u32 = 80;
/// Size of the hidden offset of a certificate exponent above `2^(l_e - 1)`.
pub const OFFSET_BITS: u32 = 120;
/// Minimum modulus size applied by [GroupConfig::default].
pub const DEFAULT_MIN_MODULUS_BITS: u32 = 1024;
/// Size of committed secrets and attribute encodings applied by [GroupConfig::default].
pub const DEFAULT_EXPONENT_BITS: u32 = 256;

/// Identifies the host that owns a set of group parameters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HostId(String);

impl HostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of each generator in the ordered generator list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generator {
    /// `g`, the base for client secrets.
    Secret = 0,
    /// `h`, the base for randomizers.
    Randomizer = 1,
    /// Base for the certified attribute.
    Attribute = 2,
    /// Base for the certificate validity window.
    Validity = 3,
    /// `Z`, the value every certificate equation resolves to.
    Certificate = 4,
}

impl Generator {
    pub const COUNT: usize = 5;
}

/// Configured bounds for a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub min_modulus_bits: u32,
    /// Maximum size of a committed secret or encoded attribute.
    pub exponent_bits: u32,
    /// Maximum size of any show proof response. When unset, the smallest bound that fits every
    /// honest response is used.
    pub proof_bits: Option<u32>,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            min_modulus_bits: DEFAULT_MIN_MODULUS_BITS,
            exponent_bits: DEFAULT_EXPONENT_BITS,
            proof_bits: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupParameters {
    host: HostId,
    modulus: BigUint,
    generators: Vec<BigUint>,
    exponent_bits: u32,
    proof_bits: u32,
}

impl GroupParameters {
    pub fn new(
        host: HostId,
        modulus: BigUint,
        generators: Vec<BigUint>,
        config: &GroupConfig,
    ) -> Result<Self, Error> {
        if (&modulus % 2u8).is_zero() {
            return Err(Error::InvalidGroup("modulus must be odd"));
        }
        let modulus_bits = bit_length(&modulus);
        if modulus_bits < config.min_modulus_bits {
            return Err(Error::InvalidGroup("modulus is below the minimum size"));
        }
        if generators.len() != Generator::COUNT {
            return Err(Error::InvalidGroup("wrong number of generators"));
        }
        if config.exponent_bits == 0 || config.exponent_bits >= modulus_bits {
            return Err(Error::InvalidGroup(
                "exponent bound must be non-zero and below the modulus size",
            ));
        }
        // Every derived bound is at most this one, so the accessors below cannot overflow.
        let required = required_proof_bits(modulus_bits, config.exponent_bits)
            .ok_or(Error::InvalidGroup("derived bounds overflow"))?;

        let mut group = Self {
            host,
            modulus,
            generators,
            exponent_bits: config.exponent_bits,
            proof_bits: 0,
        };
        if !group.generators.iter().all(|g| group.verify_membership(g)) {
            return Err(Error::InvalidGroup("generator outside the group"));
        }

        let proof_bits = config.proof_bits.unwrap_or(required);
        if proof_bits < required || proof_bits <= group.exponent_bits {
            return Err(Error::InvalidGroup("proof bound cannot hold honest responses"));
        }
        group.proof_bits = proof_bits;
        Ok(group)
    }

    pub fn host(&self) -> &HostId {
        &self.host
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn modulus_bits(&self) -> u32 {
        bit_length(&self.modulus)
    }

    pub fn generators(&self) -> &[BigUint] {
        &self.generators
    }

    pub fn generator(&self, generator: Generator) -> &BigUint {
        &self.generators[generator as usize]
    }

    pub fn exponent_bits(&self) -> u32 {
        self.exponent_bits
    }

    pub fn proof_bits(&self) -> u32 {
        self.proof_bits
    }

    /// Size of randomizers that re-blind certificates and commitments, `l_n + 80`.
    pub fn blinding_bits(&self) -> u32 {
        self.modulus_bits() + STATISTICAL_BITS
    }

    /// Size of issuer exponents. Large enough that an extracted exponent cannot collapse the
    /// certificate equation into a trivial root.
    pub fn certificate_exponent_bits(&self) -> u32 {
        self.exponent_bits + CHALLENGE_BITS + STATISTICAL_BITS + 5
    }

    /// Size of certificate randomizers. Leaves room to subtract a re-blinding term during a show
    /// without going negative.
    pub fn signature_randomizer_bits(&self) -> u32 {
        self.modulus_bits() + STATISTICAL_BITS + self.certificate_exponent_bits() + 2
    }

    /// Bound on the response `r + c * x` for a witness `x` of `witness_bits` bits.
    pub fn response_bits(&self, witness_bits: u32) -> u32 {
        witness_bits + CHALLENGE_BITS + STATISTICAL_BITS + 1
    }

    /// Whether `value` is usable as a group element: in `[2, n - 1]` and invertible mod `n`.
    pub fn verify_membership(&self, value: &BigUint) -> bool {
        *value >= BigUint::from(2u8)
            && *value < self.modulus
            && mod_inverse(value, &self.modulus).is_some()
    }

    /// Product of `base_i ^ exponent_i` over the given pairs.
    pub fn multi_pow<'a>(
        &self,
        terms: impl IntoIterator<Item = (&'a BigUint, &'a Exponent)>,
    ) -> BigUint {
        terms
            .into_iter()
            .fold(BigUint::from(1u8), |acc, (base, exponent)| {
                (acc * mod_pow(base, exponent, &self.modulus)) % &self.modulus
            })
    }

    pub fn pow(&self, generator: Generator, exponent: &Exponent) -> BigUint {
        mod_pow(self.generator(generator), exponent, &self.modulus)
    }

    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.modulus
    }

    pub fn div(&self, a: &BigUint, b: &BigUint) -> Option<BigUint> {
        Some(self.mul(a, &mod_inverse(b, &self.modulus)?))
    }

    /// Constant-time comparison of two group elements.
    pub fn elements_eq(&self, a: &BigUint, b: &BigUint) -> bool {
        ct_eq_width(a, b, self.modulus_bits()).into()
    }

    /// Wrap a value as a group element, checking it is bounded by the modulus size.
    pub fn element(&self, value: BigUint) -> Result<BoundedInteger, Error> {
        BoundedInteger::new(value, self.modulus_bits())
    }
}

/// `response_bits(signature_randomizer_bits)`, or `None` if any step overflows.
fn required_proof_bits(modulus_bits: u32, exponent_bits: u32) -> Option<u32> {
    let hiding = CHALLENGE_BITS + STATISTICAL_BITS;
    let l_e = exponent_bits.checked_add(hiding + 5)?;
    let l_v = modulus_bits
        .checked_add(STATISTICAL_BITS + 2)?
        .checked_add(l_e)?;
    l_v.checked_add(hiding + 1)
}

#[cfg(test)]
mod test {
    use alloc::vec;

    use num_bigint::BigUint;

    use super::{required_proof_bits, Generator, GroupConfig, GroupParameters, HostId};
    use crate::{error::Error, testing};

    fn small_config() -> GroupConfig {
        GroupConfig {
            min_modulus_bits: 8,
            exponent_bits: 4,
            ..GroupConfig::default()
        }
    }

    #[test]
    fn fixture_groups_are_valid() {
        let group = testing::group(0);
        assert_eq!(group.modulus_bits(), 1024);
        assert!(group.proof_bits() > group.exponent_bits());
        for g in group.generators() {
            assert!(group.verify_membership(g));
        }
    }

    #[test]
    fn rejects_even_modulus() {
        let Err(Error::InvalidGroup(_)) = GroupParameters::new(
            HostId::new("even"),
            BigUint::from(1000u32),
            vec![BigUint::from(3u8); Generator::COUNT],
            &small_config(),
        ) else {
            panic!("even modulus accepted");
        };
    }

    #[test]
    fn rejects_small_modulus() {
        let Err(Error::InvalidGroup(_)) = GroupParameters::new(
            HostId::new("small"),
            BigUint::from(1001u32),
            vec![BigUint::from(3u8); Generator::COUNT],
            &GroupConfig::default(),
        ) else {
            panic!("10-bit modulus accepted under the default minimum");
        };
    }

    #[test]
    fn rejects_generator_outside_group() {
        // 1001 = 7 * 11 * 13, so 7 is not invertible.
        for bad in [0u32, 1, 7, 1001, 2000] {
            let mut generators = vec![BigUint::from(3u8); Generator::COUNT];
            generators[Generator::Attribute as usize] = BigUint::from(bad);
            let Err(Error::InvalidGroup(_)) = GroupParameters::new(
                HostId::new("bad-generator"),
                BigUint::from(1001u32),
                generators,
                &small_config(),
            ) else {
                panic!("generator {bad} accepted");
            };
        }
    }

    #[test]
    fn rejects_undersized_proof_bound() {
        let base = testing::group(0);
        let config = GroupConfig {
            proof_bits: Some(base.exponent_bits() + 1),
            ..GroupConfig::default()
        };
        let Err(Error::InvalidGroup(_)) = GroupParameters::new(
            base.host().clone(),
            base.modulus().clone(),
            base.generators().to_vec(),
            &config,
        ) else {
            panic!("proof bound smaller than honest responses accepted");
        };
    }

    #[test]
    fn rejects_oversized_exponent_bound() {
        let base = testing::group(0);
        for exponent_bits in [base.modulus_bits(), 1 << 24, u32::MAX - 100, u32::MAX] {
            let config = GroupConfig {
                exponent_bits,
                ..GroupConfig::default()
            };
            let Err(Error::InvalidGroup(_)) = GroupParameters::new(
                base.host().clone(),
                base.modulus().clone(),
                base.generators().to_vec(),
                &config,
            ) else {
                panic!("exponent bound of {exponent_bits} bits accepted");
            };
        }
    }

    #[test]
    fn derived_bounds_overflow_is_detected() {
        assert_eq!(required_proof_bits(1024, 256), Some(1024 + 82 + 597 + 337));
        assert_eq!(required_proof_bits(u32::MAX, 256), None);
        assert_eq!(required_proof_bits(1024, u32::MAX - 100), None);
    }

    #[test]
    fn config_from_json_fills_defaults() {
        let config: GroupConfig = serde_json::from_str(r#"{"exponent_bits":128}"#).unwrap();
        assert_eq!(
            config,
            GroupConfig {
                exponent_bits: 128,
                ..GroupConfig::default()
            }
        );
    }
}
