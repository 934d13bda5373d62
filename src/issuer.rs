//! Host-side certificate signing.
//!
//! The host signs a client's commitment `U = R0^u * S^v0` without learning `u`, producing the
//! parts of a certificate the client completes with its own randomizer share.

use alloc::sync::Arc;

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use crate::{
    bounded::{bit_length, mod_inverse, mod_pow, Exponent},
    certificate::{encode_attribute, IssuedCertificate, ValidityWindow},
    commitment::Commitment,
    error::Error,
    group::{Generator, GroupParameters, OFFSET_BITS},
};

const MILLER_RABIN_ROUNDS: usize = 40;

const SMALL_PRIMES: [u32; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// A host's signing key: its group and the order of the quadratic residues, `p'q'`.
pub struct IssuerKey {
    group: Arc<GroupParameters>,
    order: BigUint,
}

impl IssuerKey {
    /// Build the key from the safe primes `p = 2p' + 1` and `q = 2q' + 1` behind the group modulus.
    pub fn new(group: Arc<GroupParameters>, p: BigUint, q: BigUint) -> Result<Self, Error> {
        if &p * &q != *group.modulus() {
            return Err(Error::InvalidGroup("factors do not match the modulus"));
        }
        let three = BigUint::from(3u8);
        if p <= three || q <= three || (&p % 2u8).is_zero() || (&q % 2u8).is_zero() {
            return Err(Error::InvalidGroup("factors must be odd primes above three"));
        }
        let order = ((p - 1u8) >> 1u8) * ((q - 1u8) >> 1u8);
        Ok(Self { group, order })
    }

    pub fn group(&self) -> &Arc<GroupParameters> {
        &self.group
    }

    /// Sign the client commitment together with `attribute` and `validity`.
    pub fn certify<R>(
        &self,
        commitment: &Commitment,
        attribute: &[u8],
        validity: ValidityWindow,
        rng: &mut R,
    ) -> Result<IssuedCertificate, Error>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let group = self.group.as_ref();
        if **commitment.group() != *group {
            return Err(Error::InvalidCertificate("commitment is over a different group"));
        }
        if !commitment.is_well_formed() {
            return Err(Error::InvalidCertificate("malformed commitment"));
        }

        let l_e = group.certificate_exponent_bits();
        let l_v = group.signature_randomizer_bits();
        let e_floor = BigUint::one() << (l_e - 1);
        let issuer_exponent = loop {
            let candidate = (&e_floor + rng.gen_biguint(u64::from(OFFSET_BITS))) | BigUint::one();
            if is_probable_prime(&candidate, rng) {
                break candidate;
            }
        };
        let randomizer_share =
            (BigUint::one() << (l_v - 1)) + rng.gen_biguint(u64::from(l_v - 2));

        let attribute_exponent = encode_attribute(group, attribute);
        let validity_exponent = validity.encode(group);
        let divisor = group.mul(
            commitment.value().value(),
            &group.multi_pow([
                (
                    group.generator(Generator::Randomizer),
                    &Exponent::new(randomizer_share.clone(), l_v)?,
                ),
                (group.generator(Generator::Attribute), &attribute_exponent),
                (group.generator(Generator::Validity), &validity_exponent),
            ]),
        );
        let base = group
            .div(group.generator(Generator::Certificate), &divisor)
            .ok_or(Error::InvalidCertificate("commitment is not invertible"))?;
        let root = mod_inverse(&issuer_exponent, &self.order)
            .ok_or(Error::InvalidGroup("issuer exponent is not invertible"))?;
        let blinded_value = mod_pow(
            &base,
            &Exponent::new(root, bit_length(&self.order))?,
            group.modulus(),
        );

        tracing::debug!(host = %group.host(), "issued certificate");
        Ok(IssuedCertificate {
            blinded_value,
            issuer_exponent,
            randomizer_share,
            attribute: attribute.to_vec(),
            validity,
        })
    }
}

/// Miller-Rabin with random bases, after trial division by small primes.
fn is_probable_prime<R>(candidate: &BigUint, rng: &mut R) -> bool
where
    R: RngCore + CryptoRng + ?Sized,
{
    let two = BigUint::from(2u8);
    if *candidate < two {
        return false;
    }
    if (candidate % 2u8).is_zero() {
        return *candidate == two;
    }
    for prime in SMALL_PRIMES {
        if (candidate % prime).is_zero() {
            return *candidate == BigUint::from(prime);
        }
    }

    let minus_one = candidate - 1u8;
    let s = minus_one.trailing_zeros().unwrap_or(0);
    let d = &minus_one >> s;
    'witness: for _ in 0..MILLER_RABIN_ROUNDS {
        let a = rng.gen_biguint_range(&two, &minus_one);
        let mut x = a.modpow(&d, candidate);
        if x.is_one() || x == minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, candidate);
            if x == minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
