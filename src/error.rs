use core::fmt;

use crate::codec::DecodeError;

/// Names the part of a credential show proof that failed a check.
///
/// The name is enough to audit a rejection but never carries the values that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProofParameter {
    /// The randomized certificate `t`, its witness commitment, or the challenge they produce.
    T,
    /// Response for the client secret.
    ///
    /// Also names a failed certificate equation in a show without a relation commitment. That
    /// equation mixes `s_u`, `s_v`, `s_e` and `s_m`, so this name alone does not mean the secret
    /// was wrong.
    SU,
    /// Response for the adjusted certificate randomizer.
    SV,
    /// Response for the hidden issuer exponent offset.
    SE,
    /// Response for an undisclosed attribute.
    SM,
    /// The relation commitment and its response.
    V,
    /// The certificate at this position failed a check outside the proof equations.
    ///
    /// An index equal to the number of shown certificates is the first disclosed attribute with
    /// no certificate to match.
    Certificate(usize),
}

impl fmt::Display for ProofParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofParameter::T => f.write_str("t"),
            ProofParameter::SU => f.write_str("s_u"),
            ProofParameter::SV => f.write_str("s_v"),
            ProofParameter::SE => f.write_str("s_e"),
            ProofParameter::SM => f.write_str("s_m"),
            ProofParameter::V => f.write_str("v"),
            ProofParameter::Certificate(index) => write!(f, "certificate[{index}]"),
        }
    }
}

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("value has {bits} bits, exceeding the bound of {max_bits} bits")]
    OutOfRange { bits: u64, max_bits: u32 },
    #[error("exponent has {bits} bits, exceeding the group bound of {max_bits} bits")]
    ExponentTooLarge { bits: u64, max_bits: u32 },
    #[error("invalid group parameters: {0}")]
    InvalidGroup(&'static str),
    #[error("invalid certificate: {0}")]
    InvalidCertificate(&'static str),
    #[error("disclosed attributes do not match the presented certificates")]
    DisclosureMismatch,
    #[error("signature timestamp is outside the freshness window")]
    Inactive,
    #[error("invalid host signature")]
    InvalidHostSignature,
    #[error("invalid client signature")]
    InvalidClientSignature,
    #[error("invalid credentials signature: check on {parameter} failed")]
    InvalidCredentialsSignature { parameter: ProofParameter },
    #[error("signer key is not known")]
    UnknownSigner,
    #[error("no key or group registered under the requested id")]
    NotFound,
    #[error("an entry is already registered under this id")]
    AlreadyRegistered,
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl Error {
    pub(crate) fn credentials(parameter: ProofParameter) -> Self {
        Error::InvalidCredentialsSignature { parameter }
    }
}
