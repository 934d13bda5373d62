//! Fixed groups and issuance helpers for tests and demos.
//!
//! Each fixture modulus is the product of two 512-bit safe primes. The factors are published right
//! here, so these groups must never protect anything real.

use alloc::{sync::Arc, vec::Vec};
use core::time::Duration;

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use crate::{
    bounded::Exponent,
    certificate::{Certificate, ValidityWindow},
    commitment::Commitment,
    envelope::Timestamp,
    group::{GroupConfig, GroupParameters, HostId},
    issuer::IssuerKey,
};

/// Reference time for fixtures, inside [validity].
pub const NOW: Timestamp = Timestamp::from_secs(1_700_000_000);

struct Fixture {
    host: &'static str,
    p: &'static str,
    q: &'static str,
    /// Square roots of the generators, in generator order.
    roots: [&'static str; 5],
}

const FIXTURES: [Fixture; 2] = [
    Fixture {
        host: "host-a.example",
        p: "DE2BAE2A139DF07CDAA4B265124DF3183A8085B5355EE49398591BF450D2DA1B619D1491E7D0BF9A9FA6899F6462E00D911A176A5422C9CE6E2FD506FD27BD9F",
        q: "CD2D3FA0FDA02B83A743D2F5013C9C87DA675A78881AD63964F131C9CD0ED598391141397984F7C5CFF14FF8BF142C808B9CB4E2FFF979E2FC4088449AD43663",
        roots: [
            "43c5687037a4cfe0980153239b8fe24e6a6cd59a7d2be4be14875e79d3378d3dfc1f05fe9e55fb37830607e5532cbdace1b3f572c8a33eb332c1497005b3e21f41400a38399ecee5399e3ff7d30ea960797a0bf98221c18ac043be9945eb4d3838acedce0eab27d24e1c5a1ed64438ba419ed333fba4efe47ff648bba1528115",
            "6d4acce23c4cc37ffa5b7af28d2c5930536b1e78167c7379bea2ef6781c391f2506e5703472ecf08a8ca4e7b234cbdb2b828abd16b3f350717ebbab1b3d920b6cac27f4197f54a10b5f28758c880298b222c78b7a40bd3b68e02155425365f76b4747cb4645db0992cbb7084ae5a43b328d26a821c4e312cee1c188ab9b50a17",
            "6134308b40770cb6d6fd6b0e9accb67a392c27d32722d25f38d370bd61a70b90f9a1bd45d94b8d5353a1b04179330e998de7010f09e859d8bc5ca8e2328defa85f1fe546986bfc396dbe9fc869eb0f2ab5b43afcd14400469085782e51a0ec763bdf4653edbf25d12bd63c05aa3eef3e324dae70356477a1292cda53ba7900b6",
            "6a57dab8fe9b8fa86dbebf5917d3e396264cdd5b31d234fdb8e389e1647d156af40b125df62ac64cb877433975a56e283f9f2ec631ada823827c8ed80b68c5641108121762b2451d4688a4a8fef0c0ac55763e735c64d1f3ee5715d4cfae9893b421afa4abaca9263cefe80b42d9385919f74186f6df9f00c5150123e86ce5eb",
            "3c37066956d87023aee2c31887e0f9ad6516c0ce3b0023c90a3c36b3a9c5c0d195c532ee792ec45f2d04a7768b515ff84c9afe206f753e0800aca0e9d5d3518736a339110eb57c8e9fac9387a6e997ff06d185b49574aba1cdb766db7371e3c216240b8fab03b6e2197174c36fdf5cb82cc5f7a82016c191cec1e522f781088c",
        ],
    },
    Fixture {
        host: "host-b.example",
        p: "C10E3C5C11BF8E9AF1F249E40CE5DE486D5ACBBB3B44C082C35485F023748DAADA0DD5E7FD7A1A1372512D007424CB394F5F162758DF2F1E9817251B8928902B",
        q: "DA158E4717CD844F25FF483BAA889EDE66A25E606F8E07C535B08FEE7EA98235F82FE89C11A67A77D177EBBD2FD3D429FBE36D567FE309301384D9686C2C7657",
        roots: [
            "8f5aa4921cc818adbe2d18c311af6376f5a1b86eb2c88a7bdbf3509aff521af748a51e3c8b74e256e528f359ce0a5074a563d90172d03f45a781d42df55ebea9fb4d2023bfbb0a02419928df1beafc728528bedc8e096c28126346561bbae5cb8f908e5a5043c61c49e43fc21da265426ec6348f58c3a0f2f36fd8d4067dc3ca",
            "5746de9a6d886656d665db7ff8529794e1daf97ca20485da101701bf53f842e3fde869f9aa7b561903249c36d03134649bb63b84096b968ec583ba2cf4becb5dbfcaa0d99eabc715fb0aa4d3e061c0b30814daecd7ddf99b2e5438780c11a2f2714fa7cdea309f5df42425a57d78e5221951908fce908256c6852ccc1a3aa884",
            "4633ac0740932368ec3728d9fb9d5f898cdba3be82abe82b0af110466ce2ba95d79e26740ddf5682fff790deb3f442338b9ccd9aaea65a15270042358ff2923b60f47a575ae737e4b7e81861d625a85d4d8f53166d81eef1037348ea17013e352a6e34372ce9e66605c8426bf3764a664246a545837fe0bc8e9d1dd178241810",
            "9bf2edec98d2a51048f3fb2119a8e2cbb7e439a6dcad2ff12a3335621390635dc7bfba62e328124fc55ae6b2271199172e8e5c452f6da242b95be10654fdf375e34135cc84f5045412307d8644ea1d15aa910e331302481521c3c2f0978b76269bdd29cb507ea9a542a60483026f4935708eb83fa4f512038a943506b529a8ad",
            "74a4d6dad1dc8c3828e6f93fe624443b4a25b067479262268d6868771070604b62c65c7dfdd41c43b31ad50ade792c742738121a0bc5e62898bd736b03757e6288ab434e89c6f077629e5e17392f0096e64d83d65cc6c25afdffb115850c0d47be518da0712effde88643e74855a434cb4947b46326f574951093abefb13a4a7",
        ],
    },
];

/// Number of fixture groups.
pub const GROUPS: usize = FIXTURES.len();

fn hex(value: &str) -> BigUint {
    BigUint::parse_bytes(value.as_bytes(), 16).expect("fixture values are hexadecimal")
}

fn factors(index: usize) -> (BigUint, BigUint) {
    let fixture = &FIXTURES[index];
    (hex(fixture.p), hex(fixture.q))
}

/// Fixture group `index`, with the default configuration.
///
/// # Panics
///
/// Panics if `index >= GROUPS`.
pub fn group(index: usize) -> Arc<GroupParameters> {
    let fixture = &FIXTURES[index];
    let (p, q) = factors(index);
    let modulus = p * q;
    // Squaring puts every generator in the quadratic residues.
    let generators: Vec<BigUint> = fixture
        .roots
        .iter()
        .map(|root| hex(root).modpow(&BigUint::from(2u8), &modulus))
        .collect();
    let group = GroupParameters::new(
        HostId::new(fixture.host),
        modulus,
        generators,
        &GroupConfig::default(),
    )
    .expect("fixture groups are valid");
    Arc::new(group)
}

/// The issuing key of fixture group `index`.
pub fn issuer(index: usize) -> IssuerKey {
    let (p, q) = factors(index);
    IssuerKey::new(group(index), p, q).expect("fixture factors match the modulus")
}

/// A random client secret sized for fixture group `index`.
pub fn secret<R>(index: usize, rng: &mut R) -> Exponent
where
    R: RngCore + CryptoRng + ?Sized,
{
    Exponent::random(rng, group(index).exponent_bits())
}

/// A validity window of one day either side of [NOW].
pub fn validity() -> ValidityWindow {
    let day = Duration::from_secs(24 * 60 * 60);
    ValidityWindow::new(NOW.saturating_sub(day), NOW.saturating_add(day))
        .expect("window is ordered")
}

/// Run issuance end to end: commit to `secret`, have fixture host `index` certify it, and
/// complete the certificate.
pub fn issue<R>(
    index: usize,
    secret: &Exponent,
    attribute: &[u8],
    validity: ValidityWindow,
    rng: &mut R,
) -> Certificate
where
    R: RngCore + CryptoRng + ?Sized,
{
    let issuer = issuer(index);
    let group = issuer.group().clone();
    let randomizer = Exponent::random(rng, group.blinding_bits());
    let commitment =
        Commitment::compute(&group, secret, &randomizer).expect("secret fits the fixture group");
    issuer
        .certify(&commitment, attribute, validity, rng)
        .expect("fixture issuer certifies well-formed commitments")
        .complete(group, secret, &randomizer)
        .expect("issued certificate completes")
}
