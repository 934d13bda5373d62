use std::{sync::Mutex, time::Duration};

use anonsig::{
    testing, Codec, DecodeError, Error, FreshnessPolicy, HostSecretKey, MemoryKeyStore, Signature,
    SignatureEnvelope, SignerKeyId, Subject, Timestamp, Verifier, VerifierConfig,
};

const NOW: Timestamp = testing::NOW;

fn at(offset: i64) -> Timestamp {
    Timestamp::from_secs(NOW.as_secs().checked_add_signed(offset).unwrap())
}

struct Host {
    key: HostSecretKey,
    id: SignerKeyId,
}

fn setup() -> (Verifier<MemoryKeyStore>, Host) {
    let store = MemoryKeyStore::new();
    let host = Host {
        key: HostSecretKey::gen(&mut rand::thread_rng()),
        id: SignerKeyId::new("host-a.example#1"),
    };
    store
        .insert_signer_key(host.id.clone(), host.key.public_key())
        .unwrap();
    store.insert_group(testing::group(0)).unwrap();
    (Verifier::new(store, VerifierConfig::default()), host)
}

fn host_signed(host: &Host, timestamp: Timestamp, payload: &[u8]) -> SignatureEnvelope {
    SignatureEnvelope::host_signed(
        &host.key,
        host.id.clone(),
        Subject::new("alice"),
        timestamp,
        payload.to_vec(),
    )
}

/// Rebuild an envelope with a different payload or signature value.
fn tamper(
    envelope: &SignatureEnvelope,
    f: impl FnOnce(&mut Vec<u8>, &mut Signature),
) -> SignatureEnvelope {
    let (subject, timestamp, mut payload, mut signature) = envelope.clone().into_parts();
    f(&mut payload, &mut signature);
    SignatureEnvelope::new(subject, timestamp, payload, signature)
}

#[test]
fn freshness_window_edges() {
    let (verifier, _) = setup();
    let cases = [(-299, true), (-301, false), (29, true), (31, false)];
    for (offset, fresh) in cases {
        let envelope =
            SignatureEnvelope::unsigned(Subject::new("alice"), at(offset), b"ping".to_vec());
        match (verifier.verify(&envelope, NOW), fresh) {
            (Ok(payload), true) => assert_eq!(payload, b"ping"),
            (Err(Error::Inactive), false) => {}
            (result, _) => panic!("offset {offset}: unexpected {result:?}"),
        }
    }
}

#[test]
fn custom_freshness_policy() {
    let (_, host) = setup();
    let store = MemoryKeyStore::new();
    store
        .insert_signer_key(host.id.clone(), host.key.public_key())
        .unwrap();
    let policy = FreshnessPolicy::new(Duration::from_secs(10), Duration::from_secs(0));
    let envelope = host_signed(&host, at(-10), b"ping");
    assert_eq!(
        anonsig::verify(&envelope, NOW, &policy, &store),
        Ok(b"ping".as_slice())
    );
    let Err(Error::Inactive) = anonsig::verify(&envelope, at(1), &policy, &store) else {
        panic!("envelope accepted outside a custom window");
    };
}

#[test]
fn host_signature_accepts_and_detects_tampering() {
    let (verifier, host) = setup();
    let envelope = host_signed(&host, NOW, b"state update");
    assert_eq!(verifier.verify(&envelope, NOW), Ok(b"state update".as_slice()));

    for i in 0..b"state update".len() {
        let tampered = tamper(&envelope, |payload, _| payload[i] ^= 0x20);
        let Err(Error::InvalidHostSignature) = verifier.verify(&tampered, NOW) else {
            panic!("payload byte {i} altered without detection");
        };
    }

    let Signature::HostSigned {
        signature_value, ..
    } = envelope.signature()
    else {
        panic!("expected a host signature");
    };
    for i in 0..signature_value.len() {
        let tampered = tamper(&envelope, |_, signature| {
            if let Signature::HostSigned {
                signature_value, ..
            } = signature
            {
                signature_value[i] ^= 0x80;
            }
        });
        let Err(Error::InvalidHostSignature) = verifier.verify(&tampered, NOW) else {
            panic!("signature byte {i} altered without detection");
        };
    }
}

#[test]
fn unknown_signer_is_reported() {
    let (verifier, _) = setup();
    let stranger = Host {
        key: HostSecretKey::gen(&mut rand::thread_rng()),
        id: SignerKeyId::new("host-z.example#1"),
    };
    let envelope = host_signed(&stranger, NOW, b"hello");
    let Err(Error::UnknownSigner) = verifier.verify(&envelope, NOW) else {
        panic!("envelope from an unknown signer accepted");
    };
}

#[test]
fn client_commitments() {
    let (verifier, _) = setup();
    let group = testing::group(0);
    let secret = testing::secret(0, &mut rand::thread_rng());
    let envelope = SignatureEnvelope::client_committed(
        &group,
        &secret,
        Subject::new("alice"),
        NOW,
        b"register".to_vec(),
    )
    .unwrap();
    assert_eq!(verifier.verify(&envelope, NOW), Ok(b"register".as_slice()));

    // Same secret, same message, same commitment.
    let again = SignatureEnvelope::client_committed(
        &group,
        &secret,
        Subject::new("alice"),
        NOW,
        b"register".to_vec(),
    )
    .unwrap();
    assert_eq!(envelope, again);

    // A commitment in a group the store does not know.
    let foreign = SignatureEnvelope::client_committed(
        &testing::group(1),
        &secret,
        Subject::new("alice"),
        NOW,
        b"register".to_vec(),
    )
    .unwrap();
    let Err(Error::InvalidClientSignature) = verifier.verify(&foreign, NOW) else {
        panic!("commitment in an unknown group accepted");
    };

    // A zero secret collapses the commitment onto the context term.
    let empty = SignatureEnvelope::client_committed(
        &group,
        &anonsig::Exponent::from_u64(0, 1).unwrap(),
        Subject::new("alice"),
        NOW,
        b"register".to_vec(),
    )
    .unwrap();
    let Err(Error::InvalidClientSignature) = verifier.verify(&empty, NOW) else {
        panic!("commitment to a zero secret accepted");
    };

    let malformed = tamper(&envelope, |_, signature| {
        *signature = Signature::ClientCommitted {
            commitment: anonsig::Commitment::from_value(group.clone(), group.modulus().clone())
                .unwrap(),
        };
    });
    let Err(Error::InvalidClientSignature) = verifier.verify(&malformed, NOW) else {
        panic!("commitment equal to the modulus accepted");
    };
}

#[test]
fn verification_is_idempotent() {
    let (verifier, host) = setup();
    let good = host_signed(&host, NOW, b"once");
    let bad = tamper(&good, |payload, _| payload.push(b'!'));
    for _ in 0..2 {
        assert_eq!(verifier.verify(&good, NOW), Ok(b"once".as_slice()));
        assert_eq!(verifier.verify(&bad, NOW), Err(Error::InvalidHostSignature));
    }
}

/// Keeps envelopes in a table and encodes them as their index.
#[derive(Default)]
struct TableCodec(Mutex<Vec<SignatureEnvelope>>);

impl Codec for TableCodec {
    fn encode(&self, envelope: &SignatureEnvelope) -> Vec<u8> {
        let mut table = self.0.lock().unwrap();
        table.push(envelope.clone());
        (table.len() as u64 - 1).to_be_bytes().to_vec()
    }

    fn decode(&self, bytes: &[u8]) -> Result<SignatureEnvelope, DecodeError> {
        let index: [u8; 8] = bytes
            .try_into()
            .map_err(|_| DecodeError("expected an 8-byte index".into()))?;
        self.0
            .lock()
            .unwrap()
            .get(u64::from_be_bytes(index) as usize)
            .cloned()
            .ok_or_else(|| DecodeError("no such envelope".into()))
    }
}

#[test]
fn encoded_envelopes() {
    let (verifier, host) = setup();
    let codec = TableCodec::default();
    let bytes = codec.encode(&host_signed(&host, NOW, b"over the wire"));
    assert_eq!(
        verifier.verify_encoded(&codec, &bytes, NOW),
        Ok(b"over the wire".to_vec())
    );

    let Err(Error::Decode(_)) = verifier.verify_encoded(&codec, b"garbage", NOW) else {
        panic!("undecodable bytes accepted");
    };
    let Err(Error::Decode(_)) = verifier.verify_encoded(&codec, &42u64.to_be_bytes(), NOW) else {
        panic!("unknown envelope accepted");
    };
}
