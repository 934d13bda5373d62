use std::sync::Arc;

use anonsig::{
    show, testing, Error, MemoryKeyStore, Signature, SignatureEnvelope, Subject, Verifier,
    VerifierConfig,
};
use anyhow::{bail, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Walks through a client collecting three certificates from two hosts and proving possession of
// all of them in one anonymous show, disclosing only the first attribute.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("anonsig=debug,info")),
        )
        .with_target(false)
        .init();

    let mut rng = rand::thread_rng();
    let now = testing::NOW;

    let store = Arc::new(MemoryKeyStore::new());
    for index in 0..testing::GROUPS {
        store.insert_group(testing::group(index))?;
    }
    let verifier = Verifier::new(store.clone(), VerifierConfig::default());

    // Issuance: each host certifies one attribute over the same committed secret.
    let secret = testing::secret(0, &mut rng);
    let certificates = [&b"member-since=2021"[..], b"age>=18", b"region=eu"]
        .into_iter()
        .enumerate()
        .map(|(i, attribute)| {
            testing::issue(i % testing::GROUPS, &secret, attribute, testing::validity(), &mut rng)
        })
        .collect::<Vec<_>>();
    info!(count = certificates.len(), "issued certificates");

    let envelope = show(
        &certificates,
        &[certificates[0].attribute()],
        &secret,
        Subject::new("forum/thread/7"),
        now,
        b"post: hello from nobody in particular".to_vec(),
        &mut rng,
    )?;
    let payload = verifier.verify(&envelope, now)?;
    info!(payload = %String::from_utf8_lossy(payload), "accepted anonymous show");

    // The same proof cannot be moved onto another message.
    let (subject, timestamp, _, signature) = envelope.into_parts();
    let Signature::CredentialsBased { .. } = &signature else {
        bail!("expected a credentials-based signature");
    };
    let replayed = SignatureEnvelope::new(subject, timestamp, b"post: spam".to_vec(), signature);
    match verifier.verify(&replayed, now) {
        Err(Error::InvalidCredentialsSignature { parameter }) => {
            info!(%parameter, "rejected replayed show")
        }
        other => bail!("unexpected result for a replayed show: {other:?}"),
    }

    Ok(())
}
