use anonsig::{
    HostSecretKey, MemoryKeyStore, SignatureEnvelope, SignerKeyId, Subject, Timestamp, Verifier,
    VerifierConfig,
};
use anyhow::{bail, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Walks through a host signing a payload, and a peer checking it before and after the payload is
// altered in transit.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("anonsig=debug,info")),
        )
        .with_target(false)
        .init();

    let key = HostSecretKey::gen(&mut rand::thread_rng());
    let key_id = SignerKeyId::new("host-a.example#1");

    // The peer learns the host key out of band, before any message arrives.
    let store = MemoryKeyStore::new();
    store.insert_signer_key(key_id.clone(), key.public_key())?;
    let verifier = Verifier::new(store, VerifierConfig::default());

    let now = Timestamp::now();
    let envelope = SignatureEnvelope::host_signed(
        &key,
        key_id,
        Subject::new("room/42"),
        now,
        b"set topic: lunch".to_vec(),
    );
    let payload = verifier.verify(&envelope, now)?;
    info!(payload = %String::from_utf8_lossy(payload), "accepted host-signed envelope");

    let (subject, timestamp, _, signature) = envelope.into_parts();
    let altered = SignatureEnvelope::new(subject, timestamp, b"set topic: dinner".to_vec(), signature);
    match verifier.verify(&altered, now) {
        Ok(_) => bail!("altered envelope was accepted"),
        Err(error) => info!(%error, "rejected altered envelope"),
    }

    Ok(())
}
