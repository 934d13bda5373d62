//! Lookup of host keys and group parameters during verification.

use alloc::sync::Arc;

use crate::{
    error::Error,
    group::{GroupParameters, HostId},
    host::{HostPublicKey, SignerKeyId},
};

/// Synchronous key and group lookups, expected to be warm before verification starts.
///
/// Both lookups fail with [Error::NotFound] on a miss.
pub trait KeyStore {
    fn resolve_signer_key(&self, signer_key_id: &SignerKeyId) -> Result<HostPublicKey, Error>;

    fn resolve_group(&self, host: &HostId) -> Result<Arc<GroupParameters>, Error>;
}

impl<K: KeyStore + ?Sized> KeyStore for &K {
    fn resolve_signer_key(&self, signer_key_id: &SignerKeyId) -> Result<HostPublicKey, Error> {
        (**self).resolve_signer_key(signer_key_id)
    }

    fn resolve_group(&self, host: &HostId) -> Result<Arc<GroupParameters>, Error> {
        (**self).resolve_group(host)
    }
}

impl<K: KeyStore + ?Sized> KeyStore for Arc<K> {
    fn resolve_signer_key(&self, signer_key_id: &SignerKeyId) -> Result<HostPublicKey, Error> {
        (**self).resolve_signer_key(signer_key_id)
    }

    fn resolve_group(&self, host: &HostId) -> Result<Arc<GroupParameters>, Error> {
        (**self).resolve_group(host)
    }
}

#[cfg(feature = "std")]
pub use memory::MemoryKeyStore;

#[cfg(feature = "std")]
mod memory {
    use alloc::{collections::BTreeMap, sync::Arc};
    use std::sync::{PoisonError, RwLock};

    use super::KeyStore;
    use crate::{
        error::Error,
        group::{GroupParameters, HostId},
        host::{HostPublicKey, SignerKeyId},
    };

    /// In-memory store. Entries are inserted once and never replaced or removed, so readers never
    /// observe a key changing under them.
    #[derive(Debug, Default)]
    pub struct MemoryKeyStore {
        signer_keys: RwLock<BTreeMap<SignerKeyId, HostPublicKey>>,
        groups: RwLock<BTreeMap<HostId, Arc<GroupParameters>>>,
    }

    impl MemoryKeyStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert_signer_key(
            &self,
            signer_key_id: SignerKeyId,
            key: HostPublicKey,
        ) -> Result<(), Error> {
            let mut keys = self
                .signer_keys
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if keys.contains_key(&signer_key_id) {
                return Err(Error::AlreadyRegistered);
            }
            tracing::debug!(%signer_key_id, "registered signer key");
            keys.insert(signer_key_id, key);
            Ok(())
        }

        /// Register a group under its own host id.
        pub fn insert_group(&self, group: Arc<GroupParameters>) -> Result<(), Error> {
            let mut groups = self.groups.write().unwrap_or_else(PoisonError::into_inner);
            if groups.contains_key(group.host()) {
                return Err(Error::AlreadyRegistered);
            }
            tracing::debug!(host = %group.host(), bits = group.modulus_bits(), "registered group");
            groups.insert(group.host().clone(), group);
            Ok(())
        }
    }

    impl KeyStore for MemoryKeyStore {
        fn resolve_signer_key(&self, signer_key_id: &SignerKeyId) -> Result<HostPublicKey, Error> {
            self.signer_keys
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(signer_key_id)
                .copied()
                .ok_or(Error::NotFound)
        }

        fn resolve_group(&self, host: &HostId) -> Result<Arc<GroupParameters>, Error> {
            self.groups
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(host)
                .cloned()
                .ok_or(Error::NotFound)
        }
    }
}
