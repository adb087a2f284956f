//! Shared secret-handling components built over one key store.

use crate::config::MarkerDecodeHook;
use crate::crypto::{CipherCodec, TextCodec};
use crate::file::FileCodec;
use crate::key::KeyStore;

/// Every codec the process needs, wired to a single [`KeyStore`].
///
/// All fields are cheaply cloneable (they share the store's `Arc`), so the
/// context can be handed to any number of threads.
#[derive(Clone, Debug)]
pub struct SecretContext {
    /// The process-wide key.
    pub keys: KeyStore,
    /// String encryption and decryption.
    pub text: TextCodec,
    /// In-place file encryption and decryption.
    pub files: FileCodec,
    /// Decode hook for `ENC(...)` configuration values.
    pub hook: MarkerDecodeHook,
}

impl SecretContext {
    /// Build all codecs over `keys`.
    pub fn new(keys: KeyStore) -> Self {
        let text = TextCodec::new(CipherCodec::new(keys.clone()));
        Self {
            files: FileCodec::new(text.clone()),
            hook: MarkerDecodeHook::new(text.clone()),
            keys,
            text,
        }
    }
}

impl Default for SecretContext {
    /// Creates a context over an empty key store, suitable for tests.
    fn default() -> Self {
        Self::new(KeyStore::new())
    }
}
