//! [`KeyStore`]: thread-safe holder for the single process-wide encryption key.

use std::sync::Arc;

use common::format::KEY_LEN;
use common::SecretError;
use parking_lot::RwLock;
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Stored inside [`KeyStore`]; cloned into codec call stacks when needed.
/// The buffer is overwritten with zeroes on drop.
#[derive(Clone)]
pub struct KeyBytes(Box<[u8; KEY_LEN]>);

impl Drop for KeyBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl ZeroizeOnDrop for KeyBytes {}

impl KeyBytes {
    /// Borrow the raw key bytes.
    pub fn expose(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("KeyBytes([REDACTED])")
    }
}

/// Thread-safe store for the active encryption key.
///
/// Wraps an `Arc<RwLock<Option<KeyBytes>>>` so that:
/// - Any number of codecs can read the key concurrently without contention.
/// - Installing the key takes the write lock, so no reader ever observes a
///   partially written key.
///
/// The store is set exactly once. A second [`KeyStore::set_key`] fails with
/// [`SecretError::KeyAlreadySet`], because values sealed under the first key
/// would become undecryptable.
#[derive(Clone, Debug, Default)]
pub struct KeyStore {
    inner: Arc<RwLock<Option<KeyBytes>>>,
}

impl KeyStore {
    /// Create a new, empty [`KeyStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a key is installed.
    pub fn is_ready(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Install the process key.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidKeyLength`] if `key_bytes` is not
    /// [`KEY_LEN`] bytes, or [`SecretError::KeyAlreadySet`] if a key was
    /// installed earlier.
    pub fn set_key(&self, key_bytes: &[u8]) -> Result<(), SecretError> {
        if key_bytes.len() != KEY_LEN {
            return Err(SecretError::InvalidKeyLength(key_bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(key_bytes);
        let key = KeyBytes(buf);

        let mut slot = self.inner.write();
        if slot.is_some() {
            warn!("rejected attempt to replace the installed encryption key");
            return Err(SecretError::KeyAlreadySet);
        }
        *slot = Some(key);
        info!("encryption key installed");
        Ok(())
    }

    /// Return a clone of the installed key.
    ///
    /// The clone is zeroized when dropped; callers should use it and drop it
    /// promptly.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::KeyNotSet`] if no key has been installed.
    pub fn get_key(&self) -> Result<KeyBytes, SecretError> {
        self.inner.read().clone().ok_or(SecretError::KeyNotSet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initially_not_ready() {
        let store = KeyStore::new();
        assert!(!store.is_ready());
        assert!(matches!(store.get_key(), Err(SecretError::KeyNotSet)));
    }

    #[test]
    fn store_and_retrieve() {
        let store = KeyStore::new();
        let key = [0x42u8; KEY_LEN];
        store.set_key(&key).unwrap();
        assert!(store.is_ready());
        assert_eq!(store.get_key().unwrap().expose(), &key);
    }

    #[test]
    fn rejects_wrong_lengths() {
        let store = KeyStore::new();
        for len in [0usize, 16, 31, 33] {
            let result = store.set_key(&vec![0u8; len]);
            assert!(
                matches!(result, Err(SecretError::InvalidKeyLength(n)) if n == len),
                "length {len} accepted"
            );
        }
        assert!(!store.is_ready());
    }

    #[test]
    fn second_set_is_rejected_and_keeps_first_key() {
        let store = KeyStore::new();
        store.set_key(&[0x01u8; KEY_LEN]).unwrap();
        let result = store.set_key(&[0x02u8; KEY_LEN]);
        assert!(matches!(result, Err(SecretError::KeyAlreadySet)));
        assert_eq!(store.get_key().unwrap().expose(), &[0x01u8; KEY_LEN]);
    }

    #[test]
    fn clones_share_the_key() {
        let store = KeyStore::new();
        let handle = store.clone();
        store.set_key(&[0x07u8; KEY_LEN]).unwrap();
        assert!(handle.is_ready());
    }

    #[test]
    fn concurrent_readers_see_the_same_key() {
        let store = KeyStore::new();
        store.set_key(&[0x5Au8; KEY_LEN]).unwrap();
        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    for _ in 0..100 {
                        assert_eq!(store.get_key().unwrap().expose(), &[0x5Au8; KEY_LEN]);
                    }
                });
            }
        });
    }

    #[test]
    fn key_bytes_redacted_in_debug() {
        let store = KeyStore::new();
        store.set_key(&[0xFFu8; KEY_LEN]).unwrap();
        let key = store.get_key().unwrap();
        let rendered = format!("{key:?} {store:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("255"));
    }
}
