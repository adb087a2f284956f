//! Encryption key lifecycle: provisioning and the process-wide [`KeyStore`].
//!
//! # Lifecycle
//!
//! 1. At startup, [`provision_from_env`] reads the raw key from the environment
//!    and installs it in the store. Startup aborts if this fails.
//! 2. The key lives only in process memory, wrapped in an `Arc<RwLock<_>>`.
//! 3. Codecs borrow the key via [`KeyStore::get_key`], which takes a short
//!    read lock and clones the bytes into a zeroizing buffer.
//!
//! # Security invariants
//!
//! - The key is **never** written to disk, logged, or included in traces.
//! - There is exactly one key per process; it is never replaced.

pub mod store;

pub use store::{KeyBytes, KeyStore};

use anyhow::{Context, Result};
use tracing::info;
use zeroize::Zeroizing;

/// Name of the variable that holds the raw key when none is configured.
pub const DEFAULT_KEY_VAR: &str = "ENC_KEY";

/// Read the raw key bytes from the environment variable `var` and install
/// them in `store`.
///
/// # Errors
///
/// Returns an error if the variable is missing, empty, not valid UTF-8, or
/// does not hold exactly 32 bytes.
pub fn provision_from_env(var: &str, store: &KeyStore) -> Result<()> {
    let raw = Zeroizing::new(
        std::env::var(var).with_context(|| format!("{var} is not set or is not valid UTF-8"))?,
    );
    provision_from_bytes(raw.as_bytes(), store)
        .with_context(|| format!("{var} is not a usable key"))?;
    info!(source = var, "encryption key provisioned from environment");
    Ok(())
}

/// Install `raw` as the process key.
///
/// # Errors
///
/// Returns an error if `raw` is empty or the store rejects it.
pub fn provision_from_bytes(raw: &[u8], store: &KeyStore) -> Result<()> {
    if raw.is_empty() {
        anyhow::bail!("key is empty");
    }
    store
        .set_key(raw)
        .context("failed to install encryption key")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provision_accepts_32_bytes() {
        let store = KeyStore::new();
        provision_from_bytes(b"0123456789abcdef0123456789abcdef", &store).unwrap();
        assert!(store.is_ready());
    }

    #[test]
    fn provision_rejects_empty_key() {
        let store = KeyStore::new();
        assert!(provision_from_bytes(b"", &store).is_err());
        assert!(!store.is_ready());
    }

    #[test]
    fn provision_rejects_short_key() {
        let store = KeyStore::new();
        let err = provision_from_bytes(b"too-short", &store).unwrap_err();
        assert!(format!("{err:#}").contains("invalid key length"));
    }

    #[test]
    fn provision_from_missing_var_fails() {
        let store = KeyStore::new();
        assert!(provision_from_env("ENVSEAL_TEST_DEFINITELY_UNSET_KEY", &store).is_err());
        assert!(!store.is_ready());
    }
}
