//! Common error types shared across crates.

use std::path::PathBuf;

use thiserror::Error;

use crate::format::{KEY_LEN, NONCE_LEN};

/// Every failure the secret subsystem can report.
///
/// Variants carry their cause or the minimal context needed to log them.
/// None of them ever carries key material or plaintext.
#[derive(Debug, Error)]
pub enum SecretError {
    /// No key has been installed in the key store yet.
    #[error("encryption key not set")]
    KeyNotSet,

    /// A key is already installed; re-keying is not supported.
    #[error("encryption key already set")]
    KeyAlreadySet,

    /// The candidate key is the wrong length.
    #[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The OS CSPRNG could not produce a nonce.
    #[error("secure random source unavailable: {0}")]
    RandomSourceFailure(String),

    /// The stored key could not initialise the cipher.
    #[error("cipher initialisation failed")]
    CipherInitFailure,

    /// The ciphertext frame cannot even hold a nonce.
    #[error("ciphertext frame too short: expected at least {NONCE_LEN} bytes, got {0}")]
    FrameTooShort(usize),

    /// Authenticated decryption failed (wrong key, tampering, or corruption).
    #[error("decryption failed")]
    AuthenticationFailure,

    /// The encoded secret is not valid standard base64.
    #[error("malformed encoded secret")]
    MalformedEncoding(#[source] base64::DecodeError),

    /// The authenticated plaintext is not valid UTF-8.
    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,

    /// A marked configuration field could not be decrypted.
    #[error("failed to decrypt configuration field `{field}`")]
    ConfigSecretDecryptionFailure {
        /// Dotted path of the offending field.
        field: String,
        #[source]
        source: Box<SecretError>,
    },

    /// The file could not be read.
    #[error("failed to read {}", .path.display())]
    FileReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be written or replaced.
    #[error("failed to write {}", .path.display())]
    FileWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SecretError {
    /// Returns `true` for failures that mean the key material is absent or
    /// unusable, as opposed to bad input data.
    pub fn is_key_problem(&self) -> bool {
        matches!(
            self,
            SecretError::KeyNotSet
                | SecretError::KeyAlreadySet
                | SecretError::InvalidKeyLength(_)
                | SecretError::CipherInitFailure
        )
    }
}
