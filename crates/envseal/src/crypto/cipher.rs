//! AES-256-GCM sealing and opening of raw byte buffers.
//!
//! A sealed frame is `nonce ‖ ciphertext ‖ tag`, with a fresh random 96-bit
//! nonce per call. Plain AES-GCM is used (not GCM-SIV) so frames interoperate
//! with values sealed by other standard AES-GCM implementations.
//!
//! **Never reuse a nonce under the same key.** GCM nonce reuse breaks both
//! confidentiality and authentication; every nonce comes from the OS CSPRNG.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use common::format::NONCE_LEN;
use common::SecretError;

use crate::key::KeyStore;

/// Authenticated encryption of byte buffers under the key held by a
/// [`KeyStore`].
///
/// Stateless apart from the shared store handle; cheap to clone and safe to
/// use from any number of threads.
#[derive(Clone, Debug)]
pub struct CipherCodec {
    keys: KeyStore,
}

impl CipherCodec {
    /// Create a codec reading its key from `keys`.
    pub fn new(keys: KeyStore) -> Self {
        Self { keys }
    }

    /// Encrypt `plaintext` and return the frame `nonce ‖ ciphertext ‖ tag`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::KeyNotSet`] if no key is installed,
    /// [`SecretError::RandomSourceFailure`] if no nonce could be drawn, and
    /// [`SecretError::CipherInitFailure`] if the cipher rejects the key.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, SecretError> {
        let cipher = self.build_cipher()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| SecretError::RandomSourceFailure(e.to_string()))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        // No associated data; the only failure mode is an oversized buffer.
        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| SecretError::CipherInitFailure)?;

        let mut frame = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        frame.extend_from_slice(&nonce_bytes);
        frame.extend_from_slice(&ciphertext);
        Ok(frame)
    }

    /// Decrypt a frame produced by [`CipherCodec::seal`].
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::FrameTooShort`] if `frame` cannot hold a nonce,
    /// [`SecretError::KeyNotSet`] if no key is installed, and
    /// [`SecretError::AuthenticationFailure`] if the tag does not verify for
    /// any reason.
    pub fn open(&self, frame: &[u8]) -> Result<Vec<u8>, SecretError> {
        if frame.len() < NONCE_LEN {
            return Err(SecretError::FrameTooShort(frame.len()));
        }
        let cipher = self.build_cipher()?;
        let (nonce_bytes, ciphertext) = frame.split_at(NONCE_LEN);
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| SecretError::AuthenticationFailure)
    }

    fn build_cipher(&self) -> Result<Aes256Gcm, SecretError> {
        let key = self.keys.get_key()?;
        Aes256Gcm::new_from_slice(key.expose()).map_err(|_| SecretError::CipherInitFailure)
    }
}
