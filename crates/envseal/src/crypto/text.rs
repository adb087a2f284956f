//! String-in, string-out wrapper for embedding secrets in text media.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::SecretError;

use super::cipher::CipherCodec;
use crate::key::KeyStore;

/// Encrypts strings into base64-encoded frames and back.
#[derive(Clone, Debug)]
pub struct TextCodec {
    cipher: CipherCodec,
}

impl TextCodec {
    /// Create a codec over an existing [`CipherCodec`].
    pub fn new(cipher: CipherCodec) -> Self {
        Self { cipher }
    }

    /// Shorthand for a codec reading its key from `keys`.
    pub fn from_keys(keys: KeyStore) -> Self {
        Self::new(CipherCodec::new(keys))
    }

    /// Seal the UTF-8 bytes of `plaintext` and return the base64 encoding of
    /// the frame.
    ///
    /// The output differs on every call because each frame carries a fresh
    /// nonce.
    ///
    /// # Errors
    ///
    /// Propagates every [`CipherCodec::seal`] failure unchanged.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, SecretError> {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    /// Seal arbitrary bytes and return the base64 encoding of the frame.
    ///
    /// # Errors
    ///
    /// Propagates every [`CipherCodec::seal`] failure unchanged.
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String, SecretError> {
        let frame = self.cipher.seal(plaintext)?;
        Ok(STANDARD.encode(frame))
    }

    /// Decode `encoded`, open the frame, and return the plaintext string.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::MalformedEncoding`] if `encoded` is not standard
    /// base64 and [`SecretError::InvalidUtf8`] if the authenticated plaintext
    /// is not UTF-8. Propagates every [`CipherCodec::open`] failure.
    pub fn decrypt(&self, encoded: &str) -> Result<String, SecretError> {
        let plaintext = self.decrypt_bytes(encoded)?;
        String::from_utf8(plaintext).map_err(|_| SecretError::InvalidUtf8)
    }

    /// Decode `encoded` and open the frame without interpreting the plaintext.
    ///
    /// Line breaks (`\r`, `\n`) anywhere in `encoded` are ignored, so values
    /// wrapped or newline-terminated by editors and shells still decode.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::MalformedEncoding`] if `encoded` is not standard
    /// base64 and propagates every [`CipherCodec::open`] failure.
    pub fn decrypt_bytes(&self, encoded: &str) -> Result<Vec<u8>, SecretError> {
        let frame = decode_frame(encoded)?;
        self.cipher.open(&frame)
    }
}

fn decode_frame(encoded: &str) -> Result<Vec<u8>, SecretError> {
    let result = if encoded.contains(['\r', '\n']) {
        let joined: String = encoded.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        STANDARD.decode(joined)
    } else {
        STANDARD.decode(encoded)
    };
    result.map_err(SecretError::MalformedEncoding)
}
