//! In-place encryption and decryption of whole files.
//!
//! The file body is treated as raw bytes: encrypting replaces it with one
//! encoded secret, decrypting replaces an encoded secret with the original
//! bytes. Binary files (DER keys, keystores) round-trip unchanged.
//!
//! Writes go to a temporary file in the same directory, which is then renamed
//! over the target. A crash leaves either the old or the new content, never a
//! truncated file. Concurrent calls on the same path are not coordinated.

use std::io::Write as _;
use std::path::Path;

use common::SecretError;
use tempfile::NamedTempFile;
use tracing::info;

use crate::crypto::TextCodec;

/// Applies a [`TextCodec`] to the full contents of a file.
#[derive(Clone, Debug)]
pub struct FileCodec {
    text: TextCodec,
}

impl FileCodec {
    /// Create a file codec over `text`.
    pub fn new(text: TextCodec) -> Self {
        Self { text }
    }

    /// Replace the contents of `path` with the encoded secret of its current
    /// contents. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::FileReadFailure`] or
    /// [`SecretError::FileWriteFailure`] on I/O errors and propagates every
    /// [`TextCodec::encrypt_bytes`] failure.
    pub fn encrypt_file(&self, path: impl AsRef<Path>) -> Result<usize, SecretError> {
        let path = path.as_ref();
        let plaintext = read_bytes(path)?;
        let encoded = self.text.encrypt_bytes(&plaintext)?;
        replace_contents(path, encoded.as_bytes())?;
        info!(path = %path.display(), bytes = encoded.len(), "file encrypted");
        Ok(encoded.len())
    }

    /// Replace the encoded secret in `path` with its plaintext. Returns the
    /// number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::FileReadFailure`] or
    /// [`SecretError::FileWriteFailure`] on I/O errors and propagates every
    /// [`TextCodec::decrypt_bytes`] failure. On failure the file is left
    /// untouched.
    pub fn decrypt_file(&self, path: impl AsRef<Path>) -> Result<usize, SecretError> {
        let path = path.as_ref();
        let encoded = read_bytes(path)?;
        let encoded = std::str::from_utf8(&encoded).map_err(|_| SecretError::FileReadFailure {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "file does not hold an encoded secret",
            ),
        })?;
        let plaintext = self.text.decrypt_bytes(encoded)?;
        replace_contents(path, &plaintext)?;
        info!(path = %path.display(), bytes = plaintext.len(), "file decrypted");
        Ok(plaintext.len())
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, SecretError> {
    std::fs::read(path).map_err(|source| SecretError::FileReadFailure {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `contents` to a sibling temp file carrying the target's permissions,
/// then atomically rename it over `path`.
fn replace_contents(path: &Path, contents: &[u8]) -> Result<(), SecretError> {
    let write_err = |source| SecretError::FileWriteFailure {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let permissions = std::fs::metadata(path).map_err(write_err)?.permissions();

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
