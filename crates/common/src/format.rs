//! Wire-format constants for encoded secrets and configuration markers.
//!
//! An encoded secret is `base64_standard(nonce ‖ ciphertext ‖ tag)`. A marked
//! configuration value wraps an encoded secret as `ENC(<encoded>)`.

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the AES-GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Opening half of a configuration marker.
pub const MARKER_PREFIX: &str = "ENC(";

/// Closing half of a configuration marker.
pub const MARKER_SUFFIX: &str = ")";

/// Return the body of an `ENC(<body>)` marker, or `None` if `value` is not
/// exactly of that form.
///
/// Matching is case-sensitive and tolerates no surrounding whitespace.
pub fn unwrap_marker(value: &str) -> Option<&str> {
    value
        .strip_prefix(MARKER_PREFIX)
        .and_then(|rest| rest.strip_suffix(MARKER_SUFFIX))
}

/// Wrap an encoded secret in the configuration marker.
pub fn wrap_marker(encoded: &str) -> String {
    format!("{MARKER_PREFIX}{encoded}{MARKER_SUFFIX}")
}
