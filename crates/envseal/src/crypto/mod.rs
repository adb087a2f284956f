//! AES-256-GCM secret protection primitives.
//!
//! This module is intentionally free of configuration and filesystem
//! dependencies. It provides the byte-level [`CipherCodec`] and the
//! string-level [`TextCodec`] built on top of it.
//!
//! # Encoded secret format
//!
//! ```text
//! base64_standard( nonce[12] ‖ ciphertext ‖ tag[16] )
//! ```
//!
//! The framing matches standard AES-GCM output with the nonce prepended, so
//! previously encrypted values remain readable.

pub mod cipher;
pub mod text;

pub use cipher::CipherCodec;
pub use text::TextCodec;
