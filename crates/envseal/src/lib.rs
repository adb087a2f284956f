//! `envseal`: process-wide secret protection.
//!
//! One AES-256 key is installed at startup and then used to
//! - encrypt and decrypt individual string values ([`crypto::TextCodec`]),
//! - decrypt `ENC(...)` fields while configuration is loaded
//!   ([`config::MarkerDecodeHook`]),
//! - encrypt and decrypt whole files in place ([`file::FileCodec`]).
//!
//! Components receive the [`key::KeyStore`] explicitly; [`SecretContext`]
//! wires them all to one store.

pub mod config;
pub mod context;
pub mod crypto;
pub mod file;
pub mod key;
pub mod telemetry;

pub use common::SecretError;
pub use context::SecretContext;
