//! Structured logging setup.
//!
//! # Telemetry invariants
//!
//! - **No key material, plaintext secret, or ciphertext body** may appear in
//!   any span attribute or log field.
//! - Logs go to stderr; stdout is reserved for command output.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`) and
//!   overridable with `RUST_LOG`.

pub mod init;

pub use init::init_telemetry;
