//! Error kinds and wire-format definitions shared across `envseal` crates.

pub mod error;
pub mod format;

pub use error::SecretError;
