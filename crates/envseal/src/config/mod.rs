//! Configuration: process settings, the application config loader, and the
//! field hooks it applies.
//!
//! # Module invariants
//!
//! - Decrypted secrets exist only in the in-memory configuration; they are
//!   never written back to disk or logged.
//! - A marked field that fails to decrypt aborts loading; the raw marker is
//!   never left in place.

pub mod app;
pub mod hook;
pub mod settings;

pub use app::{load_config, load_config_file, AppConfig, DbConfig, Environment, RedisConfig};
pub use hook::{apply_hook, FieldHook, MarkerDecodeHook};
pub use settings::Settings;
