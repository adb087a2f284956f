//! `envseal`: command-line entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Settings`] from environment variables.
//! 2. Initialise structured logging.
//! 3. Provision the encryption key into the [`KeyStore`]. Failure is fatal.
//! 4. Run the requested command.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, info_span};

use common::format::{unwrap_marker, wrap_marker};
use common::SecretError;
use envseal::config::{load_config, AppConfig, Settings};
use envseal::key::{self, KeyStore};
use envseal::{telemetry, SecretContext};

#[derive(Debug, Parser)]
#[command(name = "envseal", version, about = "Encrypt and decrypt configuration secrets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encrypt a value and print its encoded secret.
    Encrypt {
        /// Value to encrypt. Read from stdin when omitted or `-`.
        plaintext: Option<String>,
        /// Wrap the output as `ENC(...)` for use in configuration files.
        #[arg(long)]
        marker: bool,
    },
    /// Decrypt an encoded secret (bare or `ENC(...)`) and print the plaintext.
    Decrypt { encoded: String },
    /// Encrypt a file in place.
    EncryptFile { path: PathBuf },
    /// Decrypt a file in place.
    DecryptFile { path: PathBuf },
    /// Load an application's configuration, decrypting marked fields, and
    /// print a redacted summary.
    CheckConfig { app: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 1. Settings
    // -----------------------------------------------------------------------
    let settings = Settings::from_env().map_err(|e| {
        // Logging is not yet up; write to stderr directly.
        eprintln!("ERROR: settings invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(settings.effective_log_level(), settings.json_logs())?;
    let env = settings.environment();
    let _span = info_span!("envseal", env = %env).entered();
    info!(version = env!("CARGO_PKG_VERSION"), "envseal starting");

    // -----------------------------------------------------------------------
    // 3. Key provisioning
    // -----------------------------------------------------------------------
    let keys = KeyStore::new();
    key::provision_from_env(&settings.enc_key_var, &keys)?;
    let ctx = SecretContext::new(keys);

    // -----------------------------------------------------------------------
    // 4. Command
    // -----------------------------------------------------------------------
    match cli.command {
        Command::Encrypt { plaintext, marker } => {
            let plaintext = match plaintext.as_deref() {
                None | Some("-") => read_plaintext(std::io::stdin().lock())?,
                Some(value) => value.to_owned(),
            };
            let encoded = ctx
                .text
                .encrypt(&plaintext)
                .map_err(|e| explain(e, "encryption failed"))?;
            if marker {
                println!("{}", wrap_marker(&encoded));
            } else {
                println!("{encoded}");
            }
        }
        Command::Decrypt { encoded } => {
            let body = unwrap_marker(&encoded).unwrap_or(&encoded);
            let plaintext = ctx
                .text
                .decrypt(body)
                .map_err(|e| explain(e, "decryption failed"))?;
            println!("{plaintext}");
        }
        Command::EncryptFile { path } => {
            ctx.files
                .encrypt_file(&path)
                .map_err(|e| explain(e, &format!("failed to encrypt {}", path.display())))?;
        }
        Command::DecryptFile { path } => {
            ctx.files
                .decrypt_file(&path)
                .map_err(|e| explain(e, &format!("failed to decrypt {}", path.display())))?;
        }
        Command::CheckConfig { app } => {
            let cfg: AppConfig = load_config(&app, env, settings.config_dir.as_deref(), &ctx.hook)
                .with_context(|| format!("failed to load configuration for {app}"))?;
            println!("{cfg:#?}");
            info!(address = %cfg.address(), "configuration loaded");
        }
    }

    Ok(())
}

/// Read a plaintext from `input`, dropping one trailing line break so that
/// `echo secret | envseal encrypt` seals `secret`.
fn read_plaintext(mut input: impl Read) -> Result<String> {
    let mut buf = String::new();
    input
        .read_to_string(&mut buf)
        .context("failed to read plaintext from stdin")?;
    if buf.ends_with('\n') {
        buf.pop();
        if buf.ends_with('\r') {
            buf.pop();
        }
    }
    Ok(buf)
}

/// Attach `action` to `err`, pointing at the key when the key is the problem.
fn explain(err: SecretError, action: &str) -> anyhow::Error {
    let message = if err.is_key_problem() {
        format!("{action}: encryption key is missing or unusable")
    } else {
        action.to_owned()
    };
    anyhow::Error::new(err).context(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdin_plaintext_drops_one_line_break() {
        assert_eq!(read_plaintext("s3cret\n".as_bytes()).unwrap(), "s3cret");
        assert_eq!(read_plaintext("s3cret\r\n".as_bytes()).unwrap(), "s3cret");
        assert_eq!(read_plaintext("a\nb\n\n".as_bytes()).unwrap(), "a\nb\n");
        assert_eq!(read_plaintext("".as_bytes()).unwrap(), "");
    }

    #[test]
    fn key_problems_get_a_distinct_message() {
        let err = explain(SecretError::KeyNotSet, "decryption failed");
        assert!(err.to_string().contains("encryption key is missing or unusable"));

        let err = explain(SecretError::AuthenticationFailure, "decryption failed");
        assert_eq!(err.to_string(), "decryption failed");
        assert_eq!(format!("{err:#}"), "decryption failed: decryption failed");
    }

    #[test]
    fn encrypt_accepts_missing_or_dash_plaintext() {
        let cli = Cli::try_parse_from(["envseal", "encrypt", "--marker"]).unwrap();
        assert!(matches!(cli.command, Command::Encrypt { plaintext: None, marker: true }));
        let cli = Cli::try_parse_from(["envseal", "encrypt", "-"]).unwrap();
        assert!(
            matches!(cli.command, Command::Encrypt { plaintext: Some(ref p), .. } if p == "-")
        );
    }
}
