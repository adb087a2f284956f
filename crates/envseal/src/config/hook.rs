//! Per-field decode hooks applied to a merged configuration tree.
//!
//! The loader offers every textual leaf to a [`FieldHook`] before typed
//! deserialization. [`MarkerDecodeHook`] replaces `ENC(<encoded>)` values with
//! their plaintext and leaves everything else alone.

use common::format::unwrap_marker;
use common::SecretError;
use config::{Map, Value, ValueKind};
use tracing::debug;

use crate::crypto::TextCodec;

/// A transformation applied to each textual configuration leaf.
pub trait FieldHook: Send + Sync {
    /// Inspect the leaf at dotted path `field`.
    ///
    /// Returns `Ok(None)` to keep `value`, `Ok(Some(_))` to replace it, or an
    /// error to abort loading.
    fn decode(&self, field: &str, value: &str) -> Result<Option<String>, SecretError>;
}

/// Decrypts values written as `ENC(<encoded secret>)`.
#[derive(Clone, Debug)]
pub struct MarkerDecodeHook {
    text: TextCodec,
}

impl MarkerDecodeHook {
    /// Create a hook decrypting with `text`.
    pub fn new(text: TextCodec) -> Self {
        Self { text }
    }
}

impl FieldHook for MarkerDecodeHook {
    fn decode(&self, field: &str, value: &str) -> Result<Option<String>, SecretError> {
        let Some(body) = unwrap_marker(value) else {
            return Ok(None);
        };
        let plaintext = self
            .text
            .decrypt(body)
            .map_err(|e| SecretError::ConfigSecretDecryptionFailure {
                field: field.to_owned(),
                source: Box::new(e),
            })?;
        debug!(field, "decrypted configuration secret");
        Ok(Some(plaintext))
    }
}

/// Run `hook` over every textual leaf under `table`, recursing into nested
/// tables and arrays. Returns the number of replaced leaves.
///
/// # Errors
///
/// Stops at and returns the first hook failure.
pub fn apply_hook(
    table: &mut Map<String, Value>,
    hook: &dyn FieldHook,
) -> Result<usize, SecretError> {
    let mut replaced = 0;
    for (key, value) in table.iter_mut() {
        walk(value, key, hook, &mut replaced)?;
    }
    Ok(replaced)
}

fn walk(
    value: &mut Value,
    path: &str,
    hook: &dyn FieldHook,
    replaced: &mut usize,
) -> Result<(), SecretError> {
    match &mut value.kind {
        ValueKind::String(s) => {
            if let Some(new) = hook.decode(path, s)? {
                *s = new;
                *replaced += 1;
            }
        }
        ValueKind::Table(map) => {
            for (key, child) in map.iter_mut() {
                walk(child, &format!("{path}.{key}"), hook, replaced)?;
            }
        }
        ValueKind::Array(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                walk(item, &format!("{path}[{i}]"), hook, replaced)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyStore;
    use common::format::{wrap_marker, KEY_LEN};
    use config::{File, FileFormat, Source as _};

    fn text_codec() -> TextCodec {
        let keys = KeyStore::new();
        keys.set_key(&[0u8; KEY_LEN]).unwrap();
        TextCodec::from_keys(keys)
    }

    fn table_from_yaml(yaml: &str) -> Map<String, Value> {
        config::Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .collect()
            .unwrap()
    }

    fn string_at(table: &Map<String, Value>, path: &[&str]) -> String {
        let mut value = table.get(path[0]).unwrap().clone();
        for key in &path[1..] {
            value = value.into_table().unwrap().remove(*key).unwrap();
        }
        value.into_string().unwrap()
    }

    #[test]
    fn plain_value_passes_through() {
        let hook = MarkerDecodeHook::new(text_codec());
        assert_eq!(hook.decode("db.user", "plain-value").unwrap(), None);
    }

    #[test]
    fn marked_value_is_decrypted() {
        let text = text_codec();
        let marked = wrap_marker(&text.encrypt("s3cret").unwrap());
        let hook = MarkerDecodeHook::new(text);
        assert_eq!(hook.decode("db.password", &marked).unwrap().as_deref(), Some("s3cret"));
    }

    #[test]
    fn garbage_marker_fails_with_field_context() {
        let hook = MarkerDecodeHook::new(text_codec());
        let err = hook.decode("db.password", "ENC(garbage)").unwrap_err();
        match err {
            SecretError::ConfigSecretDecryptionFailure { field, .. } => {
                assert_eq!(field, "db.password");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn near_miss_markers_pass_through() {
        let hook = MarkerDecodeHook::new(text_codec());
        for value in ["enc(abc)", " ENC(abc)", "ENC(abc) ", "ENC(abc"] {
            let outcome = hook.decode("f", value).unwrap();
            assert_eq!(outcome, None, "{value:?} was treated as a marker");
        }
    }

    #[test]
    fn unset_key_fails_only_for_marked_values() {
        let hook = MarkerDecodeHook::new(TextCodec::from_keys(KeyStore::new()));
        assert_eq!(hook.decode("host", "localhost").unwrap(), None);
        let marked = wrap_marker(&"A".repeat(32));
        match hook.decode("db.password", &marked).unwrap_err() {
            SecretError::ConfigSecretDecryptionFailure { source, .. } => {
                assert!(matches!(*source, SecretError::KeyNotSet));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn apply_hook_walks_nested_tables_and_arrays() {
        let text = text_codec();
        let pw = wrap_marker(&text.encrypt("db-pass").unwrap());
        let replica_pw = wrap_marker(&text.encrypt("replica-pass").unwrap());
        let yaml = format!(
            "host: localhost\nport: 8080\ndb:\n  password: \"{pw}\"\n  user: app\nreplicas:\n  - password: \"{replica_pw}\"\n"
        );
        let mut table = table_from_yaml(&yaml);

        let hook = MarkerDecodeHook::new(text);
        let replaced = apply_hook(&mut table, &hook).unwrap();
        assert_eq!(replaced, 2);
        assert_eq!(string_at(&table, &["db", "password"]), "db-pass");
        assert_eq!(string_at(&table, &["db", "user"]), "app");
        assert_eq!(string_at(&table, &["host"]), "localhost");

        let replicas = table.get("replicas").unwrap().clone().into_array().unwrap();
        let first = replicas[0].clone().into_table().unwrap();
        let replica = first.get("password").unwrap().clone().into_string().unwrap();
        assert_eq!(replica, "replica-pass");
    }

    #[test]
    fn apply_hook_reports_array_paths() {
        let yaml = "replicas:\n  - password: \"ENC(garbage)\"\n";
        let mut table = table_from_yaml(yaml);
        let err = apply_hook(&mut table, &MarkerDecodeHook::new(text_codec())).unwrap_err();
        assert!(err.to_string().contains("replicas[0].password"), "{err}");
    }

    #[test]
    fn non_textual_leaves_are_not_offered() {
        struct Recorder(parking_lot::Mutex<Vec<String>>);
        impl FieldHook for Recorder {
            fn decode(&self, field: &str, _value: &str) -> Result<Option<String>, SecretError> {
                self.0.lock().push(field.to_owned());
                Ok(None)
            }
        }

        let mut table = table_from_yaml("port: 8080\nenabled: true\nname: svc\n");
        let recorder = Recorder(parking_lot::Mutex::new(Vec::new()));
        apply_hook(&mut table, &recorder).unwrap();
        assert_eq!(*recorder.0.lock(), vec!["name".to_owned()]);
    }
}
