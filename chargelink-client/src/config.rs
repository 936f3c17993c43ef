//! Client configuration
//!
//! Every field has a default, so a JSON file only needs the values a
//! deployment overrides:
//!
//! ```json
//! {
//!     "shared_secret": "1234567890123456",
//!     "timeout_ms": 2000,
//!     "delimiter": "underscore",
//!     "key": { "hex": "0233090c01551b380a0e4b2a4e041740" }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use chargelink_core::codec::{DEFAULT_IV, DEFAULT_KEY};
use chargelink_core::session::{DEFAULT_RETRY_COUNT, DEFAULT_TIMEOUT};
use chargelink_core::{
    Codec, Credentials, Delimiter, KeyMaterial, KeyMaterialError, ResponseDecoder, SessionConfig,
};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::command::ReleaseFormat;

/// Errors loading or applying a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid key material: {0}")]
    Key(#[from] KeyMaterialError),
}

/// Complete client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub shared_secret: String,

    /// Wait before each retransmission
    #[serde(rename = "timeout_ms", deserialize_with = "duration_from_ms")]
    pub timeout: Duration,

    /// Retransmissions after the initial send
    pub retry_count: u32,

    pub delimiter: Delimiter,

    /// Treat `NOA` as success for stop commands
    pub suppress_noa_for_stop: bool,

    pub key: KeyMaterial,
    pub iv: KeyMaterial,

    pub release_format: ReleaseFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            shared_secret: String::new(),
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            delimiter: Delimiter::Space,
            suppress_noa_for_stop: false,
            key: KeyMaterial::Raw(DEFAULT_KEY),
            iv: KeyMaterial::Raw(DEFAULT_IV),
            release_format: ReleaseFormat::ZeroDuration,
        }
    }
}

impl ClientConfig {
    pub fn new(shared_secret: impl Into<String>) -> Self {
        Self {
            shared_secret: shared_secret.into(),
            ..Default::default()
        }
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_noa_suppressed_for_stop(mut self, suppress: bool) -> Self {
        self.suppress_noa_for_stop = suppress;
        self
    }

    /// Set key and IV
    pub fn with_key_material(mut self, key: KeyMaterial, iv: KeyMaterial) -> Self {
        self.key = key;
        self.iv = iv;
        self
    }

    pub fn with_release_format(mut self, format: ReleaseFormat) -> Self {
        self.release_format = format;
        self
    }

    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let codec = Codec::from_material(&self.key, &self.iv)?;
        Ok(Credentials::new(self.shared_secret.clone(), codec))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            timeout: self.timeout,
            retry_count: self.retry_count,
            decoder: ResponseDecoder::new(self.delimiter, self.suppress_noa_for_stop),
        }
    }
}

fn duration_from_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("1234567890123456")
            .with_timeout(Duration::from_millis(100))
            .with_retry_count(3)
            .with_delimiter(Delimiter::Underscore)
            .with_noa_suppressed_for_stop(true);

        assert_eq!(config.shared_secret, "1234567890123456");
        assert_eq!(config.session_config().retry_count, 3);
        assert_eq!(config.session_config().timeout, Duration::from_millis(100));
        assert_eq!(config.session_config().decoder.delimiter, Delimiter::Underscore);
        assert!(config.session_config().decoder.suppress_noa_for_stop);
        assert_eq!(config.release_format, ReleaseFormat::ZeroDuration);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "shared_secret": "s3cret",
                "timeout_ms": 250,
                "delimiter": "underscore",
                "key": {{ "hex": "{}" }},
                "release_format": "legacy"
            }}"#,
            "0233090c01551b380a0e4b2a4e041740"
        )
        .unwrap();

        let config = ClientConfig::from_json_file(file.path()).unwrap();

        assert_eq!(config.shared_secret, "s3cret");
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.retry_count, DEFAULT_RETRY_COUNT);
        assert_eq!(config.delimiter, Delimiter::Underscore);
        assert_eq!(config.release_format, ReleaseFormat::Legacy);
        assert_eq!(config.key.to_bytes().unwrap(), DEFAULT_KEY);
        assert!(config.credentials().is_ok());
    }

    #[test]
    fn test_bad_key_is_rejected() {
        let config = ClientConfig::default()
            .with_key_material(KeyMaterial::Hex("abcd".into()), KeyMaterial::Raw(DEFAULT_IV));

        assert!(matches!(
            config.credentials(),
            Err(ConfigError::Key(KeyMaterialError::Length(2)))
        ));
    }
}
