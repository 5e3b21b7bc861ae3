//! Configuration file support
//!
//! An encryptor is configured by two settings, the encryption mode and the
//! secret key handed out by the voice relay:
//!
//! ```toml
//! encryption = "xsalsa20_poly1305_lite"
//! key = [1, 2, 3, ...]  # exactly 32 bytes
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::core::ConfigError;
use crate::crypto::{PacketEncryptor, Scheme, SecretKey};

/// Encryptor configuration.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptorConfig {
    /// Encryption mode (defaults to lite)
    #[serde(default)]
    pub encryption: Scheme,
    /// Secret key bytes
    pub key: Vec<u8>,
}

impl EncryptorConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: EncryptorConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check the key length without building an encryptor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        SecretKey::from_slice(&self.key).map(|_| ())
    }

    /// Build a (not yet started) encryptor from this configuration.
    pub fn build(&self) -> Result<PacketEncryptor, ConfigError> {
        let key = SecretKey::from_slice(&self.key)?;
        Ok(PacketEncryptor::with_scheme(key, self.encryption))
    }
}

impl fmt::Debug for EncryptorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptorConfig")
            .field("encryption", &self.encryption)
            .field("key", &format_args!("<{} bytes>", self.key.len()))
            .finish()
    }
}
