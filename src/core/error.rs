//! Error types for voice packet encryption.

use thiserror::Error;

/// Errors raised while configuring an encryptor.
///
/// These are reported at the point of misconfiguration. The previous key or
/// mode stays installed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key material has the wrong length.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required key length.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// Unknown encryption mode name or value.
    #[error("unsupported encryption mode: {0}")]
    UnsupportedScheme(String),

    /// Configuration file could not be parsed.
    #[cfg(feature = "config")]
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while encrypting a packet.
#[derive(Debug, Error)]
pub enum EncryptError {
    /// Packet is shorter than the fixed RTP header.
    #[error("packet too short: {len} bytes, need at least {min}")]
    ShortPacket {
        /// Length of the rejected packet.
        len: usize,
        /// Minimum accepted length.
        min: usize,
    },

    /// Destination buffer does not match the required output length.
    #[error("output buffer has {actual} bytes, expected {expected}")]
    OutputLength {
        /// Required output length.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// `encrypt` was called before a successful `start`.
    #[error("encryptor not started")]
    NotStarted,

    /// The random source could not be initialized.
    #[error("crypto initialization failed: {0}")]
    Initialization(String),

    /// The AEAD primitive reported a failure.
    #[error("XSalsa20-Poly1305 encryption failed")]
    EncryptionBackend,
}

impl EncryptError {
    /// Whether this error must abort the stream.
    ///
    /// Short or mis-sized packets only reject the packet at hand.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EncryptError::NotStarted
                | EncryptError::Initialization(_)
                | EncryptError::EncryptionBackend
        )
    }
}

/// Top-level voice-crypto errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Encryption error.
    #[error("encryption error: {0}")]
    Encrypt(#[from] EncryptError),
}
