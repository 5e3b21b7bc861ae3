//! # voice-crypto
//!
//! Send-side transport encryption for voice relays that carry Opus audio in
//! RTP packets. Each packet keeps its 12-byte RTP header in the clear and has
//! its payload sealed with XSalsa20-Poly1305. Three modes are supported,
//! differing only in how the 24-byte nonce is built and sent:
//!
//! - `xsalsa20_poly1305`: nonce is the RTP header
//! - `xsalsa20_poly1305_suffix`: random nonce appended to the packet
//! - `xsalsa20_poly1305_lite`: 32-bit counter appended to the packet
//!
//! ## Feature Flags
//!
//! - `config` (default): TOML configuration loading
//!
//! ## Modules
//!
//! - [`core`]: Constants and error types
//! - [`crypto`]: Keys, nonce modes and the packet encryptor
//! - [`config`]: Configuration files (requires `config` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use voice_crypto::prelude::*;
//!
//! let mut encryptor = PacketEncryptor::new(SecretKey::from_bytes([0u8; 32]));
//! encryptor.start().unwrap();
//!
//! let mut packet = vec![0x80, 0x78, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1];
//! packet.extend_from_slice(b"hello");
//!
//! let sealed = encryptor.encrypt_to_vec(&packet).unwrap();
//! assert_eq!(sealed.len(), encryptor.required_output_length(packet.len()));
//! assert_eq!(&sealed[sealed.len() - 4..], &[0, 0, 0, 0]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Crypto layer
pub mod crypto;

// Configuration files (feature-gated)
#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
pub mod config;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::crypto::*;

    #[cfg(feature = "config")]
    pub use crate::config::EncryptorConfig;
}

// Re-export commonly used items at crate root
pub use crate::core::{ConfigError, EncryptError, Error};
pub use crate::crypto::{PacketEncryptor, Scheme, SecretKey};
