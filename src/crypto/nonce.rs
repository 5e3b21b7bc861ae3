//! Nonce construction for XSalsa20-Poly1305 voice packets
//!
//! The relay supports three encryption modes. They share the cipher and only
//! differ in where the 24-byte nonce comes from and what the receiver needs
//! appended to the packet to rebuild it:
//!
//! ```text
//! xsalsa20_poly1305         nonce = [ rtp header (12) | zeros (12) ]   trailer: none
//! xsalsa20_poly1305_suffix  nonce = [ random (24) ]                    trailer: nonce (24)
//! xsalsa20_poly1305_lite    nonce = [ counter BE (4) | zeros (20) ]    trailer: counter (4)
//! ```

use std::fmt;
use std::str::FromStr;

use rand::{rngs::OsRng, RngCore};

use crate::core::{
    ConfigError, EncryptError, LITE_NONCE_SIZE, NONCE_SIZE, RTP_HEADER_SIZE, TAG_SIZE,
};

/// Encryption mode negotiated with the voice relay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "config",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "String", into = "String")
)]
pub enum Scheme {
    /// Nonce is the RTP header, nothing appended.
    Standard,
    /// Random nonce appended after the ciphertext.
    Suffix,
    /// Incrementing 32-bit nonce appended after the ciphertext.
    #[default]
    Lite,
}

impl Scheme {
    /// All supported modes.
    pub const ALL: [Scheme; 3] = [Scheme::Standard, Scheme::Suffix, Scheme::Lite];

    /// Mode name as used by the voice relay.
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Standard => "xsalsa20_poly1305",
            Scheme::Suffix => "xsalsa20_poly1305_suffix",
            Scheme::Lite => "xsalsa20_poly1305_lite",
        }
    }

    /// Number of nonce bytes appended after the ciphertext.
    pub fn trailer_len(self) -> usize {
        match self {
            Scheme::Standard => 0,
            Scheme::Suffix => NONCE_SIZE,
            Scheme::Lite => LITE_NONCE_SIZE,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xsalsa20_poly1305" | "standard" => Ok(Scheme::Standard),
            "xsalsa20_poly1305_suffix" | "suffix" => Ok(Scheme::Suffix),
            "xsalsa20_poly1305_lite" | "lite" => Ok(Scheme::Lite),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }
}

impl TryFrom<String> for Scheme {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Scheme> for String {
    fn from(scheme: Scheme) -> Self {
        scheme.as_str().to_string()
    }
}

impl TryFrom<u32> for Scheme {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Scheme::Standard),
            1 => Ok(Scheme::Suffix),
            2 => Ok(Scheme::Lite),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// Extra bytes a mode adds to a packet: the tag plus the trailer.
pub fn overhead_bytes(scheme: Scheme) -> usize {
    TAG_SIZE + scheme.trailer_len()
}

/// Nonce bytes appended to the packet so the receiver can rebuild the nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trailer {
    bytes: [u8; NONCE_SIZE],
    len: usize,
}

impl Trailer {
    fn empty() -> Self {
        Self {
            bytes: [0u8; NONCE_SIZE],
            len: 0,
        }
    }

    fn from_prefix(nonce: &[u8; NONCE_SIZE], len: usize) -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        bytes[..len].copy_from_slice(&nonce[..len]);
        Self { bytes, len }
    }

    /// Trailer bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Number of trailer bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is appended.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Result of deriving the nonce for one packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DerivedNonce {
    /// Full XSalsa20 nonce.
    pub nonce: [u8; NONCE_SIZE],
    /// Bytes to append after the ciphertext.
    pub trailer: Trailer,
    /// Lite counter to commit once the packet is sealed.
    pub next_counter: u32,
}

/// Derive the nonce for one packet.
///
/// `counter` is the current lite counter. It is only read and advanced in
/// lite mode, and wraps to 0 after `u32::MAX`.
///
/// # Errors
/// Returns `EncryptionBackend` if the OS random source fails in suffix mode.
pub fn derive(
    scheme: Scheme,
    header: &[u8; RTP_HEADER_SIZE],
    counter: u32,
) -> Result<DerivedNonce, EncryptError> {
    let mut nonce = [0u8; NONCE_SIZE];

    let derived = match scheme {
        Scheme::Standard => {
            nonce[..RTP_HEADER_SIZE].copy_from_slice(header);
            DerivedNonce {
                nonce,
                trailer: Trailer::empty(),
                next_counter: counter,
            }
        }
        Scheme::Suffix => {
            OsRng.try_fill_bytes(&mut nonce).map_err(|e| {
                tracing::error!(error = %e, "OS random source failed");
                EncryptError::EncryptionBackend
            })?;
            DerivedNonce {
                nonce,
                trailer: Trailer::from_prefix(&nonce, NONCE_SIZE),
                next_counter: counter,
            }
        }
        Scheme::Lite => {
            nonce[..LITE_NONCE_SIZE].copy_from_slice(&counter.to_be_bytes());
            DerivedNonce {
                nonce,
                trailer: Trailer::from_prefix(&nonce, LITE_NONCE_SIZE),
                next_counter: counter.wrapping_add(1),
            }
        }
    };

    Ok(derived)
}

/// Rebuild the nonce a receiver would use from a sealed packet.
///
/// Returns `None` if the packet cannot hold the header, tag and trailer.
pub fn recover_nonce(scheme: Scheme, packet: &[u8]) -> Option<[u8; NONCE_SIZE]> {
    if packet.len() < RTP_HEADER_SIZE + overhead_bytes(scheme) {
        return None;
    }

    let mut nonce = [0u8; NONCE_SIZE];
    match scheme {
        Scheme::Standard => nonce[..RTP_HEADER_SIZE].copy_from_slice(&packet[..RTP_HEADER_SIZE]),
        Scheme::Suffix | Scheme::Lite => {
            let n = scheme.trailer_len();
            nonce[..n].copy_from_slice(&packet[packet.len() - n..]);
        }
    }
    Some(nonce)
}
