//! Protocol constants for voice packet encryption.
//!
//! These values are fixed by the RTP framing and the secretbox construction
//! the voice relay expects, and MUST NOT be changed.

// =============================================================================
// RTP FRAMING
// =============================================================================

/// Size of the fixed RTP header prefix that is sent in the clear.
pub const RTP_HEADER_SIZE: usize = 12;

// =============================================================================
// CRYPTOGRAPHIC CONSTANTS (XSalsa20-Poly1305)
// =============================================================================

/// Secret key size.
pub const KEY_SIZE: usize = 32;

/// XSalsa20 nonce size.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Number of counter bytes carried in a lite-mode trailer.
pub const LITE_NONCE_SIZE: usize = 4;
