//! Voice packet encryption
//!
//! Implements the send side of the voice relay's transport encryption:
//! - `keys.rs`: 32-byte secret key, zeroized on drop
//! - `nonce.rs`: per-mode nonce construction and trailers
//! - `encryptor.rs`: packet sizing and XSalsa20-Poly1305 sealing

mod encryptor;
mod keys;
pub mod nonce;

pub use encryptor::{CopyInto, Grow, InPlace, PacketBuffer, PacketEncryptor};
pub use keys::SecretKey;
pub use nonce::{derive, overhead_bytes, DerivedNonce, Scheme, Trailer};
